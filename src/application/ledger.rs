use crate::domain::coupon::{CouponKey, CouponKind, CouponRecord, CouponState, StreakCounters};
use crate::domain::history::HistoryEntry;
use crate::domain::ports::{Document, DocumentStoreBox, LocalCacheBox};
use crate::error::StoreError;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

const HISTORY_FIELD: &str = "history";

/// Where a fetched record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Read from the remote store.
    Remote,
    /// Not found remotely; a new document was created (best-effort).
    Created { remote_synced: bool },
    /// Not found remotely but known to the local cache; the remote document
    /// was seeded from the cached record (best-effort).
    Seeded { remote_synced: bool },
    /// Remote read failed; served from the local cache.
    LocalCache,
    /// Remote read failed and nothing was cached; freshly initialized.
    Fresh,
}

impl RecordOrigin {
    pub fn remote_synced(&self) -> bool {
        match self {
            RecordOrigin::Remote => true,
            RecordOrigin::Created { remote_synced } | RecordOrigin::Seeded { remote_synced } => {
                *remote_synced
            }
            RecordOrigin::LocalCache | RecordOrigin::Fresh => false,
        }
    }
}

/// Mediates every read and write between the remote document store and the
/// local cache.
///
/// Remote operations are best-effort and reported as booleans; the local
/// cache is always written. No `StoreError` escapes this type.
pub struct LedgerStore {
    remote: DocumentStoreBox,
    cache: LocalCacheBox,
}

impl LedgerStore {
    pub fn new(remote: DocumentStoreBox, cache: LocalCacheBox) -> Self {
        Self { remote, cache }
    }

    /// Loads a coupon, falling back to the local cache and then to a fresh
    /// record built from `initial_value`.
    pub async fn fetch(&self, key: &CouponKey, initial_value: u64) -> CouponRecord {
        self.fetch_with_origin(key, initial_value).await.0
    }

    pub async fn fetch_with_origin(
        &self,
        key: &CouponKey,
        initial_value: u64,
    ) -> (CouponRecord, RecordOrigin) {
        match self.read_remote(key).await {
            Ok(Some(record)) => {
                debug!(coupon = %key, "loaded from remote store");
                self.mirror_locally(key, &record).await;
                (record, RecordOrigin::Remote)
            }
            Ok(None) => {
                if let Some(mut record) = self.read_local(key, initial_value).await {
                    info!(coupon = %key, "remote document missing, seeding it from local cache");
                    record.created_at = Some(Utc::now());
                    let remote_synced = self.create_remote(key, &record).await;
                    return (record, RecordOrigin::Seeded { remote_synced });
                }
                let mut record = CouponRecord::new(key.kind, initial_value);
                record.created_at = Some(Utc::now());
                let remote_synced = self.create_remote(key, &record).await;
                self.mirror_locally(key, &record).await;
                (record, RecordOrigin::Created { remote_synced })
            }
            Err(err) => {
                warn!(coupon = %key, error = %err, "remote read failed, falling back to local cache");
                match self.read_local(key, initial_value).await {
                    Some(record) => (record, RecordOrigin::LocalCache),
                    None => {
                        info!(coupon = %key, initial_value, "no cached data, starting fresh");
                        (
                            CouponRecord::new(key.kind, initial_value),
                            RecordOrigin::Fresh,
                        )
                    }
                }
            }
        }
    }

    /// Writes `balance_or_uses`. Returns whether the remote write succeeded;
    /// the local cache is written either way.
    pub async fn persist_balance(&self, key: &CouponKey, new_balance: u64) -> bool {
        let mut fields = Document::new();
        fields.insert(key.kind.balance_field().to_string(), Value::from(new_balance));
        let synced = self.update_remote(key, fields).await;

        self.cache_set(&key.balance_cache_key(), new_balance.to_string())
            .await;
        synced
    }

    /// Writes the whole kind-specific state, including streak counters.
    pub async fn persist_progress(&self, key: &CouponKey, state: &CouponState) -> bool {
        let Some(counters) = state.streak_counters() else {
            return self.persist_balance(key, state.balance_or_uses()).await;
        };

        let mut fields = Document::new();
        fields.insert(
            key.kind.balance_field().to_string(),
            Value::from(state.balance_or_uses()),
        );
        fields.insert(
            "current_streak".to_string(),
            Value::from(counters.current_streak),
        );
        fields.insert(
            "highest_streak".to_string(),
            Value::from(counters.highest_streak),
        );
        let synced = self.update_remote(key, fields).await;

        self.cache_set(&key.balance_cache_key(), state.balance_or_uses().to_string())
            .await;
        self.cache_json(&key.streak_cache_key(), &counters).await;
        synced
    }

    /// Appends one entry to the remote history with an additive union, then
    /// to the cached history.
    pub async fn append_history(&self, key: &CouponKey, entry: &HistoryEntry) -> bool {
        let synced = match serde_json::to_value(entry) {
            Ok(value) => {
                match self
                    .remote
                    .array_union(key.kind.collection(), &key.id, HISTORY_FIELD, vec![value])
                    .await
                {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(coupon = %key, error = %err, "remote history append failed");
                        false
                    }
                }
            }
            Err(err) => {
                error!(coupon = %key, error = %err, "history entry could not be encoded");
                false
            }
        };

        let mut history = self
            .read_cached_json::<Vec<HistoryEntry>>(&key.history_cache_key())
            .await
            .unwrap_or_default();
        history.push(entry.clone());
        self.cache_json(&key.history_cache_key(), &history).await;
        synced
    }

    /// Overwrites the remote document with a fresh record and clears the
    /// cached entries.
    pub async fn reset(&self, key: &CouponKey, initial_value: u64) -> bool {
        let mut record = CouponRecord::new(key.kind, initial_value);
        record.reset_at = Some(Utc::now());

        let synced = match encode_document(&record) {
            Ok(doc) => match self
                .remote
                .set(key.kind.collection(), &key.id, doc, false)
                .await
            {
                Ok(()) => true,
                Err(err) => {
                    warn!(coupon = %key, error = %err, "remote reset failed");
                    false
                }
            },
            Err(err) => {
                error!(coupon = %key, error = %err, "reset document could not be encoded");
                false
            }
        };

        for cache_key in [
            key.balance_cache_key(),
            key.history_cache_key(),
            key.streak_cache_key(),
        ] {
            if let Err(err) = self.cache.remove(&cache_key).await {
                error!(key = %cache_key, error = %err, "failed to clear local cache entry");
            }
        }
        info!(coupon = %key, initial_value, remote_synced = synced, "coupon reset");
        synced
    }

    async fn read_remote(&self, key: &CouponKey) -> Result<Option<CouponRecord>, StoreError> {
        let Some(doc) = self.remote.get(key.kind.collection(), &key.id).await? else {
            return Ok(None);
        };
        let record: CouponRecord = serde_json::from_value(Value::Object(doc))
            .map_err(|e| StoreError::MalformedDocument(e.to_string()))?;
        if record.kind() != key.kind {
            return Err(StoreError::MalformedDocument(format!(
                "expected a {} coupon, found {}",
                key.kind,
                record.kind()
            )));
        }
        Ok(Some(record))
    }

    async fn create_remote(&self, key: &CouponKey, record: &CouponRecord) -> bool {
        let result = match encode_document(record) {
            Ok(doc) => {
                self.remote
                    .set(key.kind.collection(), &key.id, doc, true)
                    .await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                info!(coupon = %key, "created coupon document");
                true
            }
            Err(err) => {
                warn!(coupon = %key, error = %err, "failed to create coupon document");
                false
            }
        }
    }

    async fn update_remote(&self, key: &CouponKey, fields: Document) -> bool {
        match self
            .remote
            .update(key.kind.collection(), &key.id, fields)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(coupon = %key, error = %err, "remote update failed");
                false
            }
        }
    }

    /// Write-through of a remote record into the local cache.
    async fn mirror_locally(&self, key: &CouponKey, record: &CouponRecord) {
        self.cache_set(&key.balance_cache_key(), record.balance_or_uses().to_string())
            .await;
        self.cache_json(&key.history_cache_key(), &record.history)
            .await;
        if let Some(counters) = record.state.streak_counters() {
            self.cache_json(&key.streak_cache_key(), &counters).await;
        }
    }

    async fn read_local(&self, key: &CouponKey, initial_value: u64) -> Option<CouponRecord> {
        let balance = self
            .read_cached_text(&key.balance_cache_key())
            .await
            .and_then(|text| match text.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(e) => {
                    self.report_malformed(&key.balance_cache_key(), e.to_string());
                    None
                }
            });
        let history = self
            .read_cached_json::<Vec<HistoryEntry>>(&key.history_cache_key())
            .await;
        let counters = if key.kind == CouponKind::Streak {
            self.read_cached_json::<StreakCounters>(&key.streak_cache_key())
                .await
        } else {
            None
        };

        if balance.is_none() && history.is_none() && counters.is_none() {
            return None;
        }
        debug!(coupon = %key, "loaded from local cache");

        let mut state = key
            .kind
            .initial_state(initial_value)
            .with_balance(balance.unwrap_or(initial_value));
        if let (
            CouponState::Streak {
                current_streak,
                highest_streak,
                ..
            },
            Some(cached),
        ) = (&mut state, counters)
        {
            *current_streak = cached.current_streak;
            *highest_streak = cached.highest_streak;
        }

        let mut record = CouponRecord::from_state(state);
        record.history = history.unwrap_or_default();
        Some(record)
    }

    async fn read_cached_text(&self, cache_key: &str) -> Option<String> {
        match self.cache.get(cache_key).await {
            Ok(value) => value,
            Err(err) => {
                error!(key = %cache_key, error = %err, "local cache read failed");
                None
            }
        }
    }

    /// Reads a structured cache entry. Corrupt content is reported and
    /// treated as absent.
    async fn read_cached_json<T: serde::de::DeserializeOwned>(&self, cache_key: &str) -> Option<T> {
        let text = self.read_cached_text(cache_key).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                self.report_malformed(cache_key, e.to_string());
                None
            }
        }
    }

    fn report_malformed(&self, cache_key: &str, reason: String) {
        let err = StoreError::MalformedLocalData {
            key: cache_key.to_string(),
            reason,
        };
        warn!(error = %err, "ignoring corrupt cache entry");
    }

    async fn cache_set(&self, cache_key: &str, value: String) {
        if let Err(err) = self.cache.set(cache_key, value).await {
            error!(key = %cache_key, error = %err, "local cache write failed");
        }
    }

    async fn cache_json<T: serde::Serialize + ?Sized>(&self, cache_key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => self.cache_set(cache_key, text).await,
            Err(err) => error!(key = %cache_key, error = %err, "cache value could not be encoded"),
        }
    }
}

fn encode_document(record: &CouponRecord) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::MalformedDocument(format!(
            "record encoded as {other}"
        ))),
    }
}
