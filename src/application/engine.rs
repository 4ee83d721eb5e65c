use crate::application::ledger::LedgerStore;
use crate::config::{CouponConfig, EngineConfig};
use crate::domain::amount::RedemptionAmount;
use crate::domain::coupon::{CouponKey, CouponKind, CouponRecord, CouponState, CouponStatus};
use crate::domain::history::{HistoryEntry, StreakTransition, sorted_for_display};
use crate::error::RedemptionError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tokio::sync::Mutex;
use tracing::info;

/// What the presentation layer needs to render one coupon.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponView {
    pub key: CouponKey,
    pub balance: u64,
    pub status: CouponStatus,
    pub state: CouponState,
    /// Most recent first.
    pub history: Vec<HistoryEntry>,
    /// Whether the last operation on this coupon reached the remote store.
    pub remote_synced: bool,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub new_balance: u64,
    pub entry: HistoryEntry,
    pub remote_synced: bool,
}

struct SessionCoupon {
    record: CouponRecord,
    reward_per_action: Option<u64>,
    remote_synced: bool,
}

impl SessionCoupon {
    fn view(&self, key: &CouponKey) -> CouponView {
        CouponView {
            key: key.clone(),
            balance: self.record.balance_or_uses(),
            status: self.record.state.status(),
            state: self.record.state,
            history: sorted_for_display(&self.record.history),
            remote_synced: self.remote_synced,
        }
    }
}

/// Validates and applies coupon operations for one client session.
///
/// Each loaded coupon's state is held for the session, so operations are
/// computed against what this session last saw and then persisted through the
/// [`LedgerStore`]. Operations are applied one at a time.
pub struct RedemptionEngine {
    ledger: LedgerStore,
    config: EngineConfig,
    coupons: Mutex<BTreeMap<CouponKey, SessionCoupon>>,
}

impl RedemptionEngine {
    /// Creates a new `RedemptionEngine` with default settings.
    pub fn new(ledger: LedgerStore) -> Self {
        Self::with_config(ledger, EngineConfig::default())
    }

    pub fn with_config(ledger: LedgerStore, config: EngineConfig) -> Self {
        Self {
            ledger,
            config,
            coupons: Mutex::new(BTreeMap::new()),
        }
    }

    /// Loads a coupon into the session, creating it with `initial_value` if
    /// no store knows it yet.
    pub async fn load_coupon(&self, key: &CouponKey, initial_value: u64) -> CouponView {
        let session = self.fetch_session(key, initial_value, None).await;
        let view = session.view(key);
        self.coupons.lock().await.insert(key.clone(), session);
        view
    }

    /// Loads a coupon from its configuration, keeping any per-coupon reward.
    pub async fn load_configured(&self, config: &CouponConfig) -> CouponView {
        let session = self
            .fetch_session(&config.key, config.initial_value, config.reward_per_action)
            .await;
        let view = session.view(&config.key);
        self.coupons.lock().await.insert(config.key.clone(), session);
        view
    }

    /// Redeems `requested` from a coupon's balance or uses.
    pub async fn redeem(
        &self,
        key: &CouponKey,
        requested: i64,
    ) -> Result<Redemption, RedemptionError> {
        let amount = RedemptionAmount::new(requested)?;
        self.redeem_amount(key, amount).await
    }

    pub async fn redeem_amount(
        &self,
        key: &CouponKey,
        amount: RedemptionAmount,
    ) -> Result<Redemption, RedemptionError> {
        let mut coupons = self.coupons.lock().await;
        let session = self.session(&mut coupons, key).await;

        let available = session.record.balance_or_uses();
        let requested = amount.value();
        if requested > available {
            return Err(RedemptionError::InsufficientBalance {
                requested,
                available,
            });
        }

        let new_balance = available - requested;
        let entry = HistoryEntry::redemption(requested, new_balance, Utc::now());

        let balance_synced = self.ledger.persist_balance(key, new_balance).await;
        let history_synced = self.ledger.append_history(key, &entry).await;
        let remote_synced = balance_synced && history_synced;

        session.record.state = session.record.state.with_balance(new_balance);
        session.record.history.push(entry.clone());
        session.remote_synced = remote_synced;

        info!(coupon = %key, requested, new_balance, remote_synced, "redeemed");
        Ok(Redemption {
            new_balance,
            entry,
            remote_synced,
        })
    }

    /// Restores a coupon to `initial_value` with an empty history. Succeeds
    /// even when the remote reset fails.
    pub async fn reset_coupon(&self, key: &CouponKey, initial_value: u64) -> CouponView {
        let remote_synced = self.ledger.reset(key, initial_value).await;

        let mut coupons = self.coupons.lock().await;
        let reward_per_action = coupons.get(key).and_then(|s| s.reward_per_action);
        let session = SessionCoupon {
            record: CouponRecord::new(key.kind, initial_value),
            reward_per_action,
            remote_synced,
        };
        let view = session.view(key);
        coupons.insert(key.clone(), session);
        view
    }

    /// Completes a workout on a streak coupon: the streak grows by one and the
    /// reward is added to its monetary value.
    pub async fn record_workout(
        &self,
        key: &CouponKey,
        reward: Option<u64>,
    ) -> Result<CouponView, RedemptionError> {
        ensure_streak(key, "record_workout")?;
        let mut coupons = self.coupons.lock().await;
        let session = self.session(&mut coupons, key).await;

        let reward = reward
            .or(session.reward_per_action)
            .unwrap_or(self.config.reward_per_workout);
        let CouponState::Streak {
            monetary_value,
            current_streak,
            highest_streak,
        } = session.record.state
        else {
            return Err(unsupported(key, "record_workout"));
        };

        let after = current_streak.saturating_add(1);
        let state = CouponState::Streak {
            monetary_value: monetary_value.saturating_add(reward),
            current_streak: after,
            highest_streak: highest_streak.max(after),
        };
        let transition = StreakTransition {
            before: current_streak,
            after,
            highest_after: highest_streak.max(after),
        };
        let entry = HistoryEntry::workout(reward, state.balance_or_uses(), transition, Utc::now());

        self.apply_streak(key, session, state, entry).await;
        Ok(session.view(key))
    }

    /// Sets a streak coupon's current streak back to zero. The monetary value
    /// and the highest streak are kept.
    pub async fn reset_streak(&self, key: &CouponKey) -> Result<CouponView, RedemptionError> {
        ensure_streak(key, "reset_streak")?;
        let mut coupons = self.coupons.lock().await;
        let session = self.session(&mut coupons, key).await;

        let CouponState::Streak {
            monetary_value,
            current_streak,
            highest_streak,
        } = session.record.state
        else {
            return Err(unsupported(key, "reset_streak"));
        };

        let state = CouponState::Streak {
            monetary_value,
            current_streak: 0,
            highest_streak,
        };
        let transition = StreakTransition {
            before: current_streak,
            after: 0,
            highest_after: highest_streak,
        };
        let entry = HistoryEntry::streak_reset(monetary_value, transition, Utc::now());

        self.apply_streak(key, session, state, entry).await;
        Ok(session.view(key))
    }

    /// The current session view of a coupon, if it has been loaded.
    pub async fn view(&self, key: &CouponKey) -> Option<CouponView> {
        let coupons = self.coupons.lock().await;
        coupons.get(key).map(|session| session.view(key))
    }

    /// Consumes the engine and returns every coupon touched in the session,
    /// ordered by key.
    pub fn into_results(self) -> Vec<CouponView> {
        self.coupons
            .into_inner()
            .iter()
            .map(|(key, session)| session.view(key))
            .collect()
    }

    async fn apply_streak(
        &self,
        key: &CouponKey,
        session: &mut SessionCoupon,
        state: CouponState,
        entry: HistoryEntry,
    ) {
        let state_synced = self.ledger.persist_progress(key, &state).await;
        let history_synced = self.ledger.append_history(key, &entry).await;

        session.record.state = state;
        session.record.history.push(entry);
        session.remote_synced = state_synced && history_synced;
        info!(coupon = %key, balance = state.balance_or_uses(), remote_synced = session.remote_synced, "streak updated");
    }

    async fn fetch_session(
        &self,
        key: &CouponKey,
        initial_value: u64,
        reward_per_action: Option<u64>,
    ) -> SessionCoupon {
        let (record, origin) = self.ledger.fetch_with_origin(key, initial_value).await;
        info!(coupon = %key, balance = record.balance_or_uses(), ?origin, "coupon loaded");
        SessionCoupon {
            record,
            reward_per_action,
            remote_synced: origin.remote_synced(),
        }
    }

    /// The session state of `key`, loading it with its kind's default initial
    /// value on first use.
    async fn session<'a>(
        &self,
        coupons: &'a mut BTreeMap<CouponKey, SessionCoupon>,
        key: &CouponKey,
    ) -> &'a mut SessionCoupon {
        match coupons.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let session = self
                    .fetch_session(key, key.kind.default_initial_value(), None)
                    .await;
                entry.insert(session)
            }
        }
    }
}

fn ensure_streak(key: &CouponKey, operation: &'static str) -> Result<(), RedemptionError> {
    if key.kind == CouponKind::Streak {
        Ok(())
    } else {
        Err(unsupported(key, operation))
    }
}

fn unsupported(key: &CouponKey, operation: &'static str) -> RedemptionError {
    RedemptionError::UnsupportedOperation {
        kind: key.kind,
        operation,
    }
}
