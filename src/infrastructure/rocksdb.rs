use crate::domain::ports::{Document, DocumentStore, LocalCache};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for remote-style coupon documents.
pub const CF_DOCUMENTS: &str = "documents";
/// Column Family for the device-local string cache.
pub const CF_CACHE: &str = "cache";

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// A persistent store implementation using RocksDB.
///
/// Serves as either port: documents live in one column family keyed by
/// `collection/id`, cache entries in another. Read-modify-write document
/// operations are serialized through a process-wide write lock so that
/// `array_union` never loses a concurrent append.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("documents" and "cache") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_documents = ColumnFamilyDescriptor::new(CF_DOCUMENTS, Options::default());
        let cf_cache = ColumnFamilyDescriptor::new(CF_CACHE, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_documents, cf_cache])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn document_key(collection: &str, id: &str) -> Vec<u8> {
        format!("{collection}/{id}").into_bytes()
    }

    fn read_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let cf = self.cf(CF_DOCUMENTS)?;
        match self.db.get_cf(cf, Self::document_key(collection, id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_document(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let value = serde_json::to_vec(doc)?;
        self.db.put_cf(cf, Self::document_key(collection, id), value)?;
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("{name} column family not found")))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Backend("write lock poisoned".to_string()))
    }

    fn existing_document(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.read_document(collection, id)?
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

#[async_trait]
impl DocumentStore for RocksDBStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.read_document(collection, id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut stored = match self.read_document(collection, id)? {
            Some(mut existing) if merge => {
                existing.extend(doc);
                existing
            }
            _ => doc,
        };
        if !stored.contains_key("created_at") {
            stored.insert("created_at".to_string(), now_value());
        }
        self.write_document(collection, id, &stored)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut doc = self.existing_document(collection, id)?;
        doc.extend(fields);
        doc.insert("last_updated".to_string(), now_value());
        self.write_document(collection, id, &doc)
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut doc = self.existing_document(collection, id)?;
        let array = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| StoreError::MalformedDocument(format!("{field} is not an array")))?;
        for value in values {
            if !array.contains(&value) {
                array.push(value);
            }
        }
        doc.insert("last_updated".to_string(), now_value());
        self.write_document(collection, id, &doc)
    }
}

#[async_trait]
impl LocalCache for RocksDBStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let cf = self.cf(CF_CACHE)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                StoreError::MalformedLocalData {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let cf = self.cf(CF_CACHE)?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let cf = self.cf(CF_CACHE)?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_DOCUMENTS).is_some());
        assert!(store.db.cf_handle(CF_CACHE).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_document_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let doc = json!({ "kind": "monetary", "balance": 15000, "history": [] });
        DocumentStore::set(&store, "coupons", "a", doc.as_object().cloned().unwrap(), false)
            .await
            .unwrap();
        DocumentStore::array_union(&store, "coupons", "a", "history", vec![json!({ "n": 1 })])
            .await
            .unwrap();

        let stored = DocumentStore::get(&store, "coupons", "a").await.unwrap().unwrap();
        assert_eq!(stored["balance"], 15000);
        assert_eq!(stored["history"], json!([{ "n": 1 }]));
        assert!(DocumentStore::get(&store, "coupons", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_cache() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        LocalCache::set(&store, "coupon_a_balance", "7000".to_string())
            .await
            .unwrap();
        assert_eq!(
            LocalCache::get(&store, "coupon_a_balance").await.unwrap().as_deref(),
            Some("7000")
        );
        LocalCache::remove(&store, "coupon_a_balance").await.unwrap();
        assert!(LocalCache::get(&store, "coupon_a_balance").await.unwrap().is_none());
    }
}
