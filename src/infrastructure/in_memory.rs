use crate::domain::ports::{Document, DocumentStore, LocalCache};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

type DocumentKey = (String, String);

/// A thread-safe in-memory document store.
///
/// Clones share the same documents, so several ledgers built on clones behave
/// like sessions on different devices talking to one remote store. The store
/// can be switched offline to simulate an unreachable backend.
#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, Document>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    /// Creates a new, empty, reachable document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call succeed (`true`) or fail with
    /// `RemoteUnavailable` (`false`).
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Reads a document directly, ignoring the online switch.
    pub async fn document(&self, collection: &str, id: &str) -> Option<Document> {
        let documents = self.documents.read().await;
        documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::RemoteUnavailable(
                "in-memory store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_online()?;
        Ok(self.document(collection, id).await)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut documents = self.documents.write().await;
        let key = (collection.to_string(), id.to_string());

        let mut stored = match documents.remove(&key) {
            Some(mut existing) if merge => {
                existing.extend(doc);
                existing
            }
            _ => doc,
        };
        if !stored.contains_key("created_at") {
            stored.insert("created_at".to_string(), now_value());
        }
        documents.insert(key, stored);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(&(collection.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        doc.extend(fields);
        doc.insert("last_updated".to_string(), now_value());
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(&(collection.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

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
        Ok(())
    }
}

/// A thread-safe in-memory string cache.
#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_document() {
        let store = InMemoryDocumentStore::new();
        store
            .set("coupons", "a", doc(json!({ "balance": 10 })), false)
            .await
            .unwrap();

        let stored = store.get("coupons", "a").await.unwrap().unwrap();
        assert_eq!(stored["balance"], 10);
        assert!(stored.contains_key("created_at"));
        assert!(store.get("coupons", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_unless_merging() {
        let store = InMemoryDocumentStore::new();
        store
            .set("coupons", "a", doc(json!({ "balance": 10, "note": "x" })), false)
            .await
            .unwrap();
        store
            .set("coupons", "a", doc(json!({ "balance": 5 })), true)
            .await
            .unwrap();
        assert_eq!(store.document("coupons", "a").await.unwrap()["note"], "x");

        store
            .set("coupons", "a", doc(json!({ "balance": 1 })), false)
            .await
            .unwrap();
        assert!(!store.document("coupons", "a").await.unwrap().contains_key("note"));
    }

    #[tokio::test]
    async fn test_update_requires_existing_document() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update("coupons", "missing", doc(json!({ "balance": 1 })))
            .await;
        assert!(matches!(result, Err(StoreError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn test_array_union_skips_duplicates() {
        let store = InMemoryDocumentStore::new();
        store
            .set("coupons", "a", doc(json!({ "history": [1] })), false)
            .await
            .unwrap();
        store
            .array_union("coupons", "a", "history", vec![json!(1), json!(2)])
            .await
            .unwrap();

        let stored = store.document("coupons", "a").await.unwrap();
        assert_eq!(stored["history"], json!([1, 2]));
        assert!(stored.contains_key("last_updated"));
    }

    #[tokio::test]
    async fn test_offline_store_rejects_calls() {
        let store = InMemoryDocumentStore::new();
        store.set_online(false);
        assert!(matches!(
            store.get("coupons", "a").await,
            Err(StoreError::RemoteUnavailable(_))
        ));
        store.set_online(true);
        assert!(store.get("coupons", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_cache() {
        let cache = InMemoryCache::new();
        cache.set("k", "1".to_string()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("1"));
        cache.remove("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
