use crate::domain::ports::{Document, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// A document store with no backend. Every call fails with `RemoteUnavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineDocumentStore;

impl OfflineDocumentStore {
    fn unavailable<T>() -> Result<T, StoreError> {
        Err(StoreError::RemoteUnavailable(
            "running in offline mode".to_string(),
        ))
    }
}

#[async_trait]
impl DocumentStore for OfflineDocumentStore {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, StoreError> {
        Self::unavailable()
    }

    async fn set(
        &self,
        _collection: &str,
        _id: &str,
        _doc: Document,
        _merge: bool,
    ) -> Result<(), StoreError> {
        Self::unavailable()
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Document,
    ) -> Result<(), StoreError> {
        Self::unavailable()
    }

    async fn array_union(
        &self,
        _collection: &str,
        _id: &str,
        _field: &str,
        _values: Vec<Value>,
    ) -> Result<(), StoreError> {
        Self::unavailable()
    }
}
