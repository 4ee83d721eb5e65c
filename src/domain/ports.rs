use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A remote document: field name to JSON value.
pub type Document = Map<String, Value>;

/// Shared document store keyed by collection and document id.
///
/// Implementations stamp `created_at` when a document is first written and
/// `last_updated` on every `update` and `array_union`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Writes `doc`. With `merge` the fields are merged into any existing
    /// document, otherwise the document is replaced.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError>;

    /// Overwrites the given top-level fields. Fails with
    /// `DocumentNotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document)
    -> Result<(), StoreError>;

    /// Appends each value to the array `field` unless an equal value is
    /// already present. Must not rewrite entries other writers added.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), StoreError>;
}

/// Device-local durable string cache.
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub type DocumentStoreBox = Box<dyn DocumentStore>;
pub type LocalCacheBox = Box<dyn LocalCache>;
pub type DocumentStoreFactory = Box<dyn Fn() -> DocumentStoreBox + Send + Sync>;
