use std::future::Future;
use std::pin::Pin;

use codesnip_core::models::Document;
use serde_json::Value;

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A document together with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Contract of the hosted document store.
///
/// Every call is a single request with no transaction or retry logic.
/// Methods return boxed futures for dyn compatibility.
pub trait DocumentStore: Send + Sync {
    /// Store a new document and return the id assigned to it.
    fn create<'a>(
        &'a self,
        collection: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    /// Fetch a document by id. `Ok(None)` when it doesn't exist.
    fn get_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StorageError>>;

    /// Overwrite the given top-level fields of an existing document.
    /// Fields absent from `record` keep their stored value. Updating a
    /// missing id fails with `StorageError::NotFound`.
    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Permanently remove a document. Removing a missing id succeeds.
    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Every document of the collection whose `field` equals `value`.
    fn query_by_equality<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, StorageError>>;
}

/// Shallow merge used by every backend's `update_by_id`.
pub fn merge_fields(existing: &mut Document, record: Document) {
    for (field, value) in record {
        existing.insert(field, value);
    }
}

pub fn field_equals(document: &Document, field: &str, value: &Value) -> bool {
    document.get(field) == Some(value)
}
