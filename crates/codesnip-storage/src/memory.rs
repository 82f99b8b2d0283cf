use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use codesnip_core::collections::document_key;
use codesnip_core::models::Document;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::{BoxFuture, DocumentStore, StoredDocument, field_equals, merge_fields};

/// In-process document store. Documents within a collection are kept in
/// id order, which is also the query result order.
///
/// Used for local development and tests. `set_offline(true)` makes every
/// call fail with `StorageError::Unavailable`, like an unreachable backend.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents currently stored in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create<'a>(
        &'a self,
        collection: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            self.check_online()?;
            let id = Uuid::new_v4().to_string();
            self.collections
                .write()
                .await
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), record);
            Ok(id)
        })
    }

    fn get_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StorageError>> {
        Box::pin(async move {
            self.check_online()?;
            let collections = self.collections.read().await;
            Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
        })
    }

    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.check_online()?;
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StorageError::NotFound {
                    key: document_key(collection, id),
                })?;
            merge_fields(existing, record);
            Ok(())
        })
    }

    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.check_online()?;
            if let Some(docs) = self.collections.write().await.get_mut(collection) {
                docs.remove(id);
            }
            Ok(())
        })
    }

    fn query_by_equality<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, StorageError>> {
        Box::pin(async move {
            self.check_online()?;
            let collections = self.collections.read().await;
            let Some(docs) = collections.get(collection) else {
                return Ok(Vec::new());
            };
            Ok(docs
                .iter()
                .filter(|(_, doc)| field_equals(doc, field, value))
                .map(|(id, doc)| StoredDocument {
                    id: id.clone(),
                    data: doc.clone(),
                })
                .collect())
        })
    }
}
