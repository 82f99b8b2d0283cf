use aws_sdk_s3::Client;
use codesnip_core::collections::{collection_prefix, document_key, id_from_key};
use codesnip_core::models::Document;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StorageError;
use crate::objects;
use crate::store::{BoxFuture, DocumentStore, StoredDocument, field_equals, merge_fields};

/// Document store over an S3 bucket: one JSON object per document at
/// `{collection}/{id}.json`.
#[derive(Clone)]
pub struct S3DocumentStore {
    client: Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build an S3 client for `region` from the default AWS credential chain.
    pub async fn connect(region: &str, bucket: impl Into<String>) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Load and decode one document with its ETag.
    async fn load(&self, key: &str) -> Result<Option<(Document, String)>, StorageError> {
        let Some(output) = objects::get_object(&self.client, &self.bucket, key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Value>(&output.body)? {
            Value::Object(document) => Ok(Some((document, output.etag.unwrap_or_default()))),
            _ => Err(StorageError::InvalidDocument {
                key: key.to_string(),
            }),
        }
    }

    async fn create_document(
        &self,
        collection: &str,
        record: Document,
    ) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        let key = document_key(collection, &id);
        let body = serde_json::to_vec(&record)?;
        objects::put_json(&self.client, &self.bucket, &key, body, None).await?;
        info!(key = %key, "document created");
        Ok(id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        record: Document,
    ) -> Result<(), StorageError> {
        let key = document_key(collection, id);
        let (mut document, etag) = self
            .load(&key)
            .await?
            .ok_or_else(|| StorageError::NotFound { key: key.clone() })?;

        merge_fields(&mut document, record);
        let body = serde_json::to_vec(&document)?;
        let if_match = (!etag.is_empty()).then_some(etag.as_str());
        objects::put_json(&self.client, &self.bucket, &key, body, if_match).await?;
        info!(key = %key, "document updated");
        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let keys =
            objects::list_keys(&self.client, &self.bucket, &collection_prefix(collection)).await?;

        let mut found = Vec::new();
        for key in &keys {
            let Some(id) = id_from_key(collection, key) else {
                continue;
            };
            // Deleted between listing and fetching.
            let Some((document, _)) = self.load(key).await? else {
                debug!(key = %key, "listed document vanished");
                continue;
            };
            if field_equals(&document, field, value) {
                found.push(StoredDocument {
                    id: id.to_string(),
                    data: document,
                });
            }
        }
        Ok(found)
    }
}

impl DocumentStore for S3DocumentStore {
    fn create<'a>(
        &'a self,
        collection: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(self.create_document(collection, record))
    }

    fn get_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StorageError>> {
        Box::pin(async move {
            let key = document_key(collection, id);
            Ok(self.load(&key).await?.map(|(document, _)| document))
        })
    }

    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        record: Document,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(self.update_document(collection, id, record))
    }

    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let key = document_key(collection, id);
            objects::delete_object(&self.client, &self.bucket, &key).await?;
            info!(key = %key, "document deleted");
            Ok(())
        })
    }

    fn query_by_equality<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, StorageError>> {
        Box::pin(self.query_documents(collection, field, value))
    }
}
