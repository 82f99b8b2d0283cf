use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::Document;
use crate::models::language::Language;

/// A stored code snippet.
///
/// `id` is the store-assigned key and is not part of the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: Language,
    pub code: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Snippet {
    /// Decode a stored document body, attaching its key.
    pub fn from_document(id: impl Into<String>, document: Document) -> Result<Self, CoreError> {
        let mut snippet: Snippet = serde_json::from_value(serde_json::Value::Object(document))?;
        snippet.id = id.into();
        Ok(snippet)
    }

    /// Encode the document body. The id stays outside the body.
    pub fn to_document(&self) -> Result<Document, CoreError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(CoreError::NotAnObject),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
