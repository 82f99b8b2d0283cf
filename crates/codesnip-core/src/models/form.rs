use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collections::field;
use crate::error::CoreError;
use crate::models::Document;
use crate::models::language::Language;
use crate::models::snippet::Snippet;
use crate::tags::{join_tags, parse_tags};

/// Editor form state. Every field is free text, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

impl Default for SnippetForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            language: Language::default().label().to_string(),
            code: String::new(),
            tags: String::new(),
        }
    }
}

impl SnippetForm {
    pub fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            title: snippet.title.clone(),
            description: snippet.description.clone(),
            language: snippet.language.label().to_string(),
            code: snippet.code.clone(),
            tags: join_tags(&snippet.tags),
        }
    }

    /// Required fields that are blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push(field::TITLE);
        }
        if self.language.trim().is_empty() {
            missing.push(field::LANGUAGE);
        }
        if self.code.trim().is_empty() {
            missing.push(field::CODE);
        }
        missing
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self.missing_fields().first().copied() {
            Some(name) => Err(CoreError::MissingField(name)),
            None => Ok(()),
        }
    }

    pub fn language(&self) -> Language {
        Language::from_label(&self.language)
    }

    /// Document body for a new snippet owned by `user_id`.
    pub fn create_document(
        &self,
        user_id: &str,
        now: jiff::Timestamp,
    ) -> Result<Document, CoreError> {
        let mut doc = self.update_document(now)?;
        doc.insert(field::USER_ID.to_string(), Value::String(user_id.to_string()));
        doc.insert(field::CREATED_AT.to_string(), serde_json::to_value(now)?);
        Ok(doc)
    }

    /// Mutable fields plus `updatedAt`. Owner and creation time are never
    /// part of an update.
    pub fn update_document(&self, now: jiff::Timestamp) -> Result<Document, CoreError> {
        self.validate()?;

        let mut doc = Document::new();
        doc.insert(field::TITLE.to_string(), Value::String(self.title.clone()));
        doc.insert(
            field::DESCRIPTION.to_string(),
            Value::String(self.description.clone()),
        );
        doc.insert(field::LANGUAGE.to_string(), serde_json::to_value(self.language())?);
        doc.insert(field::CODE.to_string(), Value::String(self.code.clone()));
        doc.insert(field::TAGS.to_string(), serde_json::to_value(parse_tags(&self.tags))?);
        doc.insert(field::UPDATED_AT.to_string(), serde_json::to_value(now)?);
        Ok(doc)
    }
}
