pub mod form;
pub mod language;
pub mod snippet;

/// A schemaless stored record: the JSON object body of one document.
pub type Document = serde_json::Map<String, serde_json::Value>;
