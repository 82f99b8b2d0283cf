//! Document store naming conventions.
//!
//! Pure string functions with no storage dependency. These define the canonical
//! collection names, stored field names and object key layout.

pub const SNIPPETS: &str = "snippets";

/// Stored field names of a snippet document.
pub mod field {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const LANGUAGE: &str = "language";
    pub const CODE: &str = "code";
    pub const TAGS: &str = "tags";
    pub const USER_ID: &str = "userId";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

pub fn document_key(collection: &str, id: &str) -> String {
    format!("{collection}/{id}.json")
}

pub fn collection_prefix(collection: &str) -> String {
    format!("{collection}/")
}

/// Recover the document id from a key produced by [`document_key`].
pub fn id_from_key<'a>(collection: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(collection)?
        .strip_prefix('/')?
        .strip_suffix(".json")
        .filter(|id| !id.is_empty() && !id.contains('/'))
}
