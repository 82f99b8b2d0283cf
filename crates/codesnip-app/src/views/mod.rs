pub mod detail;
pub mod editor;
pub mod list;

use codesnip_core::models::snippet::Snippet;
use codesnip_storage::store::StoredDocument;
use tracing::warn;

use crate::error::ClipboardError;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this snippet?";

/// The user's answer to [`DELETE_PROMPT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// System clipboard, as far as the client can reach it.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Decode a stored snippet, skipping (and logging) malformed documents.
fn decode(stored: StoredDocument) -> Option<Snippet> {
    let id = stored.id.clone();
    match Snippet::from_document(stored.id, stored.data) {
        Ok(snippet) => Some(snippet),
        Err(e) => {
            warn!(snippet_id = %id, error = %e, "skipping malformed snippet");
            None
        }
    }
}
