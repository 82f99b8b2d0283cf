use codesnip_auth::session::Identity;
use codesnip_core::collections::SNIPPETS;
use codesnip_core::models::snippet::Snippet;
use codesnip_storage::store::DocumentStore;
use tracing::{debug, error, info};

use super::{Clipboard, Confirmation};
use crate::routing::Route;

pub enum DetailLoad {
    Ready(SnippetDetail),
    /// No such snippet for this user. Callers redirect to the list.
    NotFound,
    /// The read failed and was logged.
    Failed,
}

/// One snippet with its copy/edit/delete actions.
#[derive(Debug, Clone)]
pub struct SnippetDetail {
    snippet: Snippet,
    copied: bool,
}

impl SnippetDetail {
    pub async fn open(store: &dyn DocumentStore, identity: &Identity, id: &str) -> DetailLoad {
        let document = match store.get_by_id(SNIPPETS, id).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(snippet_id = %id, "snippet not found");
                return DetailLoad::NotFound;
            }
            Err(e) => {
                error!(snippet_id = %id, error = %e, "failed to fetch snippet");
                return DetailLoad::Failed;
            }
        };

        match Snippet::from_document(id, document) {
            Ok(snippet) if snippet.is_owned_by(&identity.user_id) => {
                DetailLoad::Ready(Self::new(snippet))
            }
            Ok(_) => {
                debug!(snippet_id = %id, "snippet belongs to another user");
                DetailLoad::NotFound
            }
            Err(e) => {
                error!(snippet_id = %id, error = %e, "malformed snippet");
                DetailLoad::Failed
            }
        }
    }

    pub fn new(snippet: Snippet) -> Self {
        Self {
            snippet,
            copied: false,
        }
    }

    pub fn snippet(&self) -> &Snippet {
        &self.snippet
    }

    /// Whether the last copy attempt succeeded.
    pub fn copied(&self) -> bool {
        self.copied
    }

    /// Best effort; a failure is only logged.
    pub fn copy_code(&mut self, clipboard: &dyn Clipboard) -> bool {
        self.copied = match clipboard.write_text(&self.snippet.code) {
            Ok(()) => true,
            Err(e) => {
                error!(snippet_id = %self.snippet.id, error = %e, "failed to copy");
                false
            }
        };
        self.copied
    }

    pub fn edit_route(&self) -> Route {
        Route::Edit(self.snippet.id.clone())
    }

    /// Delete after confirmation; `Some(Route::List)` once the store
    /// accepted it.
    pub async fn delete(
        &self,
        store: &dyn DocumentStore,
        confirmation: Confirmation,
    ) -> Option<Route> {
        if confirmation == Confirmation::Declined {
            return None;
        }
        let id = &self.snippet.id;
        match store.delete_by_id(SNIPPETS, id).await {
            Ok(()) => {
                info!(snippet_id = %id, "snippet deleted");
                Some(Route::List)
            }
            Err(e) => {
                error!(snippet_id = %id, error = %e, "failed to delete snippet");
                None
            }
        }
    }
}
