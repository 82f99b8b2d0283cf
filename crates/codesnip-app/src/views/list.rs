use codesnip_auth::session::Identity;
use codesnip_core::collections::{SNIPPETS, field};
use codesnip_core::filter::{SnippetFilter, languages_present};
use codesnip_core::models::language::Language;
use codesnip_core::models::snippet::Snippet;
use codesnip_storage::store::DocumentStore;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{Confirmation, decode};

/// Why nothing is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The user has no snippets at all.
    NoSnippets,
    /// Snippets exist but the filters hide all of them.
    NoMatches,
}

/// The signed-in user's snippets plus local filters over them.
#[derive(Debug, Clone, Default)]
pub struct SnippetList {
    snippets: Vec<Snippet>,
    filter: SnippetFilter,
}

impl SnippetList {
    /// Fetch every snippet owned by `identity`. A failed fetch is logged and
    /// yields an empty list.
    pub async fn load(store: &dyn DocumentStore, identity: &Identity) -> Self {
        let owner = Value::String(identity.user_id.clone());
        let snippets = match store.query_by_equality(SNIPPETS, field::USER_ID, &owner).await {
            Ok(documents) => documents.into_iter().filter_map(decode).collect(),
            Err(e) => {
                error!(user_id = %identity.user_id, error = %e, "failed to fetch snippets");
                Vec::new()
            }
        };
        Self::from_snippets(snippets)
    }

    pub fn from_snippets(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets,
            filter: SnippetFilter::default(),
        }
    }

    /// The canonical, unfiltered list.
    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn filter(&self) -> &SnippetFilter {
        &self.filter
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
    }

    pub fn set_language(&mut self, language: Option<Language>) {
        self.filter.language = language;
    }

    pub fn visible(&self) -> Vec<&Snippet> {
        self.filter.apply(&self.snippets)
    }

    pub fn languages(&self) -> Vec<Language> {
        languages_present(&self.snippets)
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.snippets.is_empty() {
            Some(EmptyState::NoSnippets)
        } else if self.visible().is_empty() {
            Some(EmptyState::NoMatches)
        } else {
            None
        }
    }

    /// Delete a snippet after confirmation. Local state only changes once
    /// the store has accepted the delete. Returns whether it was removed.
    pub async fn delete(
        &mut self,
        store: &dyn DocumentStore,
        id: &str,
        confirmation: Confirmation,
    ) -> bool {
        if confirmation == Confirmation::Declined {
            return false;
        }
        if !self.snippets.iter().any(|s| s.id == id) {
            warn!(snippet_id = %id, "refusing to delete a snippet outside the list");
            return false;
        }
        match store.delete_by_id(SNIPPETS, id).await {
            Ok(()) => {
                self.snippets.retain(|s| s.id != id);
                info!(snippet_id = %id, "snippet deleted");
                true
            }
            Err(e) => {
                error!(snippet_id = %id, error = %e, "failed to delete snippet");
                false
            }
        }
    }
}
