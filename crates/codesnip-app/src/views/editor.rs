use codesnip_auth::session::Identity;
use codesnip_core::collections::SNIPPETS;
use codesnip_core::models::form::SnippetForm;
use codesnip_core::models::snippet::Snippet;
use codesnip_storage::store::DocumentStore;
use tracing::{debug, error, info, warn};

use crate::routing::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Written; go to `next`.
    Saved { id: String, next: Route },
    /// Required fields are blank. Nothing was written.
    Rejected { missing: Vec<&'static str> },
    /// The write failed and was logged. The form is still editable.
    Failed,
}

/// Create-or-edit form for one snippet.
#[derive(Debug, Clone)]
pub struct SnippetEditor {
    mode: EditorMode,
    form: SnippetForm,
    /// Edit mode only: the target exists and belongs to the editor's user.
    target_loaded: bool,
}

impl SnippetEditor {
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            form: SnippetForm::default(),
            target_loaded: false,
        }
    }

    /// Create mode when `id` is `None`; otherwise edit mode, populated from
    /// the stored snippet. A missing or foreign snippet leaves the form empty.
    pub async fn open(store: &dyn DocumentStore, identity: &Identity, id: Option<&str>) -> Self {
        let Some(id) = id else {
            return Self::create();
        };

        let mut editor = Self {
            mode: EditorMode::Edit { id: id.to_string() },
            form: SnippetForm::default(),
            target_loaded: false,
        };

        match store.get_by_id(SNIPPETS, id).await {
            Ok(Some(document)) => match Snippet::from_document(id, document) {
                Ok(snippet) if snippet.is_owned_by(&identity.user_id) => {
                    editor.form = SnippetForm::from_snippet(&snippet);
                    editor.target_loaded = true;
                }
                Ok(_) => debug!(snippet_id = %id, "snippet belongs to another user"),
                Err(e) => error!(snippet_id = %id, error = %e, "malformed snippet"),
            },
            Ok(None) => debug!(snippet_id = %id, "snippet not found"),
            Err(e) => error!(snippet_id = %id, error = %e, "failed to fetch snippet"),
        }

        editor
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, EditorMode::Edit { .. })
    }

    pub fn form(&self) -> &SnippetForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SnippetForm {
        &mut self.form
    }

    pub fn set_form(&mut self, form: SnippetForm) {
        self.form = form;
    }

    pub fn heading(&self) -> &'static str {
        if self.is_edit() { "Edit Snippet" } else { "Create New Snippet" }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_edit() { "Update Snippet" } else { "Create Snippet" }
    }

    pub async fn submit(&self, store: &dyn DocumentStore, identity: &Identity) -> SubmitOutcome {
        self.submit_at(store, identity, jiff::Timestamp::now()).await
    }

    /// Validate and write the form as of `now`: one create in create mode,
    /// one update by id in edit mode.
    pub async fn submit_at(
        &self,
        store: &dyn DocumentStore,
        identity: &Identity,
        now: jiff::Timestamp,
    ) -> SubmitOutcome {
        let missing = self.form.missing_fields();
        if !missing.is_empty() {
            return SubmitOutcome::Rejected { missing };
        }

        match &self.mode {
            EditorMode::Create => {
                let document = match self.form.create_document(&identity.user_id, now) {
                    Ok(document) => document,
                    Err(e) => {
                        error!(error = %e, "failed to build snippet document");
                        return SubmitOutcome::Failed;
                    }
                };
                match store.create(SNIPPETS, document).await {
                    Ok(id) => {
                        info!(snippet_id = %id, user_id = %identity.user_id, "snippet created");
                        SubmitOutcome::Saved {
                            id,
                            next: Route::List,
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "failed to create snippet");
                        SubmitOutcome::Failed
                    }
                }
            }
            EditorMode::Edit { id } => {
                if !self.target_loaded {
                    warn!(snippet_id = %id, "refusing to update a snippet that was not loaded");
                    return SubmitOutcome::Failed;
                }
                let document = match self.form.update_document(now) {
                    Ok(document) => document,
                    Err(e) => {
                        error!(error = %e, "failed to build snippet document");
                        return SubmitOutcome::Failed;
                    }
                };
                match store.update_by_id(SNIPPETS, id, document).await {
                    Ok(()) => {
                        info!(snippet_id = %id, "snippet updated");
                        SubmitOutcome::Saved {
                            id: id.clone(),
                            next: Route::List,
                        }
                    }
                    Err(e) => {
                        error!(snippet_id = %id, error = %e, "failed to update snippet");
                        SubmitOutcome::Failed
                    }
                }
            }
        }
    }
}
