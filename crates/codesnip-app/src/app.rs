use std::sync::Arc;

use codesnip_auth::error::AuthError;
use codesnip_auth::session::{Identity, SessionProvider, SessionStatus, SignIn};
use codesnip_storage::store::DocumentStore;
use tracing::error;

use crate::routing::{Decision, Route, ViewStateMachine};
use crate::views::detail::{DetailLoad, SnippetDetail};
use crate::views::editor::SnippetEditor;
use crate::views::list::SnippetList;

/// What a client should show for a requested path.
pub enum Screen {
    Loading,
    Redirect(Route),
    Auth,
    List(SnippetList),
    Editor(SnippetEditor),
    Detail(SnippetDetail),
    /// The detail fetch failed; nothing to show.
    DetailUnavailable,
    NotFound,
}

/// One client session: its session provider, its store handle and the
/// routing state derived from them.
pub struct App {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
    machine: ViewStateMachine,
}

impl App {
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<dyn SessionProvider>) -> Self {
        let machine = ViewStateMachine::new(session.subscribe());
        Self {
            store,
            session,
            machine,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn session(&self) -> &dyn SessionProvider {
        self.session.as_ref()
    }

    pub fn machine(&mut self) -> &mut ViewStateMachine {
        &mut self.machine
    }

    /// Session status as of the latest navigation or refresh.
    pub fn status(&self) -> &SessionStatus {
        self.machine.status()
    }

    /// Identity as of now, straight from the provider.
    pub fn identity(&self) -> Option<Identity> {
        self.session.current().identity().cloned()
    }

    /// Run the routing policy for `path` and load the allowed view.
    pub async fn open(&mut self, path: &str) -> Screen {
        match self.machine.navigate(path) {
            Decision::Loading => Screen::Loading,
            Decision::Redirect(route) => Screen::Redirect(route),
            Decision::NotFound => Screen::NotFound,
            Decision::Allow(route) => self.load(route).await,
        }
    }

    async fn load(&mut self, route: Route) -> Screen {
        let Some(identity) = self.machine.status().identity().cloned() else {
            return Screen::Auth;
        };
        let store = self.store.as_ref();

        match route {
            Route::Auth => Screen::Auth,
            Route::List => Screen::List(SnippetList::load(store, &identity).await),
            Route::Create => Screen::Editor(SnippetEditor::create()),
            Route::Edit(id) => Screen::Editor(SnippetEditor::open(store, &identity, Some(&id)).await),
            Route::Detail(id) => match SnippetDetail::open(store, &identity, &id).await {
                DetailLoad::Ready(detail) => Screen::Detail(detail),
                DetailLoad::NotFound => {
                    self.machine.navigate(&Route::List.path());
                    Screen::Redirect(Route::List)
                }
                DetailLoad::Failed => Screen::DetailUnavailable,
            },
        }
    }

    /// Password sign-in through the session provider.
    pub async fn sign_in(&mut self, username: &str, password: &str) -> Result<SignIn, AuthError> {
        let outcome = self.session.sign_in(username, password).await?;
        self.machine.refresh();
        Ok(outcome)
    }

    pub async fn confirm_mfa(
        &mut self,
        username: &str,
        session: &str,
        code: &str,
    ) -> Result<Identity, AuthError> {
        let identity = self.session.confirm_mfa(username, session, code).await?;
        self.machine.refresh();
        Ok(identity)
    }

    /// Sign out and re-evaluate the current location. A rejected sign-out
    /// is logged, changes nothing and is handed back to the caller.
    pub async fn sign_out(&mut self) -> Result<Option<Decision>, AuthError> {
        if let Err(e) = self.session.sign_out().await {
            error!(error = %e, "error signing out");
            return Err(e);
        }
        Ok(self.machine.refresh())
    }
}
