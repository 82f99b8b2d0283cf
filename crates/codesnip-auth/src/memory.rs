use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::session::{
    BoxFuture, Identity, SessionCell, SessionFactory, SessionProvider, SessionStatus,
    SessionWatch, SignIn,
};

#[derive(Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// Fixed in-process account list for local development and tests.
///
/// Clones share the remember tokens issued so far, so a token handed out
/// by one session restores in any other session opened from the same list.
#[derive(Clone, Default)]
pub struct MemoryAccounts {
    accounts: HashMap<String, Account>,
    /// Live remember tokens, token -> username.
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account whose user id is `local-{username}`.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                identity: Identity {
                    user_id: format!("local-{username}"),
                    username: Some(username.to_string()),
                    email: None,
                },
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn check(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        match self.accounts.get(username) {
            Some(account) if account.password == password => Ok(account.identity.clone()),
            _ => Err(AuthError::AuthFailed("incorrect username or password".to_string())),
        }
    }

    /// Number of remember tokens that would still restore a session.
    pub fn live_tokens(&self) -> usize {
        self.tokens.read().map_or(0, |tokens| tokens.len())
    }

    fn issue_token(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.clone(), username.to_string());
        }
        token
    }

    fn revoke_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }

    /// Only tokens this list issued and has not revoked restore a session.
    fn remembered(&self, token: &str) -> Option<Identity> {
        let tokens = self.tokens.read().ok()?;
        let username = tokens.get(token)?;
        self.accounts.get(username).map(|a| a.identity.clone())
    }
}

impl SessionFactory for MemoryAccounts {
    fn open(&self, restore: Option<String>) -> Arc<dyn SessionProvider> {
        let initial = if restore.is_some() {
            SessionStatus::Unknown
        } else {
            SessionStatus::Anonymous
        };
        let session = Arc::new(MemorySession {
            accounts: self.clone(),
            cell: SessionCell::new(initial),
            token: Mutex::new(None),
        });

        // Resolved asynchronously, like a remote provider would.
        if let Some(token) = restore {
            let restoring = Arc::clone(&session);
            tokio::spawn(async move { restoring.restore(&token) });
        }

        session
    }
}

pub struct MemorySession {
    accounts: MemoryAccounts,
    cell: SessionCell,
    /// Remember token of the signed-in user.
    token: Mutex<Option<String>>,
}

impl MemorySession {
    fn restore(&self, token: &str) {
        match self.accounts.remembered(token) {
            Some(identity) => self.establish(identity, token.to_string()),
            None => {
                warn!("could not restore remembered session");
                self.cell.set(SessionStatus::Anonymous);
            }
        }
    }

    fn establish(&self, identity: Identity, token: String) {
        if let Some(previous) = self.replace_token(Some(token)) {
            self.accounts.revoke_token(&previous);
        }
        info!(user_id = %identity.user_id, "session established");
        self.cell.set(SessionStatus::Authenticated(identity));
    }

    fn replace_token(&self, token: Option<String>) -> Option<String> {
        let mut slot = self.token.lock().ok()?;
        std::mem::replace(&mut *slot, token)
    }
}

impl SessionProvider for MemorySession {
    fn current(&self) -> SessionStatus {
        self.cell.get()
    }

    fn subscribe(&self) -> SessionWatch {
        self.cell.subscribe()
    }

    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<SignIn, AuthError>> {
        Box::pin(async move {
            let identity = self.accounts.check(username, password)?;
            let token = self.accounts.issue_token(username);
            self.establish(identity.clone(), token);
            Ok(SignIn::Complete(identity))
        })
    }

    fn confirm_mfa<'a>(
        &'a self,
        _username: &'a str,
        _session: &'a str,
        _code: &'a str,
    ) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(async { Err(AuthError::MfaFailed("no MFA on local accounts".to_string())) })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(async move {
            if let Some(token) = self.replace_token(None) {
                self.accounts.revoke_token(&token);
            }
            self.cell.set(SessionStatus::Anonymous);
            info!("signed out");
            Ok(())
        })
    }

    fn remember_token(&self) -> Option<String> {
        self.token.lock().ok()?.clone()
    }
}
