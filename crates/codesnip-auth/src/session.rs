//! The session value shared by every view.
//!
//! One provider owns a [`SessionCell`] and is the only writer. Everything
//! else reads through a [`SessionWatch`] obtained from
//! [`SessionProvider::subscribe`]; dropping the watch (or calling
//! [`SessionWatch::unsubscribe`]) ends the subscription.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AuthError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id; snippets are owned by this value.
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            email: None,
        }
    }

    /// Best human-readable name available.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not resolved yet, e.g. a remembered session is being restored.
    #[default]
    Unknown,
    Anonymous,
    Authenticated(Identity),
}

impl SessionStatus {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionStatus::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionStatus::Unknown)
    }
}

/// Writer side of the session value. Held only by a provider.
pub struct SessionCell {
    tx: watch::Sender<SessionStatus>,
}

impl SessionCell {
    pub fn new(initial: SessionStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> SessionStatus {
        self.tx.borrow().clone()
    }

    /// Publish a new status. Subscribers are only woken on a real change.
    pub fn set(&self, status: SessionStatus) {
        self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only subscription to a session value.
#[derive(Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<SessionStatus>,
}

impl SessionWatch {
    pub fn current(&self) -> SessionStatus {
        self.rx.borrow().clone()
    }

    /// Whether the value changed since it was last marked seen.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Read the value and mark it seen.
    pub fn mark_seen(&mut self) -> SessionStatus {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change. `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<SessionStatus> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

/// Outcome of a password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
    Complete(Identity),
    /// The user pool wants a TOTP code; pass `session` to
    /// [`SessionProvider::confirm_mfa`].
    MfaRequired { session: String },
}

/// Contract of an authentication provider bound to one client session.
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> SessionStatus;

    fn subscribe(&self) -> SessionWatch;

    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<SignIn, AuthError>>;

    fn confirm_mfa<'a>(
        &'a self,
        username: &'a str,
        session: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Identity, AuthError>>;

    /// End the session. On failure the status is left unchanged.
    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>>;

    /// Credential a client may keep to restore this session later.
    fn remember_token(&self) -> Option<String> {
        None
    }
}

/// Opens one [`SessionProvider`] per client session.
pub trait SessionFactory: Send + Sync {
    /// `restore` is a token previously returned by
    /// [`SessionProvider::remember_token`]. While it is being checked the
    /// new session reports [`SessionStatus::Unknown`].
    fn open(&self, restore: Option<String>) -> Arc<dyn SessionProvider>;
}
