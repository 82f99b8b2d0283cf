//! Authentication-gated routing.
//!
//! The allowed screen is a function of exactly two inputs: the session
//! status and the requested path. [`decide`] is that function;
//! [`ViewStateMachine`] re-applies it on every navigation and every
//! session change for the lifetime of a client session.

use std::fmt;

use codesnip_auth::session::{SessionStatus, SessionWatch};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Auth,
    List,
    Create,
    Edit(String),
    Detail(String),
}

impl Route {
    /// Parse a request path. Query string and fragment are ignored, as are
    /// empty segments. Unknown paths, and ids that fail [`is_snippet_id`],
    /// are `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::List),
            ["auth"] => Some(Route::Auth),
            ["create"] => Some(Route::Create),
            ["edit", id] if is_snippet_id(id) => Some(Route::Edit((*id).to_string())),
            ["snippet", id] if is_snippet_id(id) => Some(Route::Detail((*id).to_string())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Auth => "/auth".to_string(),
            Route::List => "/".to_string(),
            Route::Create => "/create".to_string(),
            Route::Edit(id) => format!("/edit/{id}"),
            Route::Detail(id) => format!("/snippet/{id}"),
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Auth)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Snippet ids are URL-safe: ASCII letters, digits, `-` and `_`. Every
/// [`Route::path`] is therefore a valid `Location` header as it stands.
pub fn is_snippet_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Session not resolved yet; show a placeholder and decide nothing.
    Loading,
    Allow(Route),
    Redirect(Route),
    NotFound,
}

pub fn decide(status: &SessionStatus, path: &str) -> Decision {
    if !status.is_resolved() {
        return Decision::Loading;
    }
    match Route::parse(path) {
        Some(route) => decide_route(status, route),
        None => Decision::NotFound,
    }
}

pub fn decide_route(status: &SessionStatus, route: Route) -> Decision {
    match status {
        SessionStatus::Unknown => Decision::Loading,
        SessionStatus::Authenticated(_) if route == Route::Auth => Decision::Redirect(Route::List),
        SessionStatus::Anonymous if route.requires_session() => Decision::Redirect(Route::Auth),
        _ => Decision::Allow(route),
    }
}

/// Current location plus the session it was last evaluated against.
pub struct ViewStateMachine {
    watch: SessionWatch,
    status: SessionStatus,
    location: String,
}

impl ViewStateMachine {
    pub fn new(mut watch: SessionWatch) -> Self {
        let status = watch.mark_seen();
        Self {
            watch,
            status,
            location: Route::List.path(),
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Request a path. A redirect moves the location to its target.
    pub fn navigate(&mut self, path: &str) -> Decision {
        self.sync();
        self.location = path.to_string();
        self.evaluate()
    }

    /// Re-evaluate the current location if the session changed since the
    /// last evaluation.
    pub fn refresh(&mut self) -> Option<Decision> {
        self.sync().then(|| self.evaluate())
    }

    /// Wait for the next session change and re-evaluate. `None` once the
    /// session provider is gone.
    pub async fn session_changed(&mut self) -> Option<Decision> {
        self.status = self.watch.changed().await?;
        Some(self.evaluate())
    }

    fn sync(&mut self) -> bool {
        if !self.watch.has_changed() {
            return false;
        }
        self.status = self.watch.mark_seen();
        debug!(status = ?self.status, "session changed");
        true
    }

    fn evaluate(&mut self) -> Decision {
        let decision = decide(&self.status, &self.location);
        if let Decision::Redirect(target) = &decision {
            debug!(from = %self.location, to = %target, "redirect");
            self.location = target.path();
        }
        decision
    }
}
