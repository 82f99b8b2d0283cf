use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, InvalidHeaderValue, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::sessions::{REFRESH_COOKIE, SESSION_COOKIE, SharedApp};
use crate::state::AppState;

/// The browser session a request belongs to.
#[derive(Clone)]
pub struct BrowserSession {
    pub id: String,
    pub app: SharedApp,
}

/// Browser session middleware.
///
/// Looks up the session named by the session cookie, or starts one
/// (restoring a remembered sign-in) and sets the cookie on the response.
/// Handlers read it with `Extension<BrowserSession>`.
pub async fn attach_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookies = read_cookies(req.headers());

    let existing = match cookies.get(SESSION_COOKIE) {
        Some(id) => state.browsers.get(id).await.map(|app| (id.clone(), app)),
        None => None,
    };
    let (session, started) = match existing {
        Some((id, app)) => (BrowserSession { id, app }, false),
        None => {
            let restore = cookies.get(REFRESH_COOKIE).cloned();
            let (id, app) = state
                .browsers
                .open(Arc::clone(&state.store), state.sessions.as_ref(), restore)
                .await;
            (BrowserSession { id, app }, true)
        }
    };

    let id = session.id.clone();
    req.extensions_mut().insert(session);
    let mut response = next.run(req).await;

    if started {
        match set_cookie(SESSION_COOKIE, &id, None, state.secure_cookies) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "failed to set session cookie"),
        }
    }
    response
}

/// Name/value pairs from every `Cookie` header.
pub fn read_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// A `Set-Cookie` value scoped to the whole site. `Some(0)` clears it.
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age_secs: Option<u64>,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
