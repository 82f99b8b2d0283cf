use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use codesnip_app::app::{App, Screen};
use codesnip_app::routing::{Route, is_snippet_id};
use codesnip_app::views::editor::SubmitOutcome;
use codesnip_app::views::{Confirmation, DELETE_PROMPT};
use codesnip_auth::session::SignIn;
use codesnip_core::models::form::SnippetForm;
use serde::Deserialize;
use tracing::warn;

use crate::error::WebError;
use crate::middleware::session::{BrowserSession, set_cookie};
use crate::routes::pages::{AuthPage, ListQuery, auth_page, confirm_page, editor_page, respond};
use crate::sessions::{REFRESH_COOKIE, SESSION_COOKIE};
use crate::state::AppState;

/// Remembered sign-ins last as long as a Cognito refresh token by default.
const REFRESH_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// MFA step only: the challenge session and the code.
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub code: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Form(form): Form<SignInForm>,
) -> Result<Response, WebError> {
    let mut app = session.app.lock().await;
    let screen = app.open("/auth").await;
    if !matches!(screen, Screen::Auth) {
        return respond(&state, app.status(), screen, &ListQuery::default());
    }

    let username = form.username.trim();
    let result = if form.challenge.is_empty() {
        app.sign_in(username, &form.password).await
    } else {
        app.confirm_mfa(username, &form.challenge, form.code.trim())
            .await
            .map(SignIn::Complete)
    };

    match result {
        Ok(SignIn::Complete(_)) => {
            let mut response = redirect_to_location(&mut app);
            if let Some(token) = app.session().remember_token() {
                let cookie = set_cookie(
                    REFRESH_COOKIE,
                    &token,
                    Some(REFRESH_MAX_AGE_SECS),
                    state.secure_cookies,
                )?;
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Ok(response)
        }
        Ok(SignIn::MfaRequired { session: challenge }) => {
            let page = AuthPage {
                username,
                challenge: Some(&challenge),
                error: None,
            };
            auth_page(&state, app.status(), &page, StatusCode::OK)
        }
        Err(e) => {
            warn!(error = %e, "sign-in rejected");
            let page = AuthPage {
                username,
                challenge: (!form.challenge.is_empty()).then_some(form.challenge.as_str()),
                error: Some("Sign-in failed. Check your details and try again."),
            };
            auth_page(&state, app.status(), &page, StatusCode::UNAUTHORIZED)
        }
    }
}

/// Sign out, then forget this browser session and its cookies. A rejected
/// sign-out leaves the session and cookies as they were.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
) -> Result<Response, WebError> {
    let mut app = session.app.lock().await;
    if app.sign_out().await.is_err() {
        return Ok(redirect_to_location(&mut app));
    }
    let mut response = redirect_to_location(&mut app);
    drop(app);
    state.browsers.remove(&session.id).await;

    let headers = response.headers_mut();
    for name in [REFRESH_COOKIE, SESSION_COOKIE] {
        headers.append(SET_COOKIE, set_cookie(name, "", Some(0), state.secure_cookies)?);
    }
    Ok(response)
}

/// Redirect to where the app now is. A location that does not route, such
/// as an unknown path, falls back to the list.
fn redirect_to_location(app: &mut App) -> Response {
    let target = Route::parse(app.machine().location()).unwrap_or(Route::List);
    Redirect::to(&target.path()).into_response()
}

pub async fn create_snippet(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Form(form): Form<SnippetForm>,
) -> Result<Response, WebError> {
    submit(&state, &session, "/create".to_string(), form).await
}

pub async fn update_snippet(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Path(id): Path<String>,
    Form(form): Form<SnippetForm>,
) -> Result<Response, WebError> {
    submit(&state, &session, format!("/edit/{id}"), form).await
}

/// Open the editor at `path`, replace its form and submit it.
async fn submit(
    state: &AppState,
    session: &BrowserSession,
    path: String,
    form: SnippetForm,
) -> Result<Response, WebError> {
    let mut app = session.app.lock().await;
    let screen = app.open(&path).await;
    let Screen::Editor(mut editor) = screen else {
        return respond(state, app.status(), screen, &ListQuery::default());
    };
    let Some(identity) = app.identity() else {
        return Ok(Redirect::to("/auth").into_response());
    };

    editor.set_form(form);
    match editor.submit(app.store(), &identity).await {
        SubmitOutcome::Saved { next, .. } => Ok(Redirect::to(&next.path()).into_response()),
        SubmitOutcome::Rejected { missing } => {
            editor_page(state, app.status(), &editor, &missing, false)
        }
        SubmitOutcome::Failed => editor_page(state, app.status(), &editor, &[], true),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub from: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub from: String,
    /// `yes` confirms; anything else declines.
    #[serde(default)]
    pub confirm: String,
}

/// Which view a delete was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteOrigin {
    List,
    Detail,
}

impl DeleteOrigin {
    fn parse(from: &str) -> Self {
        if from == "list" {
            DeleteOrigin::List
        } else {
            DeleteOrigin::Detail
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            DeleteOrigin::List => "list",
            DeleteOrigin::Detail => "detail",
        }
    }

    fn back(self, id: &str) -> String {
        match self {
            DeleteOrigin::List => "/".to_string(),
            DeleteOrigin::Detail => format!("/snippet/{id}"),
        }
    }
}

/// The delete confirmation prompt.
pub async fn confirm_delete(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, WebError> {
    let mut app = session.app.lock().await;
    let origin = DeleteOrigin::parse(&query.from);
    let screen = app.open(&format!("/snippet/{id}")).await;
    match screen {
        Screen::Detail(detail) => {
            confirm_page(&state, app.status(), &detail, origin.as_str(), DELETE_PROMPT)
        }
        screen => respond(&state, app.status(), screen, &ListQuery::default()),
    }
}

pub async fn delete_snippet(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, WebError> {
    if !is_snippet_id(&id) {
        let mut app = session.app.lock().await;
        let screen = app.open(&format!("/snippet/{id}")).await;
        return respond(&state, app.status(), screen, &ListQuery::default());
    }

    let origin = DeleteOrigin::parse(&form.from);
    let confirmation = if form.confirm == "yes" {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    };
    if confirmation == Confirmation::Declined {
        return Ok(Redirect::to(&origin.back(&id)).into_response());
    }

    let mut app = session.app.lock().await;
    let screen = match origin {
        DeleteOrigin::List => app.open("/").await,
        DeleteOrigin::Detail => app.open(&format!("/snippet/{id}")).await,
    };
    match (origin, screen) {
        (DeleteOrigin::List, Screen::List(mut list)) => {
            list.delete(app.store(), &id, confirmation).await;
            Ok(Redirect::to("/").into_response())
        }
        (DeleteOrigin::Detail, Screen::Detail(detail)) => {
            let target = detail
                .delete(app.store(), confirmation)
                .await
                .map(|route| route.path())
                .unwrap_or_else(|| origin.back(&id));
            Ok(Redirect::to(&target).into_response())
        }
        (_, screen) => respond(&state, app.status(), screen, &ListQuery::default()),
    }
}
