use axum::Extension;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use codesnip_app::app::Screen;
use codesnip_app::views::detail::SnippetDetail;
use codesnip_app::views::editor::{EditorMode, SnippetEditor};
use codesnip_app::views::list::{EmptyState, SnippetList};
use codesnip_auth::session::SessionStatus;
use codesnip_core::models::language::Language;
use codesnip_core::models::snippet::Snippet;
use serde::{Deserialize, Serialize};

use crate::error::WebError;
use crate::highlight::highlight;
use crate::middleware::session::BrowserSession;
use crate::render::page_context;
use crate::state::AppState;

/// List filters carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub language: String,
}

impl ListQuery {
    fn apply(&self, list: &mut SnippetList) {
        list.set_search(self.q.trim());
        let language = self.language.trim();
        let language = (!language.is_empty()).then(|| Language::from_stored(language.to_string()));
        list.set_language(language);
    }
}

/// What a snippet looks like to the templates.
#[derive(Debug, Serialize)]
struct SnippetView<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    language: &'a str,
    tags: &'a [String],
    code: &'a str,
    code_html: String,
    created_at: String,
    updated_at: String,
}

impl<'a> SnippetView<'a> {
    fn new(snippet: &'a Snippet) -> Self {
        Self {
            id: &snippet.id,
            title: &snippet.title,
            description: &snippet.description,
            language: snippet.language.label(),
            tags: &snippet.tags,
            code: &snippet.code,
            code_html: highlight(&snippet.language, &snippet.code),
            created_at: snippet.created_at.strftime("%Y-%m-%d %H:%M UTC").to_string(),
            updated_at: snippet.updated_at.strftime("%Y-%m-%d").to_string(),
        }
    }
}

/// Every GET page, plus anything no other route matched.
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<BrowserSession>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, WebError> {
    let mut app = session.app.lock().await;
    let screen = app.open(uri.path()).await;
    respond(&state, app.status(), screen, &query)
}

/// Turn a screen into a response.
pub(crate) fn respond(
    state: &AppState,
    status: &SessionStatus,
    screen: Screen,
    query: &ListQuery,
) -> Result<Response, WebError> {
    match screen {
        Screen::Loading => {
            state
                .templates
                .page(StatusCode::OK, "loading.html", &page_context(status))
        }
        Screen::Redirect(route) => Ok(Redirect::to(&route.path()).into_response()),
        Screen::Auth => auth_page(state, status, &AuthPage::default(), StatusCode::OK),
        Screen::List(mut list) => {
            query.apply(&mut list);
            list_page(state, status, &list, query)
        }
        Screen::Editor(editor) => editor_page(state, status, &editor, &[], false),
        Screen::Detail(detail) => detail_page(state, status, &detail),
        Screen::DetailUnavailable => {
            state
                .templates
                .page(StatusCode::OK, "unavailable.html", &page_context(status))
        }
        Screen::NotFound => {
            state
                .templates
                .page(StatusCode::NOT_FOUND, "not_found.html", &page_context(status))
        }
    }
}

/// Sign-in form state. `challenge` is set during the MFA step.
#[derive(Debug, Default)]
pub(crate) struct AuthPage<'a> {
    pub username: &'a str,
    pub challenge: Option<&'a str>,
    pub error: Option<&'a str>,
}

pub(crate) fn auth_page(
    state: &AppState,
    status: &SessionStatus,
    page: &AuthPage<'_>,
    code: StatusCode,
) -> Result<Response, WebError> {
    let mut context = page_context(status);
    context.insert("username", page.username);
    context.insert("challenge", &page.challenge);
    context.insert("error", &page.error);
    state.templates.page(code, "auth.html", &context)
}

fn list_page(
    state: &AppState,
    status: &SessionStatus,
    list: &SnippetList,
    query: &ListQuery,
) -> Result<Response, WebError> {
    let snippets: Vec<SnippetView<'_>> = list.visible().into_iter().map(SnippetView::new).collect();
    let languages: Vec<String> = list
        .languages()
        .iter()
        .map(|language| language.label().to_string())
        .collect();
    let empty = list.empty_state().map(|empty| match empty {
        EmptyState::NoSnippets => "no_snippets",
        EmptyState::NoMatches => "no_matches",
    });

    let mut context = page_context(status);
    context.insert("snippets", &snippets);
    context.insert("languages", &languages);
    context.insert("search", query.q.trim());
    context.insert("selected_language", query.language.trim());
    context.insert("empty", &empty);
    state.templates.page(StatusCode::OK, "list.html", &context)
}

pub(crate) fn editor_page(
    state: &AppState,
    status: &SessionStatus,
    editor: &SnippetEditor,
    missing: &[&str],
    failed: bool,
) -> Result<Response, WebError> {
    let action = match editor.mode() {
        EditorMode::Create => "/create".to_string(),
        EditorMode::Edit { id } => format!("/edit/{id}"),
    };
    let mut languages: Vec<String> = Language::ALL
        .iter()
        .map(|language| language.label().to_string())
        .collect();
    let current = &editor.form().language;
    if !current.is_empty() && !languages.contains(current) {
        languages.push(current.clone());
    }

    let mut context = page_context(status);
    context.insert("heading", editor.heading());
    context.insert("submit_label", editor.submit_label());
    context.insert("action", &action);
    context.insert("form", editor.form());
    context.insert("languages", &languages);
    context.insert("missing", missing);
    context.insert("failed", &failed);

    let code = if failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else if !missing.is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    state.templates.page(code, "editor.html", &context)
}

fn detail_page(
    state: &AppState,
    status: &SessionStatus,
    detail: &SnippetDetail,
) -> Result<Response, WebError> {
    let mut context = page_context(status);
    context.insert("snippet", &SnippetView::new(detail.snippet()));
    context.insert("edit_path", &detail.edit_route().path());
    state.templates.page(StatusCode::OK, "detail.html", &context)
}

pub(crate) fn confirm_page(
    state: &AppState,
    status: &SessionStatus,
    detail: &SnippetDetail,
    from: &str,
    prompt: &str,
) -> Result<Response, WebError> {
    let snippet = detail.snippet();
    let mut context = page_context(status);
    context.insert("id", &snippet.id);
    context.insert("title", &snippet.title);
    context.insert("from", from);
    context.insert("prompt", prompt);
    state.templates.page(StatusCode::OK, "confirm_delete.html", &context)
}
