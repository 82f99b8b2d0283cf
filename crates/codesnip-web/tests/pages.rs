//! End-to-end tests for the browser surface.
//!
//! Each test builds the router over an in-memory store and local accounts
//! and drives it with `tower::ServiceExt::oneshot`, carrying cookies
//! between requests the way a browser would.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use codesnip_auth::error::AuthError;
use codesnip_auth::memory::MemoryAccounts;
use codesnip_auth::session::{
    BoxFuture, Identity, SessionFactory, SessionProvider, SessionStatus, SessionWatch, SignIn,
};
use codesnip_core::collections::{SNIPPETS, field};
use codesnip_storage::memory::MemoryDocumentStore;
use codesnip_storage::store::{DocumentStore, StoredDocument};
use codesnip_web::build_router;
use codesnip_web::sessions::{BrowserSessions, SessionLimits};
use codesnip_web::state::AppState;
use serde_json::json;
use tower::ServiceExt;

const HELLO: &str = "title=Hello&description=Greets&language=Python&code=print(1)&tags=a%2C+b+%2Cc";

struct TestApp {
    router: Router,
    store: Arc<MemoryDocumentStore>,
    browsers: BrowserSessions,
}

fn accounts() -> MemoryAccounts {
    MemoryAccounts::new()
        .with_user("ada", "pw")
        .with_user("bob", "pw")
}

fn test_app() -> TestApp {
    test_app_with(Arc::new(accounts()), |state| state)
}

fn test_app_with(
    sessions: Arc<dyn SessionFactory>,
    configure: impl FnOnce(AppState) -> AppState,
) -> TestApp {
    let store = Arc::new(MemoryDocumentStore::new());
    let state = configure(AppState::new(store.clone(), sessions).expect("templates compile"));
    TestApp {
        browsers: state.browsers.clone(),
        router: build_router(state),
        store,
    }
}

/// Local accounts whose sessions cannot sign out.
struct StuckAccounts(MemoryAccounts);

impl SessionFactory for StuckAccounts {
    fn open(&self, restore: Option<String>) -> Arc<dyn SessionProvider> {
        Arc::new(StuckSession(self.0.open(restore)))
    }
}

struct StuckSession(Arc<dyn SessionProvider>);

impl SessionProvider for StuckSession {
    fn current(&self) -> SessionStatus {
        self.0.current()
    }

    fn subscribe(&self) -> SessionWatch {
        self.0.subscribe()
    }

    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<SignIn, AuthError>> {
        self.0.sign_in(username, password)
    }

    fn confirm_mfa<'a>(
        &'a self,
        username: &'a str,
        session: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Identity, AuthError>> {
        self.0.confirm_mfa(username, session, code)
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(async { Err(AuthError::SignOutFailed("provider unreachable".to_string())) })
    }

    fn remember_token(&self) -> Option<String> {
        self.0.remember_token()
    }
}

impl TestApp {
    fn browser(&self) -> Browser<'_> {
        Browser {
            app: self,
            cookies: Vec::new(),
        }
    }

    async fn snippets_of(&self, user_id: &str) -> Vec<StoredDocument> {
        self.store
            .query_by_equality(SNIPPETS, field::USER_ID, &json!(user_id))
            .await
            .unwrap()
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    fn sets_cookie(&self, name: &str) -> bool {
        self.set_cookies()
            .iter()
            .any(|v| v.starts_with(&format!("{name}=")))
    }
}

/// Cookie jar plus the router it talks to.
struct Browser<'a> {
    app: &'a TestApp,
    cookies: Vec<(String, String)>,
}

impl Browser<'_> {
    async fn send(&mut self, method: &str, path: &str, form: Option<&str>) -> Reply {
        let mut request = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(COOKIE, header);
        }
        let body = match form {
            Some(form) => {
                request = request.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        for value in headers.get_all(SET_COOKIE) {
            self.store_cookie(value.to_str().unwrap());
        }
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        Reply {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap();
        let (name, value) = pair.split_once('=').unwrap();
        self.cookies.retain(|(n, _)| n != name);
        if !set_cookie.contains("Max-Age=0") {
            self.cookies.push((name.to_string(), value.to_string()));
        }
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    async fn get(&mut self, path: &str) -> Reply {
        self.send("GET", path, None).await
    }

    async fn post(&mut self, path: &str, form: &str) -> Reply {
        self.send("POST", path, Some(form)).await
    }

    /// GET `path` until the session has resolved and the loading
    /// placeholder is gone.
    async fn settled(&mut self, path: &str) -> Reply {
        for _ in 0..50 {
            let reply = self.get(path).await;
            if !reply.body.contains("Loading...") {
                return reply;
            }
            tokio::task::yield_now().await;
        }
        panic!("{path} never left the loading page");
    }

    async fn sign_in(&mut self, username: &str) {
        let reply = self
            .post("/auth", &format!("username={username}&password=pw"))
            .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER, "{}", reply.body);
        assert_eq!(reply.location(), Some("/"));
    }
}

#[tokio::test]
async fn health_needs_no_session() {
    let app = test_app();
    let mut browser = app.browser();

    let reply = browser.get("/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.sets_cookie("codesnip_sid"));
    assert_eq!(reply.headers.get(CACHE_CONTROL).unwrap(), "no-store");
    assert!(reply.body.contains("ok"));
}

#[tokio::test]
async fn anonymous_pages_redirect_to_auth() {
    let app = test_app();
    let mut browser = app.browser();

    for path in ["/", "/create", "/edit/abc", "/snippet/abc"] {
        let reply = browser.get(path).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(reply.location(), Some("/auth"), "{path}");
    }
    assert!(browser.cookie("codesnip_sid").is_some());

    let reply = browser.get("/auth").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Sign In"));
    assert!(!reply.sets_cookie("codesnip_sid"));
    assert_eq!(reply.headers.get(CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn wrong_password_stays_on_auth() {
    let app = test_app();
    let mut browser = app.browser();

    let reply = browser.post("/auth", "username=ada&password=nope").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("Sign-in failed"));
    assert!(browser.cookie("codesnip_refresh").is_none());

    assert_eq!(browser.get("/").await.location(), Some("/auth"));
}

#[tokio::test]
async fn signed_in_browser_sees_its_list() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    let token = browser.cookie("codesnip_refresh").unwrap();
    assert!(!token.contains("ada"));

    let fresh = app.browser().get("/auth").await;
    assert!(fresh.sets_cookie("codesnip_sid"));
    assert!(reply_has_no_secure_cookie(&fresh));

    let reply = browser.get("/").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("No snippets yet"));
    assert!(reply.body.contains("+ New Snippet"));

    let reply = browser.get("/auth").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/"));
}

#[tokio::test]
async fn created_snippet_is_listed_and_filterable() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;

    let reply = browser.post("/create", HELLO).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "{}", reply.body);
    assert_eq!(reply.location(), Some("/"));

    let stored = app.snippets_of("local-ada").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data["tags"], json!(["a", "b", "c"]));
    assert_eq!(stored[0].data["language"], json!("Python"));

    let list = browser.get("/").await;
    assert!(list.body.contains("Hello"));
    assert!(list.body.contains("#b"));
    assert!(list.body.contains("language-python"));

    let filtered = browser.get("/?language=Python&q=hel").await;
    assert!(filtered.body.contains("Hello"));

    let filtered = browser.get("/?q=zzz").await;
    assert!(filtered.body.contains("No snippets found"));

    let filtered = browser.get("/?language=Go").await;
    assert!(filtered.body.contains("No snippets found"));
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;

    let reply = browser
        .post("/create", "title=+&language=Go&code=x&tags=kept")
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("Please fill in: title"));
    assert!(reply.body.contains("value=\"kept\""));
    assert_eq!(app.store.len(SNIPPETS).await, 0);
}

#[tokio::test]
async fn failed_save_keeps_the_form() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;

    app.store.set_offline(true);
    let reply = browser.post("/create", HELLO).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.body.contains("could not be saved"));
    assert!(reply.body.contains("value=\"Hello\""));
}

#[tokio::test]
async fn edit_overwrites_mutable_fields() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    browser.post("/create", HELLO).await;
    let id = app.snippets_of("local-ada").await.remove(0).id;

    let form = browser.get(&format!("/edit/{id}")).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Edit Snippet"));
    assert!(form.body.contains("Update Snippet"));
    assert!(form.body.contains("value=\"a, b, c\""));

    let reply = browser
        .post(
            &format!("/edit/{id}"),
            "title=Renamed&language=Rust&code=fn+main()+{}&tags=",
        )
        .await;
    assert_eq!(reply.location(), Some("/"));

    let stored = app.snippets_of("local-ada").await.remove(0);
    assert_eq!(stored.id, id);
    assert_eq!(stored.data["title"], json!("Renamed"));
    assert_eq!(stored.data["language"], json!("Rust"));
    assert_eq!(stored.data["tags"], json!([]));
    assert_eq!(stored.data["userId"], json!("local-ada"));
}

#[tokio::test]
async fn confirmed_delete_from_detail_returns_to_list() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    browser.post("/create", HELLO).await;
    let id = app.snippets_of("local-ada").await.remove(0).id;

    let detail = browser.get(&format!("/snippet/{id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Copy Code"));
    assert!(detail.body.contains("Edit"));
    assert!(detail.body.contains("print(1)"));

    let prompt = browser
        .get(&format!("/snippet/{id}/delete?from=detail"))
        .await;
    assert!(prompt
        .body
        .contains("Are you sure you want to delete this snippet?"));

    let declined = browser
        .post(&format!("/snippet/{id}/delete"), "from=detail&confirm=no")
        .await;
    assert_eq!(declined.location(), Some(format!("/snippet/{id}").as_str()));
    assert_eq!(app.store.len(SNIPPETS).await, 1);

    let confirmed = browser
        .post(&format!("/snippet/{id}/delete"), "from=detail&confirm=yes")
        .await;
    assert_eq!(confirmed.status, StatusCode::SEE_OTHER);
    assert_eq!(confirmed.location(), Some("/"));
    assert!(app.store.get_by_id(SNIPPETS, &id).await.unwrap().is_none());

    let gone = browser.get(&format!("/snippet/{id}")).await;
    assert_eq!(gone.location(), Some("/"));
}

#[tokio::test]
async fn confirmed_delete_from_list() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    browser.post("/create", HELLO).await;
    let id = app.snippets_of("local-ada").await.remove(0).id;

    let reply = browser
        .post(&format!("/snippet/{id}/delete"), "from=list&confirm=yes")
        .await;
    assert_eq!(reply.location(), Some("/"));
    assert_eq!(app.store.len(SNIPPETS).await, 0);
}

#[tokio::test]
async fn other_users_snippets_stay_hidden() {
    let app = test_app();
    let mut bob = app.browser();
    bob.sign_in("bob").await;
    bob.post("/create", HELLO).await;
    let id = app.snippets_of("local-bob").await.remove(0).id;

    let mut ada = app.browser();
    ada.sign_in("ada").await;
    assert!(ada.get("/").await.body.contains("No snippets yet"));
    assert_eq!(ada.get(&format!("/snippet/{id}")).await.location(), Some("/"));

    ada.post(&format!("/snippet/{id}/delete"), "from=list&confirm=yes")
        .await;
    ada.post(&format!("/edit/{id}"), "title=Mine&language=Go&code=x")
        .await;
    let stored = app.snippets_of("local-bob").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data["title"], json!("Hello"));
}

#[tokio::test]
async fn markup_in_snippets_is_escaped() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    browser
        .post(
            "/create",
            "title=%3Cscript%3Ealert(1)%3C%2Fscript%3E&language=HTML&code=%3Cb%3Ehi%3C%2Fb%3E",
        )
        .await;

    let list = browser.get("/").await;
    assert!(!list.body.contains("<script>alert(1)"));
    assert!(list.body.contains("&lt;script&gt;"));
    assert!(list.body.contains("language-markup"));
    assert!(list.body.contains("&lt;b&gt;hi"));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = test_app();
    let mut browser = app.browser();
    assert_eq!(browser.get("/settings").await.status, StatusCode::NOT_FOUND);

    browser.sign_in("ada").await;
    let reply = browser.get("/snippet/a/b").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("Page not found"));
}

#[tokio::test]
async fn logout_forgets_the_sign_in() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    browser.get("/create").await;

    let token = browser.cookie("codesnip_refresh").unwrap().to_string();
    let live = app.browsers.len().await;

    let reply = browser.post("/logout", "").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/auth"));
    assert!(browser.cookie("codesnip_refresh").is_none());
    assert!(browser.cookie("codesnip_sid").is_none());
    assert_eq!(app.browsers.len().await, live - 1);

    assert_eq!(browser.get("/").await.location(), Some("/auth"));

    // The old refresh token no longer signs anyone in.
    let mut replay = app.browser();
    replay
        .cookies
        .push(("codesnip_refresh".to_string(), token));
    assert_eq!(replay.settled("/").await.location(), Some("/auth"));
}

#[tokio::test]
async fn rejected_sign_out_keeps_the_session() {
    let app = test_app_with(Arc::new(StuckAccounts(accounts())), |state| state);
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    let live = app.browsers.len().await;

    let reply = browser.post("/logout", "").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/"));
    assert!(!reply.sets_cookie("codesnip_refresh"));
    assert!(!reply.sets_cookie("codesnip_sid"));
    assert!(browser.cookie("codesnip_refresh").is_some());
    assert_eq!(app.browsers.len().await, live);

    let list = browser.get("/").await;
    assert_eq!(list.status, StatusCode::OK);
    assert!(list.body.contains("My Code Snippets"));
}

#[tokio::test]
async fn remembered_sign_in_loads_then_restores() {
    let app = test_app();
    let mut first = app.browser();
    first.sign_in("ada").await;
    let token = first.cookie("codesnip_refresh").unwrap().to_string();

    let mut browser = app.browser();
    browser
        .cookies
        .push(("codesnip_refresh".to_string(), token));

    let mut restored = false;
    for _ in 0..50 {
        let reply = browser.get("/").await;
        assert_eq!(reply.status, StatusCode::OK);
        if reply.body.contains("My Code Snippets") {
            restored = true;
            break;
        }
        assert!(reply.body.contains("Loading..."));
        tokio::task::yield_now().await;
    }
    assert!(restored);
}

#[tokio::test]
async fn made_up_refresh_cookie_signs_nobody_in() {
    let app = test_app();
    let mut browser = app.browser();
    browser
        .cookies
        .push(("codesnip_refresh".to_string(), "memory:bob".to_string()));

    let reply = browser.settled("/").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/auth"));
}

#[tokio::test]
async fn cookieless_clients_cannot_grow_sessions_past_the_cap() {
    let limits = SessionLimits {
        capacity: 5,
        ..SessionLimits::default()
    };
    let app = test_app_with(Arc::new(accounts()), |state| {
        state.with_session_limits(limits)
    });

    for _ in 0..50 {
        let mut browser = app.browser();
        assert_eq!(browser.get("/auth").await.status, StatusCode::OK);
    }
    assert_eq!(app.browsers.len().await, 5);

    // The most recent browser is still served from its own session.
    let mut browser = app.browser();
    browser.sign_in("ada").await;
    for _ in 0..3 {
        app.browser().get("/auth").await;
    }
    assert_eq!(browser.get("/").await.status, StatusCode::OK);
}

#[tokio::test]
async fn ids_that_cannot_route_are_not_found() {
    let app = test_app();
    let mut browser = app.browser();
    browser.sign_in("ada").await;

    for form in [
        "from=detail&confirm=no",
        "from=list&confirm=no",
        "from=detail&confirm=yes",
    ] {
        let reply = browser.post("/snippet/%0A/delete", form).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{form}");
    }
    let prompt = browser.get("/snippet/%0A/delete?from=detail").await;
    assert_eq!(prompt.status, StatusCode::NOT_FOUND);
    let edit = browser
        .post("/edit/%0A", "title=T&language=Go&code=x")
        .await;
    assert_eq!(edit.status, StatusCode::NOT_FOUND);

    let reply = browser.post("/logout", "").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/"));
}

#[tokio::test]
async fn secure_deployments_mark_cookies_secure() {
    let app = test_app_with(Arc::new(accounts()), |state| state.with_secure_cookies(true));
    let mut browser = app.browser();

    let reply = browser.post("/auth", "username=ada&password=pw").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let cookies = reply.set_cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|cookie| cookie.ends_with("; Secure")));
}

fn reply_has_no_secure_cookie(reply: &Reply) -> bool {
    reply.set_cookies().iter().all(|cookie| !cookie.contains("Secure"))
}
