//! Browser surface for the snippet manager: server-rendered pages over the
//! headless [`codesnip_app::app::App`], one per browser session.

pub mod config;
pub mod error;
pub mod highlight;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod sessions;
pub mod state;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::set_header::SetResponseHeaderLayer;

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(routes::pages::show),
        )
        .route(
            "/auth",
            get(routes::pages::show).post(routes::actions::sign_in),
        )
        .route("/logout", post(routes::actions::sign_out))
        .route(
            "/create",
            get(routes::pages::show).post(routes::actions::create_snippet),
        )
        .route(
            "/edit/{id}",
            get(routes::pages::show).post(routes::actions::update_snippet),
        )
        .route("/snippet/{id}", get(routes::pages::show))
        .route(
            "/snippet/{id}/delete",
            get(routes::actions::confirm_delete).post(routes::actions::delete_snippet),
        )
        .fallback(routes::pages::show)
        // Everything above runs inside a browser session.
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::session::attach_session,
        ))
        .route("/health", get(routes::health::health_check))
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
