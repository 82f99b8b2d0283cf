use axum::Json;
use serde_json::{Value, json};

/// Liveness check; needs no browser session.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
