use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use agentdesk_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(welcome))
        .route("/api/v1/", get(api_root))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "agentdesk-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to agentdesk server" }))
}

async fn api_root() -> Json<Value> {
    Json(json!({ "version": "1.0", "service": "agentdesk-server" }))
}
