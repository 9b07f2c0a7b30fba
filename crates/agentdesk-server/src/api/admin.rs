//! Admin endpoints. Everything except the health probe requires the
//! `X-Admin-Token` header to match the configured admin token.

use axum::{
    body::Bytes,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use agentdesk_core::error::ServerError;
use agentdesk_core::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/reload-secrets", post(reload_secrets))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
        .route("/api/v1/admin/health", get(admin_health))
}

async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.settings.admin_token.as_str();
    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if expected.is_empty() || provided != Some(expected) {
        tracing::warn!("[Admin] Rejected request to {}", request.uri().path());
        return ServerError::Forbidden("Invalid admin token".to_string()).into_response();
    }
    next.run(request).await
}

async fn admin_health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "agentdesk-admin" }))
}

#[derive(Debug, Default, Deserialize)]
struct ReloadRequest {
    project: Option<String>,
}

/// POST /api/v1/admin/reload-secrets — Drop cached secrets (one project or all).
async fn reload_secrets(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ServerError> {
    let request: ReloadRequest = if body.is_empty() {
        ReloadRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServerError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    let project = request.project.filter(|p| !p.is_empty());

    state.secrets.clear_cache(project.as_deref());

    let message = match &project {
        Some(project) => format!("Cache cleared for project: {}", project),
        None => "All cache cleared".to_string(),
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
