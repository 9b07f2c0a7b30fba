pub mod admin;
pub mod health;
pub mod myagent;
pub mod workflows;

use axum::Router;

use agentdesk_core::state::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(myagent::router())
        .merge(workflows::router())
        .merge(admin::router(state))
}
