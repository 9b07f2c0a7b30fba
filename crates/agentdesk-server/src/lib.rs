//! agentdesk server - HTTP front for graph workflows
//!
//! An axum adapter over `agentdesk-core`, providing:
//! - graph execution (`/api/v1/myagent/...`) with per-request secret injection
//! - workflow registration (`/api/v1/workflows/register`)
//! - admin endpoints for the secrets cache (`/api/v1/admin/...`)
//!
//! This crate can be used standalone or embedded (the `agentdesk` CLI starts
//! it through [`start_server`]).

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agentdesk_core::config::Settings;
use agentdesk_core::state::{AppState, AppStateInner};

/// Configuration for the HTTP server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub settings: Settings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            host: settings.host.clone(),
            port: settings.port,
            settings,
        }
    }
}

impl From<Settings> for ServerConfig {
    fn from(settings: Settings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            settings,
        }
    }
}

/// Create a shared `AppState` from settings.
pub fn create_app_state(settings: Settings) -> Result<AppState, String> {
    let inner = AppStateInner::new(settings)
        .map_err(|e| format!("Failed to initialize application state: {}", e))?;
    let state: AppState = Arc::new(inner);

    tracing::info!(
        "[Server] Workflows from '{}', vault {}",
        state.workflows.base_dir().display(),
        if state.secrets.vault_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(state)
}

/// Build the router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server. Returns the actual address it is listening on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    tracing::info!(
        "Starting agentdesk server on {}:{}",
        config.host,
        config.port
    );

    let host = config.host.clone();
    let port = config.port;
    let state = create_app_state(config.settings)?;

    start_server_with_state(&host, port, state).await
}

/// Start the HTTP server with a pre-built `AppState`.
pub async fn start_server_with_state(
    host: &str,
    port: u16,
    state: AppState,
) -> Result<SocketAddr, String> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("agentdesk server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}
