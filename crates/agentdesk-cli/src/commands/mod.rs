//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses
//! the agentdesk-core domain logic through `AppState`.

pub mod chat;
pub mod job;
pub mod secrets;
pub mod server;
pub mod workflow;

use std::sync::Arc;

use agentdesk_core::config::Settings;
use agentdesk_core::state::{AppState, AppStateInner};

/// Load settings from `.env` and the environment.
pub fn load_settings() -> Result<Settings, String> {
    Settings::from_env().map_err(|e| format!("Failed to load configuration: {}", e))
}

/// Initialize a shared `AppState` from settings.
///
/// This mirrors `agentdesk_server::create_app_state` without logging the
/// server banner.
pub fn init_state(settings: Settings) -> Result<AppState, String> {
    AppStateInner::new(settings)
        .map(Arc::new)
        .map_err(|e| format!("Failed to initialize: {}", e))
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
