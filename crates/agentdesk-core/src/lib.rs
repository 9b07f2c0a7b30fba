//! agentdesk core — transport-agnostic logic for the agent desk services.
//!
//! - [`secrets`]: vault-backed secret resolution with a TTL cache and
//!   environment fallbacks
//! - [`graph`]: per-request graph documents, placeholder resolution, secret
//!   injection and the engine boundary
//! - [`stream`] / [`chat`]: SSE chat streaming against the agent API
//!
//! It has **no HTTP framework dependency** by default and is shared by
//! `agentdesk-server` and the `agentdesk` CLI.
//!
//! # Feature Flags
//!
//! - `axum` — Enables `IntoResponse` impl on `ServerError` for use in axum handlers.

pub mod chat;
pub mod config;
pub mod error;
pub mod graph;
pub mod secrets;
pub mod state;
pub mod stream;

// Convenience re-exports
pub use config::Settings;
pub use error::ServerError;
pub use secrets::SecretsManager;
pub use state::{AppState, AppStateInner};
