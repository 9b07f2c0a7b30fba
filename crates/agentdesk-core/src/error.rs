//! Error types for the agentdesk core.
//!
//! Each subsystem has its own `thiserror` enum so callers can match on the
//! failure kind. `ServerError` is the HTTP-facing type; when the `axum`
//! feature is enabled it implements `IntoResponse` so it can be used directly
//! as an axum handler error type.

/// Failures resolving a secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    /// Absent from both the vault and the fallback configuration.
    #[error("Secret '{key}' not found in MyVault or environment variables")]
    NotFound { key: String },

    /// Network or non-2xx failure talking to the vault.
    #[error("{message}")]
    StoreUnreachable {
        message: String,
        status: Option<u16>,
    },

    /// The vault answered 404 for a single-secret lookup.
    #[error("Secret '{key}' not found in project '{project}'")]
    MissingInStore { project: String, key: String },
}

/// Failures of the SSE stream client.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Failed to connect to {path}: {message}")]
    Connection { path: String, message: String },

    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    #[error("Error processing stream data: {0}")]
    Stream(String),
}

impl StreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of the external graph execution engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Graph engine request failed: {0}")]
    Transport(String),

    #[error("Graph engine rejected the graph: {0}")]
    Rejected(String),
}

impl EngineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout(_))
    }
}

/// Configuration load failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
