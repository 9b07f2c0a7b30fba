//! VaultClient and SecretsManager against a local HTTP vault.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agentdesk_core::config::{SecretFallbacks, SecretsConfig};
use agentdesk_core::error::SecretError;
use agentdesk_core::secrets::{SecretStore, SecretsManager, VaultClient};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

#[derive(Default)]
struct Vault {
    hits: AtomicUsize,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-service").and_then(|v| v.to_str().ok()) == Some("graphaiserver-service")
        && headers.get("x-token").and_then(|v| v.to_str().ok()) == Some("tok")
}

async fn secret(
    State(vault): State<Arc<Vault>>,
    headers: HeaderMap,
    Path((project, key)): Path<(String, String)>,
) -> impl IntoResponse {
    vault.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad token"})));
    }
    match (project.as_str(), key.as_str()) {
        ("proj", "OPENAI_API_KEY") => (StatusCode::OK, Json(json!({"value": "sk-vault"}))),
        ("broken", _) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "missing"}))),
    }
}

async fn secrets(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    match query.get("project").map(String::as_str) {
        Some("proj") => Json(json!([
            {"key": "OPENAI_API_KEY", "value": "sk-vault"},
            {"key": "GROQ_API_KEY", "value": "gsk-vault"}
        ])),
        _ => Json(json!([])),
    }
}

async fn default_project() -> Json<serde_json::Value> {
    Json(json!({"name": "proj"}))
}

async fn spawn_vault() -> (String, Arc<Vault>) {
    let vault = Arc::new(Vault::default());
    let app = Router::new()
        .route("/api/secrets/{project}/{key}", get(secret))
        .route("/api/secrets", get(secrets))
        .route("/projects/default", get(default_project))
        .with_state(vault.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), vault)
}

#[tokio::test]
async fn test_get_secret_sends_identity_headers() {
    let (base, _) = spawn_vault().await;
    let client = VaultClient::new(&base, "graphaiserver-service", "tok").unwrap();
    assert_eq!(client.get_secret("proj", "OPENAI_API_KEY").await.unwrap(), "sk-vault");

    let wrong = VaultClient::new(&base, "graphaiserver-service", "nope").unwrap();
    let err = wrong.get_secret("proj", "OPENAI_API_KEY").await.unwrap_err();
    assert_eq!(
        err,
        SecretError::StoreUnreachable {
            message: "Failed to get secret 'OPENAI_API_KEY': HTTP 401".to_string(),
            status: Some(401),
        }
    );
}

#[tokio::test]
async fn test_get_secret_status_mapping() {
    let (base, _) = spawn_vault().await;
    let client = VaultClient::new(&base, "graphaiserver-service", "tok").unwrap();

    let err = client.get_secret("proj", "GROQ_API_KEY").await.unwrap_err();
    assert_eq!(err.to_string(), "Secret 'GROQ_API_KEY' not found in project 'proj'");

    let err = client.get_secret("broken", "OPENAI_API_KEY").await.unwrap_err();
    assert!(matches!(err, SecretError::StoreUnreachable { status: Some(500), .. }));
}

#[tokio::test]
async fn test_bulk_and_default_project() {
    let (base, _) = spawn_vault().await;
    let client = VaultClient::new(&base, "graphaiserver-service", "tok").unwrap();

    let all = client.get_secrets("proj").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["GROQ_API_KEY"], "gsk-vault");
    assert_eq!(client.get_default_project().await.unwrap(), "proj");
}

#[tokio::test]
async fn test_unreachable_vault_uses_fallback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SecretsConfig {
        vault_enabled: true,
        vault_base_url: format!("http://{}", addr),
        service_token: "tok".to_string(),
        default_project: Some("proj".to_string()),
        fallbacks: SecretFallbacks::from_lookup(|name| {
            (name == "OPENAI_API_KEY").then(|| "sk-env".to_string())
        }),
        ..SecretsConfig::default()
    };
    let manager = SecretsManager::from_config(&config);
    assert!(manager.vault_enabled());
    assert_eq!(manager.get_secret("OPENAI_API_KEY", None).await.unwrap(), "sk-env");
    assert!(matches!(
        manager.get_secret("GROQ_API_KEY", None).await,
        Err(SecretError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_manager_caches_vault_values() {
    let (base, vault) = spawn_vault().await;
    let config = SecretsConfig {
        vault_enabled: true,
        vault_base_url: base,
        service_token: "tok".to_string(),
        ..SecretsConfig::default()
    };
    let manager = SecretsManager::from_config(&config);

    assert_eq!(manager.default_project().await, "proj");
    assert_eq!(manager.get_secret("OPENAI_API_KEY", None).await.unwrap(), "sk-vault");
    assert_eq!(manager.get_secret("OPENAI_API_KEY", None).await.unwrap(), "sk-vault");
    assert_eq!(vault.hits.load(Ordering::SeqCst), 1);

    manager.clear_cache(Some("proj"));
    manager.get_secret("OPENAI_API_KEY", None).await.unwrap();
    assert_eq!(vault.hits.load(Ordering::SeqCst), 2);
}
