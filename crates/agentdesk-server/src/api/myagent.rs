//! Graph execution endpoints.
//!
//! A run that produced a report answers with the report itself: 200 when
//! clean, 500 when any node errored or timed out. A run that failed before
//! the engine reported answers 500 with an `{ error, details }` body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use agentdesk_core::error::ServerError;
use agentdesk_core::graph::{RunError, WorkflowError, WorkflowStore};
use agentdesk_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/myagent", post(run_legacy))
        .route("/api/v1/myagent/{category}/{model}", post(run_model))
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    user_input: Option<String>,
    model_name: Option<String>,
    project: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("{} is required", field)))
}

/// POST /api/v1/myagent/{category}/{model}
async fn run_model(
    State(state): State<AppState>,
    Path((category, model)): Path<(String, String)>,
    Json(body): Json<RunRequest>,
) -> Result<Response, ServerError> {
    let user_input = required(body.user_input, "user_input")?;
    let model_name = WorkflowStore::model_name(&category, &model)
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    Ok(execute(&state, &model_name, &user_input, body.project.as_deref()).await)
}

/// POST /api/v1/myagent — legacy form with `model_name` in the body.
async fn run_legacy(
    State(state): State<AppState>,
    Json(body): Json<RunRequest>,
) -> Result<Response, ServerError> {
    let user_input = required(body.user_input, "user_input")?;
    let model_name = required(body.model_name, "model_name")?;

    Ok(execute(&state, &model_name, &user_input, body.project.as_deref()).await)
}

async fn execute(
    state: &AppState,
    model_name: &str,
    user_input: &str,
    project: Option<&str>,
) -> Response {
    match state.runner.run(model_name, user_input, project).await {
        Ok(report) => {
            let status = if report.has_failures() {
                tracing::warn!("[MyAgent] '{}' finished with failures", model_name);
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(RunError::Workflow(e @ WorkflowError::InvalidName { .. })) => {
            ServerError::BadRequest(e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("[MyAgent] Error executing '{}': {}", model_name, e);
            let kind = if e.is_timeout() {
                "timeout"
            } else {
                "initialization_error"
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "An error occurred while executing the graph.",
                    "details": {
                        "message": e.to_string(),
                        "type": kind,
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    },
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use agentdesk_core::error::EngineError;
    use agentdesk_core::graph::{EngineOutput, GraphDocument, GraphEngine};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::{app, post_json, send, state};

    #[derive(Default)]
    pub(crate) struct StubEngine {
        pub graphs: Mutex<Vec<Value>>,
        pub output: EngineOutput,
        pub timeout: bool,
    }

    #[async_trait]
    impl GraphEngine for StubEngine {
        async fn run(
            &self,
            graph: GraphDocument,
            _input: Value,
        ) -> Result<EngineOutput, EngineError> {
            self.graphs.lock().unwrap().push(graph.to_json());
            if self.timeout {
                return Err(EngineError::Timeout("graph exceeded 300s".to_string()));
            }
            Ok(self.output.clone())
        }
    }

    const FLOW: &str = "nodes:\n  source: {}\n  llm:\n    agent: openAIAgent\n    inputs:\n      prompt: \":source\"\n";

    fn workflow_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("demo")).unwrap();
        std::fs::write(dir.path().join("demo/flow.yml"), FLOW).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_run_by_category_and_model() {
        let dir = workflow_dir();
        let engine = Arc::new(StubEngine::default());
        let app = app(state(dir.path(), "", engine.clone()));

        let (status, body) = send(
            app,
            post_json("/api/v1/myagent/demo/flow", json!({ "user_input": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["injections"][0]["node_id"], "llm");
        assert_eq!(body["injections"][0]["status"], "injected");

        let graphs = engine.graphs.lock().unwrap();
        assert_eq!(graphs[0]["nodes"]["llm"]["params"]["apiKey"], "sk-env");
        assert_eq!(graphs[0]["nodes"]["source"]["value"], "hi");
    }

    #[tokio::test]
    async fn test_node_errors_return_500_with_report() {
        let dir = workflow_dir();
        let mut output = EngineOutput::default();
        output.errors.insert("llm".to_string(), json!("rate limited"));
        let engine = Arc::new(StubEngine {
            output,
            ..Default::default()
        });
        let app = app(state(dir.path(), "", engine));

        let (status, body) = send(
            app,
            post_json("/api/v1/myagent/demo/flow", json!({ "user_input": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"]["llm"], "rate limited");
    }

    #[tokio::test]
    async fn test_timeout_details() {
        let dir = workflow_dir();
        let engine = Arc::new(StubEngine {
            timeout: true,
            ..Default::default()
        });
        let app = app(state(dir.path(), "", engine));

        let (status, body) = send(
            app,
            post_json("/api/v1/myagent", json!({ "user_input": "hi", "model_name": "demo/flow" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"]["type"], "timeout");
        assert!(body["details"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_missing_workflow_is_initialization_error() {
        let dir = workflow_dir();
        let app = app(state(dir.path(), "", Arc::new(StubEngine::default())));

        let (status, body) = send(
            app,
            post_json("/api/v1/myagent/demo/absent", json!({ "user_input": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"]["type"], "initialization_error");
    }

    #[tokio::test]
    async fn test_request_validation() {
        let dir = workflow_dir();
        let app = app(state(dir.path(), "", Arc::new(StubEngine::default())));

        let (status, body) = send(
            app.clone(),
            post_json("/api/v1/myagent/demo/flow", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "user_input is required");

        let (status, body) = send(
            app.clone(),
            post_json("/api/v1/myagent", json!({ "user_input": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "model_name is required");

        let (status, body) = send(
            app.clone(),
            post_json("/api/v1/myagent/a..b/flow", json!({ "user_input": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid category parameter");

        let (status, _) = send(
            app,
            post_json("/api/v1/myagent", json!({ "user_input": "hi", "model_name": "../etc" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
