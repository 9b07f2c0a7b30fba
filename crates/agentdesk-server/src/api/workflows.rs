use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use agentdesk_core::graph::{RegisterWorkflow, ValidationError, WorkflowError};
use agentdesk_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/workflows/register", post(register_workflow))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    workflow_name: Option<String>,
    yaml_content: Option<String>,
    #[serde(default)]
    overwrite: bool,
    directory: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct RegisterResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_errors: Option<Vec<ValidationError>>,
}

impl RegisterResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

fn error_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::AlreadyExists(_) => StatusCode::CONFLICT,
        WorkflowError::FileSystem { .. } | WorkflowError::NotFound(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// POST /api/v1/workflows/register — Validate and write a workflow file.
async fn register_workflow(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> (StatusCode, Json<RegisterResponse>) {
    let (Some(workflow_name), Some(yaml_content)) = (
        body.workflow_name.filter(|v| !v.is_empty()),
        body.yaml_content.filter(|v| !v.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(RegisterResponse::error(
                "Both workflow_name and yaml_content are required",
            )),
        );
    };

    let request = RegisterWorkflow {
        workflow_name: &workflow_name,
        yaml_content: &yaml_content,
        overwrite: body.overwrite,
        directory: body.directory.as_deref(),
    };

    match state.workflows.register(request).await {
        Ok(path) => (
            StatusCode::OK,
            Json(RegisterResponse {
                status: "success",
                file_path: Some(path.display().to_string()),
                workflow_name: Some(workflow_name),
                ..Default::default()
            }),
        ),
        Err(e) => {
            tracing::warn!("[Workflows] Registration of '{}' failed: {}", workflow_name, e);
            let details = e.validation_errors();
            let response = RegisterResponse {
                validation_errors: (!details.is_empty()).then_some(details),
                ..RegisterResponse::error(e.to_string())
            };
            (error_status(&e), Json(response))
        }
    }
}
