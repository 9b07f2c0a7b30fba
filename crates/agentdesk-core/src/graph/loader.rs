//! Workflow files on disk.
//!
//! Graph definitions live under the model base path as
//! `<category>/<model>.yml`. The store loads them into shareable
//! [`GraphTemplate`]s and registers new ones after validating their YAML.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::document::GraphTemplate;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid {field} parameter")]
    InvalidName { field: &'static str },

    #[error("workflow_name must contain only alphanumeric characters, underscores, and hyphens")]
    InvalidWorkflowName,

    #[error("Invalid directory parameter: \"..\" is not allowed for security reasons")]
    InvalidDirectory,

    #[error("Workflow file not found: {0}")]
    NotFound(String),

    #[error("YAML syntax validation failed")]
    Syntax(ValidationError),

    #[error("Workflow '{0}' already exists. Set overwrite=true to replace it.")]
    AlreadyExists(String),

    #[error("{context}")]
    FileSystem {
        context: String,
        source: std::io::Error,
    },
}

impl WorkflowError {
    /// Structured detail for API responses.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        match self {
            WorkflowError::Syntax(err) => vec![err.clone()],
            WorkflowError::FileSystem { context, source } => vec![ValidationError {
                kind: ValidationKind::FileSystem,
                message: format!("{}: {}", context, source),
                line: None,
                column: None,
            }],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    YamlSyntax,
    Schema,
    FileSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: ValidationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// Request to register (write) a workflow file.
#[derive(Debug, Clone)]
pub struct RegisterWorkflow<'a> {
    pub workflow_name: &'a str,
    pub yaml_content: &'a str,
    pub overwrite: bool,
    pub directory: Option<&'a str>,
}

fn workflow_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("workflow name pattern is valid"))
}

fn is_safe_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains("..") && !value.contains('/') && !value.contains('\\')
}

pub struct WorkflowStore {
    base_dir: PathBuf,
}

impl WorkflowStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Model name for a `/{category}/{model}` request, after path validation.
    pub fn model_name(category: &str, model: &str) -> Result<String, WorkflowError> {
        if !is_safe_segment(category) {
            return Err(WorkflowError::InvalidName { field: "category" });
        }
        if !is_safe_segment(model) {
            return Err(WorkflowError::InvalidName { field: "model" });
        }
        Ok(format!("{}/{}", category, model))
    }

    /// Path of `<model_name>.yml`. Rejects traversal outside the base dir.
    pub fn path_for(&self, model_name: &str) -> Result<PathBuf, WorkflowError> {
        let valid = !model_name.is_empty()
            && !model_name.contains('\\')
            && model_name
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "..");
        if !valid {
            return Err(WorkflowError::InvalidName { field: "model_name" });
        }
        Ok(self.base_dir.join(format!("{}.yml", model_name)))
    }

    pub async fn load(&self, model_name: &str) -> Result<GraphTemplate, WorkflowError> {
        let path = self.path_for(model_name)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkflowError::NotFound(path.display().to_string()));
            }
            Err(source) => {
                return Err(WorkflowError::FileSystem {
                    context: format!("Failed to read workflow file '{}'", path.display()),
                    source,
                });
            }
        };

        tracing::debug!("[Workflows] Loaded {}", path.display());
        GraphTemplate::from_yaml(&content).map_err(|e| WorkflowError::Syntax(syntax_error(&e)))
    }

    /// Validate and write a workflow file. Returns the written path.
    pub async fn register(&self, request: RegisterWorkflow<'_>) -> Result<PathBuf, WorkflowError> {
        if let Some(dir) = request.directory {
            if dir.contains("..") {
                return Err(WorkflowError::InvalidDirectory);
            }
        }
        if !workflow_name_re().is_match(request.workflow_name) {
            return Err(WorkflowError::InvalidWorkflowName);
        }

        serde_yaml::from_str::<serde_yaml::Value>(request.yaml_content)
            .map_err(|e| WorkflowError::Syntax(syntax_error(&e)))?;

        let target_dir = match request.directory.filter(|d| !d.is_empty()) {
            Some(dir) => self.base_dir.join(dir.trim_start_matches('/')),
            None => self.base_dir.clone(),
        };

        if !tokio::fs::try_exists(&target_dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&target_dir)
                .await
                .map_err(|source| WorkflowError::FileSystem {
                    context: "Failed to create workflow directory".to_string(),
                    source,
                })?;
            tracing::info!("[Workflows] Created workflow directory: {}", target_dir.display());
        }

        let file_path = target_dir.join(format!("{}.yml", request.workflow_name));
        if !request.overwrite && tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
            return Err(WorkflowError::AlreadyExists(request.workflow_name.to_string()));
        }

        tokio::fs::write(&file_path, request.yaml_content)
            .await
            .map_err(|source| WorkflowError::FileSystem {
                context: "Failed to write workflow file".to_string(),
                source,
            })?;

        tracing::info!("[Workflows] Workflow registered: {}", file_path.display());
        Ok(file_path)
    }
}

fn syntax_error(err: &serde_yaml::Error) -> ValidationError {
    let location = err.location();
    ValidationError {
        kind: ValidationKind::YamlSyntax,
        message: err.to_string(),
        line: location.as_ref().map(|l| l.line()),
        column: location.as_ref().map(|l| l.column()),
    }
}
