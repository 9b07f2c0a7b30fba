//! Graph runner — prepares a per-request document and hands it to the engine.
//!
//! 1. Load the template for `model_name`
//! 2. Instantiate an owned document
//! 3. Resolve `${...}` base-URL placeholders
//! 4. Inject provider secrets
//! 5. Set the user input as the `source` node's value
//! 6. Run the engine and collapse the log to each node's final state

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::engine::{EngineOutput, GraphEngine};
use super::inject::{inject_secrets, InjectionOutcome};
use super::loader::{WorkflowError, WorkflowStore};
use super::placeholders::resolve_placeholders;
use crate::config::BaseUrls;
use crate::error::EngineError;
use crate::secrets::SecretsManager;

/// Node receiving the caller's input.
pub const SOURCE_NODE: &str = "source";

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RunError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::Engine(e) if e.is_timeout())
    }
}

/// Engine output plus what the injection pass did.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    #[serde(flatten)]
    pub output: EngineOutput,
    pub injections: Vec<InjectionOutcome>,
}

impl ExecutionReport {
    pub fn has_failures(&self) -> bool {
        self.output.has_failures()
    }
}

pub struct GraphRunner {
    workflows: Arc<WorkflowStore>,
    secrets: Arc<SecretsManager>,
    base_urls: BaseUrls,
    engine: Arc<dyn GraphEngine>,
}

impl GraphRunner {
    pub fn new(
        workflows: Arc<WorkflowStore>,
        secrets: Arc<SecretsManager>,
        base_urls: BaseUrls,
        engine: Arc<dyn GraphEngine>,
    ) -> Self {
        Self {
            workflows,
            secrets,
            base_urls,
            engine,
        }
    }

    pub async fn run(
        &self,
        model_name: &str,
        user_input: &str,
        project: Option<&str>,
    ) -> Result<ExecutionReport, RunError> {
        let template = self.workflows.load(model_name).await?;
        let mut doc = template.instantiate();

        let resolved = resolve_placeholders(&mut doc, &self.base_urls);
        let injections = inject_secrets(&self.secrets, &mut doc, project).await;
        doc.inject_value(SOURCE_NODE, Value::String(user_input.to_string()));

        tracing::info!(
            "[Runner] Executing '{}' ({} nodes, {} placeholder(s), {} secret(s) injected)",
            model_name,
            template.node_count(),
            resolved,
            injections.iter().filter(|i| i.is_injected()).count()
        );

        let output = self
            .engine
            .run(doc, Value::String(user_input.to_string()))
            .await?
            .dedup_logs();

        Ok(ExecutionReport { output, injections })
    }
}
