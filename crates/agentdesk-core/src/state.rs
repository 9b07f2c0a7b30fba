//! Shared application state for the HTTP adapter and the CLI.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::EngineError;
use crate::graph::{GraphEngine, GraphRunner, RemoteGraphEngine, WorkflowStore};
use crate::secrets::SecretsManager;

/// Shared state accessible by all API handlers.
pub struct AppStateInner {
    pub settings: Settings,
    pub secrets: Arc<SecretsManager>,
    pub workflows: Arc<WorkflowStore>,
    pub runner: GraphRunner,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    /// Wire everything from settings, talking to the remote graph engine.
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        let engine = Arc::new(RemoteGraphEngine::new(&settings.engine_url)?);
        Ok(Self::with_engine(settings, engine))
    }

    pub fn with_engine(settings: Settings, engine: Arc<dyn GraphEngine>) -> Self {
        let secrets = Arc::new(SecretsManager::from_config(&settings.secrets));
        Self::with_parts(settings, secrets, engine)
    }

    pub fn with_parts(
        settings: Settings,
        secrets: Arc<SecretsManager>,
        engine: Arc<dyn GraphEngine>,
    ) -> Self {
        let workflows = Arc::new(WorkflowStore::new(&settings.model_base_path));
        let runner = GraphRunner::new(
            workflows.clone(),
            secrets.clone(),
            settings.base_urls.clone(),
            engine,
        );
        Self {
            settings,
            secrets,
            workflows,
            runner,
        }
    }
}
