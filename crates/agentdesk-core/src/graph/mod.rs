//! Graph preparation — everything between a workflow file and the engine.
//!
//! ```text
//! <model>.yml ──► WorkflowStore ──► GraphTemplate (shared)
//!                                        │ instantiate()
//!                                        ▼
//!                                  GraphDocument (per request)
//!                                        │ resolve_placeholders
//!                                        │ inject_secrets ◄── SecretsManager
//!                                        ▼
//!                                   GraphEngine::run
//! ```

pub mod document;
pub mod engine;
pub mod inject;
pub mod loader;
pub mod placeholders;
pub mod runner;

pub use document::{GraphDocument, GraphTemplate, NodeConfig};
pub use engine::{EngineOutput, GraphEngine, NodeLog, RemoteGraphEngine};
pub use inject::{inject_secrets, InjectionOutcome, InjectionStatus};
pub use loader::{RegisterWorkflow, ValidationError, WorkflowError, WorkflowStore};
pub use runner::{ExecutionReport, GraphRunner, RunError};
