//! Secret injection pass.
//!
//! Nodes whose agent needs a provider API key get it set under
//! `params.apiKey`. A failed lookup is recorded and logged but never stops
//! the pass: agents can still resolve credentials from their own environment.

use serde::Serialize;
use serde_json::Value;

use super::document::GraphDocument;
use crate::secrets::SecretsManager;

/// Parameter the resolved key is written to.
pub const API_KEY_PARAM: &str = "apiKey";

/// Agent name → secret key it needs.
pub const AGENT_SECRET_KEYS: &[(&str, &str)] = &[
    ("openAIAgent", "OPENAI_API_KEY"),
    ("anthropicAgent", "ANTHROPIC_API_KEY"),
    ("geminiAgent", "GOOGLE_API_KEY"),
    ("groqAgent", "GROQ_API_KEY"),
];

pub fn secret_key_for_agent(agent: &str) -> Option<&'static str> {
    AGENT_SECRET_KEYS
        .iter()
        .find(|(name, _)| *name == agent)
        .map(|(_, key)| *key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InjectionStatus {
    Injected,
    Skipped { reason: String },
}

/// What happened to one recognised node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionOutcome {
    pub node_id: String,
    pub agent: String,
    pub secret_key: String,
    #[serde(flatten)]
    pub status: InjectionStatus,
}

impl InjectionOutcome {
    pub fn is_injected(&self) -> bool {
        self.status == InjectionStatus::Injected
    }
}

/// Inject provider keys into every recognised node of `doc`.
///
/// Takes the per-request document mutably; templates are never touched.
pub async fn inject_secrets(
    secrets: &SecretsManager,
    doc: &mut GraphDocument,
    project: Option<&str>,
) -> Vec<InjectionOutcome> {
    let mut outcomes = Vec::new();

    for (node_id, node) in doc.nodes_mut() {
        let Some(agent) = node.agent.as_deref() else {
            continue;
        };
        let Some(secret_key) = secret_key_for_agent(agent) else {
            continue;
        };

        let status = match secrets.get_secret(secret_key, project).await {
            Ok(value) => {
                node.params
                    .insert(API_KEY_PARAM.to_string(), Value::String(value));
                tracing::info!(
                    "[Inject] Injected {} into node '{}' ({})",
                    secret_key,
                    node_id,
                    agent
                );
                InjectionStatus::Injected
            }
            Err(e) => {
                tracing::warn!(
                    "[Inject] Could not inject {} into node '{}': {}",
                    secret_key,
                    node_id,
                    e
                );
                InjectionStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        outcomes.push(InjectionOutcome {
            node_id: node_id.to_string(),
            agent: agent.to_string(),
            secret_key: secret_key.to_string(),
            status,
        });
    }

    outcomes
}
