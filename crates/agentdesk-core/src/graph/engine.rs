//! Boundary to the external graph execution engine.
//!
//! The engine receives a fully prepared [`GraphDocument`] plus the initial
//! input and returns per-node results, per-node errors and an ordered
//! execution log. Scheduling and agent dispatch happen on the engine's side.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::GraphDocument;
use crate::error::EngineError;

/// Terminal node state reported when a node ran out of time.
pub const STATE_TIMED_OUT: &str = "timed-out";

/// One entry of the engine's execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLog {
    pub node_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// What the engine returns for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    #[serde(default)]
    pub results: BTreeMap<String, Value>,
    #[serde(default)]
    pub errors: BTreeMap<String, Value>,
    #[serde(default)]
    pub logs: Vec<NodeLog>,
}

impl EngineOutput {
    /// Keep only each node's last log entry, ordered by first appearance.
    pub fn dedup_logs(mut self) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut last: BTreeMap<String, NodeLog> = BTreeMap::new();
        for log in self.logs.drain(..) {
            if !last.contains_key(&log.node_id) {
                order.push(log.node_id.clone());
            }
            last.insert(log.node_id.clone(), log);
        }
        self.logs = order.into_iter().filter_map(|id| last.remove(&id)).collect();
        self
    }

    /// Errors reported, or any node ended `timed-out`.
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || self.logs.iter().any(|log| log.state == STATE_TIMED_OUT)
    }
}

#[async_trait]
pub trait GraphEngine: Send + Sync {
    async fn run(&self, graph: GraphDocument, input: Value) -> Result<EngineOutput, EngineError>;
}

/// Engine reachable over HTTP: `POST {base}/run` with `{ graph, input }`.
pub struct RemoteGraphEngine {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteGraphEngine {
    pub fn new(base_url: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout
            .build()
            .map_err(|e| {
                EngineError::Transport(format!("Failed to build graph engine HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GraphEngine for RemoteGraphEngine {
    async fn run(&self, graph: GraphDocument, input: Value) -> Result<EngineOutput, EngineError> {
        let url = format!("{}/run", self.base_url);
        let body = serde_json::json!({ "graph": graph, "input": input });

        tracing::info!("[Engine] Submitting graph to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(e.to_string())
                } else {
                    EngineError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Rejected(format!("HTTP {}: {}", status, text)));
        }

        response
            .json::<EngineOutput>()
            .await
            .map_err(|e| EngineError::Transport(format!("Failed to parse engine response: {}", e)))
    }
}
