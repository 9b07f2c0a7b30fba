//! Graph documents — the node graph handed to the execution engine.
//!
//! A workflow YAML looks like:
//!
//! ```yaml
//! version: 0.5
//! nodes:
//!   source: {}
//!   summarize:
//!     agent: openAIAgent
//!     params:
//!       model: gpt-4o-mini
//!     inputs:
//!       prompt: :source
//!   notify:
//!     agent: fetchAgent
//!     inputs:
//!       url: ${EXPERTAGENT_BASE_URL}/v1/utility/notify
//! ```
//!
//! A loaded [`GraphTemplate`] is immutable and may be shared between
//! requests. Every execution works on its own [`GraphDocument`], obtained
//! from [`GraphTemplate::instantiate`], which deep-copies the template.
//! `GraphDocument` is deliberately not `Clone`: it is owned by exactly one
//! request and consumed by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Agent name (e.g. `openAIAgent`). Static nodes have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub inputs: Value,

    /// Everything else (`value`, `isResult`, `console`, `graph`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GraphBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Value>,

    #[serde(default)]
    nodes: BTreeMap<String, NodeConfig>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Shared, read-only graph definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphTemplate {
    body: GraphBody,
}

impl GraphTemplate {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self {
            body: serde_yaml::from_str(yaml)?,
        })
    }

    pub fn node_count(&self) -> usize {
        self.body.nodes.len()
    }

    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.body.nodes.get(id)
    }

    /// Fresh per-request copy.
    pub fn instantiate(&self) -> GraphDocument {
        GraphDocument {
            body: self.body.clone(),
        }
    }
}

/// Per-request graph, mutated in place by the preparation passes.
#[derive(Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GraphDocument {
    body: GraphBody,
}

impl GraphDocument {
    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.body.nodes.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.body.nodes.keys().map(String::as_str)
    }

    /// Nodes in document (id) order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&str, &mut NodeConfig)> {
        self.body.nodes.iter_mut().map(|(id, node)| (id.as_str(), node))
    }

    /// Set the static `value` of a node, creating the node when missing.
    pub fn inject_value(&mut self, node_id: &str, value: Value) {
        self.body
            .nodes
            .entry(node_id.to_string())
            .or_default()
            .extra
            .insert("value".to_string(), value);
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
