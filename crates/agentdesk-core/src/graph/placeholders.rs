//! `${NAME}` placeholder resolution for service base URLs.
//!
//! Only the names in [`crate::config::BASE_URL_PLACEHOLDERS`] are replaced;
//! anything else (including GraphAI's own `${...}` expressions) is left
//! untouched. A string may contain several placeholders and the same one
//! more than once.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use super::document::GraphDocument;
use crate::config::BaseUrls;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"))
}

/// Substitute known placeholders in one string.
pub fn resolve_str(input: &str, urls: &BaseUrls) -> String {
    placeholder_re()
        .replace_all(input, |caps: &Captures| match urls.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Resolve every string inside `value`, recursively. Returns the number of
/// strings that changed.
pub fn resolve_value(value: &mut Value, urls: &BaseUrls) -> usize {
    match value {
        Value::String(s) => {
            if !s.contains("${") {
                return 0;
            }
            let resolved = resolve_str(s, urls);
            if resolved == *s {
                0
            } else {
                *s = resolved;
                1
            }
        }
        Value::Array(items) => items.iter_mut().map(|v| resolve_value(v, urls)).sum(),
        Value::Object(map) => map.values_mut().map(|v| resolve_value(v, urls)).sum(),
        _ => 0,
    }
}

/// Resolve placeholders in every node's `params` and `inputs`.
pub fn resolve_placeholders(doc: &mut GraphDocument, urls: &BaseUrls) -> usize {
    let mut changed = 0;
    for (node_id, node) in doc.nodes_mut() {
        let mut node_changed = node
            .params
            .values_mut()
            .map(|v| resolve_value(v, urls))
            .sum::<usize>();
        node_changed += resolve_value(&mut node.inputs, urls);
        if node_changed > 0 {
            tracing::debug!(
                "[Placeholders] Resolved {} field(s) in node '{}'",
                node_changed,
                node_id
            );
        }
        changed += node_changed;
    }
    changed
}
