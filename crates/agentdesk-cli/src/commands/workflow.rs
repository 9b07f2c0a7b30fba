//! `agentdesk workflow` — Validate, register and run graph workflows.

use agentdesk_core::graph::{GraphTemplate, RegisterWorkflow};
use agentdesk_core::state::AppState;

use super::print_json;

/// Check that a workflow file parses as a graph.
pub async fn validate(file: &str) -> Result<(), String> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("Failed to read '{}': {}", file, e))?;

    let template = GraphTemplate::from_yaml(&content).map_err(|e| match e.location() {
        Some(at) => format!(
            "Invalid workflow at line {}, column {}: {}",
            at.line(),
            at.column(),
            e
        ),
        None => format!("Invalid workflow: {}", e),
    })?;

    println!("✅ {} is valid ({} node(s))", file, template.node_count());
    Ok(())
}

/// Copy a workflow file into the model directory.
pub async fn register(
    state: &AppState,
    file: &str,
    name: Option<&str>,
    directory: Option<&str>,
    overwrite: bool,
) -> Result<(), String> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("Failed to read '{}': {}", file, e))?;

    let derived = std::path::Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let workflow_name = name.unwrap_or(&derived);

    let path = state
        .workflows
        .register(RegisterWorkflow {
            workflow_name,
            yaml_content: &content,
            overwrite,
            directory,
        })
        .await
        .map_err(|e| {
            let details: Vec<String> = e
                .validation_errors()
                .into_iter()
                .map(|d| d.message)
                .collect();
            if details.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", e, details.join("; "))
            }
        })?;

    println!("✓ Workflow registered: {}", path.display());
    Ok(())
}

/// Execute a workflow through the configured graph engine.
pub async fn run(
    state: &AppState,
    model_name: &str,
    input: &str,
    project: Option<&str>,
) -> Result<(), String> {
    let report = state
        .runner
        .run(model_name, input, project)
        .await
        .map_err(|e| e.to_string())?;

    print_json(&serde_json::to_value(&report).map_err(|e| e.to_string())?);

    if report.has_failures() {
        Err(format!("Workflow '{}' finished with failures", model_name))
    } else {
        Ok(())
    }
}
