//! `agentdesk create-job` — Create a job from a finished requirement set.

use agentdesk_core::chat::{ChatApi, RequirementState};

use super::print_json;

/// Parse requirements given as inline JSON or `@path/to/file.json`.
pub fn parse_requirements(raw: &str) -> Result<RequirementState, String> {
    let content = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read requirements file '{}': {}", path, e))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&content).map_err(|e| format!("Invalid requirements JSON: {}", e))
}

pub async fn create(
    api_base: &str,
    conversation_id: &str,
    requirements: &str,
    force: bool,
) -> Result<(), String> {
    let requirements = parse_requirements(requirements)?;
    if !requirements.is_ready() && !force {
        return Err(format!(
            "Requirements are only {:.0}% complete (use --force to submit anyway)",
            requirements.completeness * 100.0
        ));
    }

    let api = ChatApi::new(api_base);
    let job = api
        .create_job(conversation_id, &requirements)
        .await
        .map_err(|e| e.to_string())?;

    print_json(&serde_json::to_value(&job).map_err(|e| e.to_string())?);
    Ok(())
}
