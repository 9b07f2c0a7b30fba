//! `agentdesk secrets` — Inspect secret resolution (vault, then environment).

use agentdesk_core::state::AppState;

use super::print_json;

/// Show where a secret resolves from, masking the value unless asked.
pub async fn get(
    state: &AppState,
    key: &str,
    project: Option<&str>,
    reveal: bool,
) -> Result<(), String> {
    let value = state
        .secrets
        .get_secret(key, project)
        .await
        .map_err(|e| e.to_string())?;

    let shown = if reveal { value } else { mask(&value) };
    println!("{} = {}", key, shown);
    Ok(())
}

/// List the keys available for a project.
pub async fn list(state: &AppState, project: Option<&str>, reveal: bool) -> Result<(), String> {
    let secrets = state.secrets.get_secrets_for_project(project).await;
    let view: serde_json::Map<String, serde_json::Value> = secrets
        .into_iter()
        .map(|(key, value)| {
            let shown = if reveal { value } else { mask(&value) };
            (key, serde_json::Value::String(shown))
        })
        .collect();

    print_json(&serde_json::json!({
        "vaultEnabled": state.secrets.vault_enabled(),
        "secrets": view,
    }));
    Ok(())
}

pub async fn default_project(state: &AppState) -> Result<(), String> {
    println!("{}", state.secrets.default_project().await);
    Ok(())
}

/// Keep the first four characters, hide the rest.
pub fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
