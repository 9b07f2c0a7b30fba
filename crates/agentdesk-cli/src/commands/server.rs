//! `agentdesk server` — Start the HTTP server.

use agentdesk_core::config::Settings;

pub async fn run(
    settings: Settings,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), String> {
    let mut config = agentdesk_server::ServerConfig::from(settings);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    println!("Starting agentdesk server on {}:{}...", config.host, config.port);

    let addr = agentdesk_server::start_server(config).await?;
    println!("agentdesk server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
