//! `plandesk serve`: start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("plandesk gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);
    if offline {
        println!("   History:   in-memory (offline)");
    } else {
        println!("   History:   {}", config.history.backend);
    }

    let state = super::build_state(&config, offline).await?;
    plandesk_gateway::serve(&config, state).await
}
