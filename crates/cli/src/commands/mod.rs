pub mod ask;
pub mod doctor;
pub mod init;
pub mod recommend;
pub mod serve;

use plandesk_config::AppConfig;
use plandesk_core::history::HistoryStore;
use plandesk_gateway::AppState;
use plandesk_history::InMemoryHistory;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The config file in use: `--config` or the default location.
pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_path(path);
    AppConfig::load_path(&path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the pipelines, optionally with an empty in-memory history.
pub async fn build_state(
    config: &AppConfig,
    offline: bool,
) -> Result<AppState, Box<dyn std::error::Error>> {
    if !offline {
        return Ok(AppState::from_config(config).await?);
    }

    let provider = plandesk_providers::build_from_config(config)?;
    let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistory::new());
    let retriever = plandesk_gateway::retriever_from_config(config);
    Ok(AppState::from_parts(config, provider, history, retriever)?)
}
