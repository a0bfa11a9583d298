//! `plandesk ask`: answer one question from the terminal.

use plandesk_core::question::Question;
use std::path::Path;
use uuid::Uuid;

pub async fn run(
    config_path: Option<&Path>,
    question: String,
    user: Option<Uuid>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    if !config.has_api_key() {
        tracing::debug!(
            provider = %config.default_provider,
            "No API key configured; only local backends will work"
        );
    }

    let state = super::build_state(&config, offline).await?;
    let question = Question::new(question, user.unwrap_or_else(Uuid::new_v4));
    let answer = state.controller.answer(&question).await?;

    println!("{}", answer.text);
    eprintln!("\n(answered by stage {})", answer.stage.number());
    Ok(())
}
