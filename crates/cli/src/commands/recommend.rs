//! `plandesk recommend`: run the plan recommendation pipeline.

use plandesk_core::question::BenefitPlan;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    preferences: String,
    plans_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let raw = std::fs::read_to_string(plans_path)
        .map_err(|e| format!("Failed to read {}: {e}", plans_path.display()))?;
    let plans: Vec<BenefitPlan> = serde_json::from_str(&raw)
        .map_err(|e| format!("{} is not a JSON array of plans: {e}", plans_path.display()))?;

    // History is never read by this pipeline.
    let state = super::build_state(&config, true).await?;
    let recommendation = state.advisor.recommend(&preferences, &plans).await?;

    println!("{}", recommendation.result);
    Ok(())
}
