//! Inbound request values: benefits questions and plan-recommendation input.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A benefits question asked by a user. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub user_id: Uuid,
}

impl Question {
    pub fn new(text: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            text: text.into(),
            user_id,
        }
    }
}

/// A benefits plan offered to the employee.
///
/// Field values arrive from the caller untyped (numbers or strings), so they
/// are kept as JSON values and rendered verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenefitPlan {
    #[serde(default)]
    pub name: serde_json::Value,
    #[serde(default)]
    pub deductible: serde_json::Value,
    #[serde(default)]
    pub monthly_premium: serde_json::Value,
    #[serde(default)]
    pub network: serde_json::Value,
}

impl BenefitPlan {
    /// Render this plan as an indented bullet block.
    pub fn to_bullet(&self) -> String {
        format!(
            "\n- Name: {}\n  Deductible: {}\n  Monthly Premium: {}\n  Network: {}\n",
            render_field(&self.name),
            render_field(&self.deductible),
            render_field(&self.monthly_premium),
            render_field(&self.network),
        )
    }
}

/// Render a list of plans for inclusion in a prompt.
pub fn format_plans(plans: &[BenefitPlan]) -> String {
    plans.iter().map(BenefitPlan::to_bullet).collect()
}

fn render_field(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".into(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
