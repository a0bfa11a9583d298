//! Plan recommendation: three sequential completions.
//!
//! 1. **Preference Analyzer** turns free-text preferences into criteria.
//! 2. **Plan Selector** ranks the offered plans against those criteria.
//! 3. **Final Recommender** rewrites the ranking for the employee.
//!
//! Each step sees its persona as a system message and its task, with the
//! previous step's output as context, as a user message.

use plandesk_core::error::ProviderError;
use plandesk_core::message::Message;
use plandesk_core::question::{BenefitPlan, format_plans};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::invoker::CompletionInvoker;

/// Who a pipeline step speaks as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl Persona {
    fn system_message(&self) -> Message {
        Message::system(format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        ))
    }
}

pub const PREFERENCE_ANALYZER: Persona = Persona {
    name: "Preference Analyzer",
    role: "Summarize employee's key healthcare plan preferences",
    goal: "Extract and clearly list the most important preferences from the user input",
    backstory: "You excel at understanding employee needs and summarizing them clearly.",
};

pub const PLAN_SELECTOR: Persona = Persona {
    name: "Plan Selector",
    role: "Match and rank plans",
    goal: "Use employee preferences and available plan data to select the best option, providing detailed reasoning and a ranked list",
    backstory: "You carefully evaluate trade-offs and match plans to the user's exact needs.",
};

pub const FINAL_RECOMMENDER: Persona = Persona {
    name: "Final Recommender",
    role: "Explain recommendation clearly",
    goal: "Paraphrase the selected plan recommendation into friendly, empathetic language for the employee",
    backstory: "You are excellent at simplifying complex information and making the employee feel confident in their choice.",
};

/// One unit of work for a persona.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTask {
    pub persona: Persona,
    pub description: String,
    pub expected_output: &'static str,
}

impl PlanTask {
    pub fn analyze_preferences(preferences: &str) -> Self {
        Self {
            persona: PREFERENCE_ANALYZER,
            description: format!(
                "Analyze the following user preferences and produce a structured list of key criteria...\nUser Preferences:\n{preferences}\n"
            ),
            expected_output: "A clear, numbered list summarizing the key criteria.",
        }
    }

    pub fn select_plan(plans: &[BenefitPlan]) -> Self {
        Self {
            persona: PLAN_SELECTOR,
            description: format!(
                "Use the following plans data: {}\nand the extracted employee preferences from the Preference Analyzer.\nRank the plans from best to worst based on how they match the employee's preferences...\n",
                format_plans(plans)
            ),
            expected_output: "A ranked list with reasoning and a final plan selection.",
        }
    }

    pub fn recommend() -> Self {
        Self {
            persona: FINAL_RECOMMENDER,
            description: "Take the ranked plans and final selection from the Plan Selector.\nRephrase it into friendly, empathetic language that can be shown to the employee on the final answer page...\n".into(),
            expected_output: "A final friendly recommendation paragraph.",
        }
    }

    /// The system and user messages for this task.
    pub fn messages(&self, context: Option<&str>) -> Vec<Message> {
        let mut task = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}",
            self.description, self.expected_output
        );
        if let Some(context) = context {
            task.push_str("\n\nThis is the context you're working with:\n");
            task.push_str(context);
        }
        vec![self.persona.system_message(), Message::user(task)]
    }
}

/// Intermediate and final outputs of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub criteria: String,
    pub ranking: String,
    /// The employee-facing recommendation.
    pub result: String,
}

/// Runs the three-step recommendation pipeline.
pub struct PlanAdvisor {
    invoker: CompletionInvoker,
}

impl PlanAdvisor {
    pub fn new(invoker: CompletionInvoker) -> Self {
        Self { invoker }
    }

    pub async fn recommend(
        &self,
        preferences: &str,
        plans: &[BenefitPlan],
    ) -> Result<Recommendation, ProviderError> {
        info!(plans = plans.len(), "Recommending plan");

        let criteria = self.run(PlanTask::analyze_preferences(preferences), None).await?;
        let ranking = self.run(PlanTask::select_plan(plans), Some(&criteria)).await?;
        let result = self.run(PlanTask::recommend(), Some(&ranking)).await?;

        Ok(Recommendation {
            criteria,
            ranking,
            result,
        })
    }

    async fn run(&self, task: PlanTask, context: Option<&str>) -> Result<String, ProviderError> {
        info!(step = task.persona.name, "Running plan step");
        self.invoker.complete_messages(task.messages(context)).await
    }
}
