//! The plandesk answer pipelines.
//!
//! [`EscalationController`] answers free-text benefits questions:
//!
//! 1. **Gather** the user's recent chat history
//! 2. **Stage 1**: answer from the benefits-guide digest
//! 3. If stage 1 reports *insufficient information*, **search** the
//!    knowledge base and **Stage 2**: answer from the results
//!
//! [`PlanAdvisor`] turns employee preferences and a plan list into a
//! recommendation.

pub mod context;
pub mod escalation;
pub mod invoker;
pub mod plans;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextGatherer, HISTORY_TURNS};
pub use escalation::{Answer, EscalationController, INSUFFICIENCY_MARKER, Stage1Result};
pub use invoker::CompletionInvoker;
pub use plans::{PlanAdvisor, PlanTask, Recommendation};
pub use prompt::{PolicyTemplate, PromptAssembler, Stage};
