//! The two-stage answer pipeline.
//!
//! Stage 1 answers from the benefits-guide digest. If its output contains
//! the insufficiency marker (case-insensitive), the question is searched in
//! the knowledge base and stage 2 answers from the results, reusing the
//! history fetched for stage 1. Stage 2's output is final whatever it says.

use plandesk_core::error::Error;
use plandesk_core::question::Question;
use plandesk_core::retrieval::Retriever;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::ContextGatherer;
use crate::invoker::CompletionInvoker;
use crate::prompt::{PromptAssembler, Stage};

/// Phrase whose presence in a stage-1 output triggers stage 2.
pub const INSUFFICIENCY_MARKER: &str = "insufficient information";

/// Outcome of stage 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage1Result {
    /// The digest was enough; the text is the final answer.
    Sufficient(String),
    /// The model signalled insufficiency; the raw text is kept for logging only.
    Insufficient(String),
}

impl Stage1Result {
    pub fn classify(output: String) -> Self {
        if output.to_lowercase().contains(INSUFFICIENCY_MARKER) {
            Self::Insufficient(output)
        } else {
            Self::Sufficient(output)
        }
    }
}

/// The answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// The stage that produced `text`.
    pub stage: Stage,
}

/// Runs stage 1 and, when needed, stage 2.
pub struct EscalationController {
    context: ContextGatherer,
    prompts: Arc<PromptAssembler>,
    invoker: CompletionInvoker,
    retriever: Arc<dyn Retriever>,
}

impl EscalationController {
    pub fn new(
        context: ContextGatherer,
        prompts: Arc<PromptAssembler>,
        invoker: CompletionInvoker,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self {
            context,
            prompts,
            invoker,
            retriever,
        }
    }

    pub async fn answer(&self, question: &Question) -> Result<Answer, Error> {
        let user_id = question.user_id;
        info!(%user_id, "Answering question");

        let history = self.context.gather(user_id).await?;

        let prompt = self.prompts.stage1(&question.text, &history);
        let output = self.invoker.complete(&prompt).await?;

        match Stage1Result::classify(output) {
            Stage1Result::Sufficient(text) => {
                info!(%user_id, "Stage 1 answered from digest");
                Ok(Answer {
                    text,
                    stage: Stage::Digest,
                })
            }
            Stage1Result::Insufficient(_) => {
                info!(%user_id, "Stage 1 reported insufficient information; escalating");
                let text = self.escalate(question, &history).await?;
                Ok(Answer {
                    text,
                    stage: Stage::KnowledgeBase,
                })
            }
        }
    }

    async fn escalate(&self, question: &Question, history: &str) -> Result<String, Error> {
        let documents = match self.retriever.search(&question.text).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(
                    retriever = %self.retriever.name(),
                    error = %e,
                    "Knowledge-base search failed; continuing without documents"
                );
                String::new()
            }
        };

        let prompt = self.prompts.stage2(&question.text, history, &documents);
        let text = self.invoker.complete(&prompt).await?;
        info!(user_id = %question.user_id, "Stage 2 answered from knowledge base");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingHistory, RecordingRetriever, ScriptedProvider};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use plandesk_config::HistoryPolicy;
    use plandesk_core::error::{HistoryError, ProviderError, RetrievalError};
    use plandesk_core::history::{ConversationTurn, HistoryStore};
    use plandesk_history::InMemoryHistory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingHistory {
        inner: InMemoryHistory,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HistoryStore for CountingHistory {
        fn name(&self) -> &str {
            "counting"
        }

        async fn recent(
            &self,
            user_id: Uuid,
            limit: usize,
        ) -> Result<Vec<ConversationTurn>, HistoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.recent(user_id, limit).await
        }
    }

    struct Fixture {
        provider: Arc<ScriptedProvider>,
        retriever: Arc<RecordingRetriever>,
        controller: EscalationController,
    }

    fn fixture(
        provider: ScriptedProvider,
        retriever: RecordingRetriever,
        history: Arc<dyn HistoryStore>,
        policy: HistoryPolicy,
    ) -> Fixture {
        let provider = Arc::new(provider);
        let retriever = Arc::new(retriever);
        let controller = EscalationController::new(
            ContextGatherer::new(history, policy),
            Arc::new(PromptAssembler::default()),
            CompletionInvoker::new(provider.clone(), "mock-model"),
            retriever.clone(),
        );
        Fixture {
            provider,
            retriever,
            controller,
        }
    }

    fn simple(provider: ScriptedProvider, retriever: RecordingRetriever) -> Fixture {
        fixture(
            provider,
            retriever,
            Arc::new(InMemoryHistory::new()),
            HistoryPolicy::Proceed,
        )
    }

    fn question(text: &str) -> Question {
        Question::new(text, Uuid::new_v4())
    }

    #[test]
    fn classification_is_case_insensitive_substring() {
        assert!(matches!(
            Stage1Result::classify("Insufficient information".into()),
            Stage1Result::Insufficient(_)
        ));
        assert!(matches!(
            Stage1Result::classify("Sorry: INSUFFICIENT INFORMATION in the guide.".into()),
            Stage1Result::Insufficient(_)
        ));
        assert_eq!(
            Stage1Result::classify("Your deductible is $250.".into()),
            Stage1Result::Sufficient("Your deductible is $250.".into())
        );
        assert!(matches!(
            Stage1Result::classify("insufficient info".into()),
            Stage1Result::Sufficient(_)
        ));
    }

    #[tokio::test]
    async fn sufficient_stage1_is_returned_verbatim_without_search() {
        let f = simple(
            ScriptedProvider::new(["  **Deductible**\n\nIt is $250.  "]),
            RecordingRetriever::returning("unused"),
        );

        let answer = f.controller.answer(&question("What is my deductible?")).await.unwrap();

        assert_eq!(answer.text, "  **Deductible**\n\nIt is $250.  ");
        assert_eq!(answer.stage, Stage::Digest);
        assert!(f.retriever.questions().is_empty());
        assert_eq!(f.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn insufficient_stage1_escalates_once_with_original_question() {
        let f = simple(
            ScriptedProvider::new(["Insufficient information", "Stage two answer"]),
            RecordingRetriever::returning("Doc A\n\nDoc B"),
        );

        let answer = f.controller.answer(&question("Is LASIK covered?")).await.unwrap();

        assert_eq!(answer.text, "Stage two answer");
        assert_eq!(answer.stage, Stage::KnowledgeBase);
        assert_eq!(f.retriever.questions(), vec!["Is LASIK covered?".to_string()]);

        let requests = f.provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].messages[0].content.contains("KNOWLEDGE BASE DOCUMENTS"));
        assert!(
            requests[1].messages[0]
                .content
                .ends_with("**KNOWLEDGE BASE DOCUMENTS:**\nDoc A\n\nDoc B\n")
        );
    }

    #[tokio::test]
    async fn stage2_output_is_final_even_when_insufficient() {
        let f = simple(
            ScriptedProvider::new(["insufficient information", "Still insufficient information."]),
            RecordingRetriever::returning(""),
        );

        let answer = f.controller.answer(&question("q")).await.unwrap();

        assert_eq!(answer.text, "Still insufficient information.");
        assert_eq!(answer.stage, Stage::KnowledgeBase);
        assert_eq!(f.provider.call_count(), 2);
        assert_eq!(f.retriever.questions().len(), 1);
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_empty_documents() {
        let f = simple(
            ScriptedProvider::new(["Insufficient information", "Please contact HR."]),
            RecordingRetriever::failing(RetrievalError::RequestFailed("connection reset".into())),
        );

        let answer = f.controller.answer(&question("q")).await.unwrap();

        assert_eq!(answer.text, "Please contact HR.");
        let stage2 = &f.provider.requests()[1].messages[0].content;
        assert!(stage2.ends_with("**KNOWLEDGE BASE DOCUMENTS:**\n\n"));
    }

    #[tokio::test]
    async fn history_is_fetched_once_and_reused_for_stage2() {
        let user = Uuid::new_v4();
        let inner = InMemoryHistory::new();
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        inner
            .append(ConversationTurn::new(user, "I'm on the PPO plan", t0))
            .await;
        inner
            .append(ConversationTurn::new(user, "What about dental?", t0 + Duration::minutes(1)))
            .await;
        let history = Arc::new(CountingHistory {
            inner,
            calls: AtomicUsize::new(0),
        });

        let f = fixture(
            ScriptedProvider::new(["Insufficient information", "done"]),
            RecordingRetriever::returning("doc"),
            history.clone(),
            HistoryPolicy::Proceed,
        );
        f.controller.answer(&Question::new("q", user)).await.unwrap();

        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
        let requests = f.provider.requests();
        let expected = "I'm on the PPO plan\nWhat about dental?";
        assert!(requests[0].messages[0].content.contains(&format!("**PAST CHAT HISTORY**\n{expected}\n")));
        assert!(requests[1].messages[0].content.contains(&format!("**CHAT HISTORY:**\n{expected}\n")));
    }

    #[tokio::test]
    async fn empty_history_renders_none() {
        let f = simple(
            ScriptedProvider::new(["fine"]),
            RecordingRetriever::returning(""),
        );
        f.controller.answer(&question("q")).await.unwrap();
        assert!(
            f.provider.requests()[0].messages[0]
                .content
                .ends_with("**PAST CHAT HISTORY**\nNone\n")
        );
    }

    #[tokio::test]
    async fn stage1_completion_failure_propagates() {
        let f = simple(
            ScriptedProvider::failing(ProviderError::Timeout("120s".into())),
            RecordingRetriever::returning(""),
        );
        let err = f.controller.answer(&question("q")).await.unwrap_err();
        assert!(matches!(err, Error::CompletionFailed(ProviderError::Timeout(_))));
        assert!(f.retriever.questions().is_empty());
    }

    #[tokio::test]
    async fn stage2_completion_failure_propagates() {
        let f = simple(
            ScriptedProvider::new(["Insufficient information"])
                .then_fail(ProviderError::Network("reset".into())),
            RecordingRetriever::returning("doc"),
        );
        let err = f.controller.answer(&question("q")).await.unwrap_err();
        assert!(matches!(err, Error::CompletionFailed(_)));
    }

    #[tokio::test]
    async fn history_outage_proceeds_by_default() {
        let f = fixture(
            ScriptedProvider::new(["answer"]),
            RecordingRetriever::returning(""),
            Arc::new(FailingHistory),
            HistoryPolicy::Proceed,
        );
        let answer = f.controller.answer(&question("q")).await.unwrap();
        assert_eq!(answer.text, "answer");
    }

    #[tokio::test]
    async fn history_outage_aborts_under_abort_policy() {
        let f = fixture(
            ScriptedProvider::new(["answer"]),
            RecordingRetriever::returning(""),
            Arc::new(FailingHistory),
            HistoryPolicy::Abort,
        );
        let err = f.controller.answer(&question("q")).await.unwrap_err();
        assert!(matches!(err, Error::HistoryUnavailable(_)));
        assert_eq!(f.provider.call_count(), 0);
    }
}
