//! Shared test doubles for the pipeline tests.

use async_trait::async_trait;
use plandesk_core::error::{HistoryError, ProviderError, RetrievalError};
use plandesk_core::history::{ConversationTurn, HistoryStore};
use plandesk_core::message::flatten_messages;
use plandesk_core::provider::{CallingConvention, Provider, ProviderRequest, ProviderResponse, Usage};
use plandesk_core::retrieval::Retriever;
use std::sync::Mutex;
use uuid::Uuid;

/// A provider that returns scripted responses in order and records requests.
///
/// Runs out of script → `MalformedResponse`.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    convention: CallingConvention,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
            convention: CallingConvention::Messages,
        }
    }

    /// A provider whose first call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        let provider = Self::new(Vec::<String>::new());
        provider.responses.lock().unwrap().push(Err(error));
        provider
    }

    /// Append a failure after the scripted successes.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn with_convention(mut self, convention: CallingConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// What a single-string backend would have received for each call.
    pub fn seen_texts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| flatten_messages(&r.messages))
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn calling_convention(&self) -> CallingConvention {
        self.convention
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };
        match next {
            Some(Ok(text)) => Ok(ProviderResponse {
                text,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(ProviderError::MalformedResponse("script exhausted".into())),
        }
    }
}

/// A retriever that records every question it is asked.
pub struct RecordingRetriever {
    result: Result<String, RetrievalError>,
    questions: Mutex<Vec<String>>,
}

impl RecordingRetriever {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            result: Err(error),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for RecordingRetriever {
    fn name(&self) -> &str {
        "recording"
    }

    async fn search(&self, question: &str) -> Result<String, RetrievalError> {
        self.questions.lock().unwrap().push(question.to_string());
        self.result.clone()
    }
}

/// A history store that is always down.
pub struct FailingHistory;

#[async_trait]
impl HistoryStore for FailingHistory {
    fn name(&self) -> &str {
        "failing"
    }

    async fn recent(
        &self,
        _user_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        Err(HistoryError::Unreachable("connection refused".into()))
    }
}
