//! Completion invocation: one prompt in, raw text out.
//!
//! The assembled prompt is always submitted as a single `user` message.
//! Message-oriented backends receive that one message as-is; single-string
//! backends receive it flattened by [`flatten_messages`], i.e. the text
//! `"user: " + prompt`.
//!
//! [`flatten_messages`]: plandesk_core::message::flatten_messages

use plandesk_config::AppConfig;
use plandesk_core::error::ProviderError;
use plandesk_core::message::Message;
use plandesk_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Sends prompts to the configured completion backend.
#[derive(Clone)]
pub struct CompletionInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl CompletionInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Model and sampling settings from the top-level config.
    pub fn from_config(provider: Arc<dyn Provider>, model: impl Into<String>, config: &AppConfig) -> Self {
        Self::new(provider, model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete a single prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.complete_messages(vec![Message::user(prompt)]).await
    }

    /// Complete an explicit message list.
    pub async fn complete_messages(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = %self.provider.name(),
            convention = ?self.provider.calling_convention(),
            model = %self.model,
            "Invoking completion"
        );

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }
        Ok(response.text)
    }
}
