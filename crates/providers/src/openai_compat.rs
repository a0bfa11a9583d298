//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, and any endpoint that
//! exposes `/v1/chat/completions`. These backends are message-oriented, so
//! the request's role/content list is sent as-is.

use async_trait::async_trait;
use plandesk_core::error::ProviderError;
use plandesk_core::message::Message;
use plandesk_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::check_status;

/// An OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(name, base_url, api_key, Duration::from_secs(120))
    }

    /// Create a provider whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }
}

#[async_trait]
impl plandesk_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn calling_convention(&self) -> CallingConvention {
        CallingConvention::Messages
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let response = check_status(response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let text = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("Choice has no content".into()))?;

        Ok(ProviderResponse {
            text,
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::spawn;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use plandesk_core::Provider;
    use std::sync::{Arc, Mutex};

    fn request(messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages,
            temperature: 0.2,
            max_tokens: Some(256),
        }
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url.contains("localhost:11434"));
        assert_eq!(provider.calling_convention(), CallingConvention::Messages);
    }

    #[test]
    fn message_conversion_keeps_roles() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[1].content.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn sends_messages_unflattened() {
        let seen = Arc::new(Mutex::new(serde_json::Value::Null));
        let seen_clone = seen.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(body): Json<serde_json::Value>| {
                let seen = seen_clone.clone();
                async move {
                    *seen.lock().unwrap() = body;
                    Json(serde_json::json!({
                        "model": "gpt-4o-mini-2024",
                        "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
                        "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
                    }))
                }
            }),
        );
        let base = spawn(app).await;

        let provider = OpenAiCompatProvider::new("openai", base, "sk-test");
        let response = provider
            .complete(request(vec![Message::user("Hello")]))
            .await
            .unwrap();

        assert_eq!(response.text, "Hi there");
        assert_eq!(response.model, "gpt-4o-mini-2024");
        assert_eq!(response.usage.unwrap().total_tokens, 5);

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["max_tokens"], 256);
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(serde_json::json!({"choices": []})) }),
        );
        let base = spawn(app).await;

        let provider = OpenAiCompatProvider::new("openai", base, "sk-test");
        let err = provider
            .complete(request(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn choice_without_content_is_malformed() {
        for reply in [
            serde_json::json!({"choices": [{"message": {"role": "assistant", "content": null}}]}),
            serde_json::json!({"choices": [{"message": {"role": "assistant"}}]}),
            serde_json::json!({"choices": [{"message": {"role": "assistant", "content": ""}}]}),
        ] {
            let app = Router::new().route(
                "/chat/completions",
                post(move || {
                    let reply = reply.clone();
                    async move { Json(reply) }
                }),
            );
            let base = spawn(app).await;

            let provider = OpenAiCompatProvider::new("openai", base, "sk-test");
            let err = provider
                .complete(request(vec![Message::user("Hello")]))
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::MalformedResponse(_)));
        }
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn(app).await;

        let provider = OpenAiCompatProvider::new("openai", base, "sk-wrong");
        let err = provider
            .complete(request(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }
}
