//! Provider construction from configuration.
//!
//! Selects the backend named by `default_provider`, applies per-provider
//! overrides, and wraps the result in a [`RetryProvider`] so every
//! completion call is bounded and retried per the `[completion]` settings.

use plandesk_config::AppConfig;
use plandesk_core::error::ProviderError;
use plandesk_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::gemini::{GEMINI_BASE_URL, GeminiProvider};
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryProvider;

/// Build the configured completion provider.
///
/// Fails with `NotConfigured` when no API key is available for a backend
/// that needs one.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    let timeout = Duration::from_secs(config.completion.timeout_secs);

    let provider: Arc<dyn Provider> = match name {
        "gemini" => {
            let key = api_key.ok_or_else(|| {
                ProviderError::NotConfigured("gemini requires GEMINI_API_KEY or api_key".into())
            })?;
            Arc::new(GeminiProvider::with_timeout(base_url, key, timeout))
        }
        // Local servers accept any key.
        "ollama" | "vllm" | "llamacpp" => Arc::new(OpenAiCompatProvider::with_timeout(
            name,
            base_url,
            api_key.unwrap_or_else(|| name.to_string()),
            timeout,
        )),
        _ => {
            let key = api_key.ok_or_else(|| {
                ProviderError::NotConfigured(format!("provider '{name}' has no API key"))
            })?;
            Arc::new(OpenAiCompatProvider::with_timeout(name, base_url, key, timeout))
        }
    };

    info!(
        provider = name,
        model = %config.default_model,
        max_retries = config.completion.max_retries,
        "Completion provider ready"
    );

    Ok(Arc::new(
        RetryProvider::new(provider)
            .with_timeout(timeout)
            .with_max_retries(config.completion.max_retries)
            .with_backoff(Duration::from_millis(config.completion.retry_backoff_ms)),
    ))
}

/// The model to request from the default provider.
pub fn model_for(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" => GEMINI_BASE_URL.into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plandesk_config::ProviderConfig;
    use plandesk_core::provider::CallingConvention;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("gemini").contains("generativelanguage.googleapis.com"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn gemini_without_key_is_not_configured() {
        let config = AppConfig::default();
        let err = build_from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn gemini_with_key_uses_text_convention() {
        let config = AppConfig {
            api_key: Some("g-key".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.calling_convention(), CallingConvention::Text);
    }

    #[test]
    fn openai_uses_messages_convention() {
        let mut config = AppConfig {
            default_provider: "openai".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                api_url: None,
                default_model: Some("gpt-4o-mini".into()),
            },
        );
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.calling_convention(), CallingConvention::Messages);
        assert_eq!(model_for(&config), "gpt-4o-mini");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_ok());
    }
}
