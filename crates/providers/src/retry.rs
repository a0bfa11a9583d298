//! Retrying provider: per-attempt timeout and bounded exponential backoff.
//!
//! Wraps any provider. Each attempt is bounded by a timeout; transient
//! failures (network, timeout, rate limit, 5xx) are retried a fixed number
//! of times, doubling the delay between attempts. Anything else fails
//! immediately.

use async_trait::async_trait;
use plandesk_core::error::ProviderError;
use plandesk_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl RetryProvider {
    /// Wrap `inner` with a 120s timeout, 2 retries, and a 500ms initial backoff.
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self {
            inner,
            timeout: Duration::from_secs(120),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Delay before retry number `retry` (1-based).
    fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    /// Backoff for `retry`, stretched to any wait the backend asked for.
    fn delay_for(&self, retry: u32, error: &ProviderError) -> Duration {
        let backoff = self.backoff_for(retry);
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        }
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn calling_convention(&self) -> CallingConvention {
        self.inner.calling_convention()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match tokio::time::timeout(self.timeout, self.inner.complete(request.clone()))
                .await
            {
                Ok(Ok(response)) => {
                    if attempt > 1 {
                        info!(provider = %self.inner.name(), attempt, "Retry: completion succeeded");
                    }
                    return Ok(response);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    self.timeout.as_secs()
                )),
            };

            if !error.is_transient() || attempt >= attempts {
                warn!(
                    provider = %self.inner.name(),
                    attempt,
                    error = %error,
                    "Retry: giving up"
                );
                return Err(error);
            }

            let delay = self.delay_for(attempt, &error);
            warn!(
                provider = %self.inner.name(),
                attempt,
                total = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retry: transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plandesk_core::message::Message;
    use std::sync::Mutex;

    /// A mock provider that fails a scripted number of times, then succeeds.
    struct FlakyProvider {
        failures: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl FlakyProvider {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn calling_convention(&self) -> CallingConvention {
            CallingConvention::Text
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let next = {
                let mut failures = self.failures.lock().unwrap();
                if failures.is_empty() {
                    None
                } else {
                    Some(failures.remove(0))
                }
            };
            match next {
                Some(e) => Err(e),
                None => Ok(ProviderResponse {
                    text: "ok".into(),
                    usage: None,
                    model: "mock".into(),
                }),
            }
        }
    }

    /// A provider that never answers.
    struct HangingProvider;

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        fn calling_convention(&self) -> CallingConvention {
            CallingConvention::Messages
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("the retry timeout fires first")
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "mock".into(),
            messages: vec![Message::user("hello")],
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let flaky = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("connection reset".into()),
            ProviderError::ApiError {
                status_code: 503,
                message: "overloaded".into(),
            },
        ]));
        let provider = RetryProvider::new(flaky.clone()).with_max_retries(2);

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_last_error() {
        let flaky = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("one".into()),
            ProviderError::Network("two".into()),
            ProviderError::Network("three".into()),
        ]));
        let provider = RetryProvider::new(flaky.clone()).with_max_retries(1);

        let err = provider.complete(request()).await.unwrap_err();
        assert!(err.to_string().contains("two"));
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let flaky = Arc::new(FlakyProvider::new(vec![ProviderError::AuthenticationFailed(
            "bad key".into(),
        )]));
        let provider = RetryProvider::new(flaky.clone()).with_max_retries(5);

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_times_out() {
        let provider = RetryProvider::new(Arc::new(HangingProvider))
            .with_timeout(Duration::from_secs(2))
            .with_max_retries(0);

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
        assert!(err.to_string().contains("hanging"));
    }

    #[test]
    fn backoff_doubles() {
        let provider = RetryProvider::new(Arc::new(HangingProvider))
            .with_backoff(Duration::from_millis(100));
        assert_eq!(provider.backoff_for(1), Duration::from_millis(100));
        assert_eq!(provider.backoff_for(2), Duration::from_millis(200));
        assert_eq!(provider.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn rate_limit_wait_overrides_shorter_backoff() {
        let provider = RetryProvider::new(Arc::new(HangingProvider))
            .with_backoff(Duration::from_millis(100));
        let limited = ProviderError::RateLimited { retry_after_secs: 7 };
        assert_eq!(provider.delay_for(1, &limited), Duration::from_secs(7));

        let brief = ProviderError::RateLimited { retry_after_secs: 0 };
        assert_eq!(provider.delay_for(2, &brief), Duration::from_millis(200));

        let network = ProviderError::Network("reset".into());
        assert_eq!(provider.delay_for(1, &network), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_retry_waits_for_retry_after() {
        let flaky = Arc::new(FlakyProvider::new(vec![ProviderError::RateLimited {
            retry_after_secs: 30,
        }]));
        let provider = RetryProvider::new(flaky.clone())
            .with_backoff(Duration::from_millis(100))
            .with_max_retries(1);

        let started = tokio::time::Instant::now();
        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(flaky.calls(), 2);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[test]
    fn delegates_identity() {
        let provider = RetryProvider::new(Arc::new(HangingProvider));
        assert_eq!(provider.name(), "hanging");
        assert_eq!(provider.calling_convention(), CallingConvention::Messages);
    }
}
