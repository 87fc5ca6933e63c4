use std::time::Duration;

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use tracing::{info, warn};

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::prompt::MEDICAL_ASSISTANT_PREAMBLE;

/// The single boundary to the external text-generation service: an
/// instruction string in, generated text out. An empty response is an error,
/// never a value, so callers can cache results without a sentinel.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Production client backed by an OpenRouter agent.
pub struct OpenRouterClient {
    agent: rig::agent::Agent<rig::providers::openrouter::CompletionModel>,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &GenerationConfig) -> Self {
        let client = rig::providers::openrouter::Client::new(&config.api_key);
        let agent = client
            .agent(&config.model)
            .preamble(MEDICAL_ASSISTANT_PREAMBLE)
            .build();
        Self {
            agent,
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl GenerationClient for OpenRouterClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        info!(
            model = %self.model,
            prompt_chars = prompt.len(),
            "dispatching generation request"
        );

        let response = self
            .agent
            .prompt(prompt)
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        if response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        info!(response_chars = response.len(), "generation request completed");
        Ok(response)
    }
}

/// Decorator that retries a failing client with doubling backoff. Callers
/// depend only on [`GenerationClient`], so resilience policy can change
/// without touching them.
pub struct RetryingClient<C> {
    inner: C,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for RetryingClient<C> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.max_attempts => {
                    warn!(attempt, error = %err, "generation attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails a fixed number of times before succeeding.
    struct FlakyClient {
        calls: AtomicU32,
        failures_before_success: u32,
    }

    impl FlakyClient {
        fn new(failures_before_success: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success,
            }
        }
    }

    #[async_trait]
    impl GenerationClient for FlakyClient {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(GenerationError::Backend("transient failure".to_string()))
            } else {
                Ok("recovered".to_string())
            }
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let client = RetryingClient::new(FlakyClient::new(2), 3, Duration::from_millis(1));
        let text = client.generate("prompt").await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_error_when_attempts_exhausted() {
        let client = RetryingClient::new(FlakyClient::new(5), 2, Duration::from_millis(1));
        let result = client.generate("prompt").await;
        assert!(matches!(result, Err(GenerationError::Backend(_))));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn single_attempt_does_not_retry() {
        let client = RetryingClient::new(FlakyClient::new(1), 1, Duration::from_millis(1));
        assert!(client.generate("prompt").await.is_err());
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }
}
