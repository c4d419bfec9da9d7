//! Bounded retry around the model gateway
//!
//! The underlying gateway performs a single outbound call per invocation;
//! retry policy is layered on top so the pipeline sees it as one call. Only
//! transient failures (timeouts, provider errors) are retried. Streaming
//! calls are never retried since a partially-consumed stream cannot be
//! replayed.

use super::error::ModelError;
use super::gateway::{ContentStream, ModelGateway};
use super::types::ModelPrompt;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient model failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    /// Backoff before the first retry; doubles per retry
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy that disables retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }
}

/// Gateway decorator adding bounded retry with exponential backoff
pub struct RetryingGateway {
    inner: Arc<dyn ModelGateway>,
    policy: RetryPolicy,
}

impl RetryingGateway {
    pub fn new(inner: Arc<dyn ModelGateway>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ModelGateway for RetryingGateway {
    async fn generate(&self, prompt: ModelPrompt) -> Result<String, ModelError> {
        let mut backoff = self.policy.initial_backoff;
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts.max(1) {
            match self.inner.generate(prompt.clone()).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "transient model failure, retrying"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ModelError::Provider("retry budget exhausted".into())))
    }

    async fn generate_stream(&self, prompt: ModelPrompt) -> Result<ContentStream, ModelError> {
        self.inner.generate_stream(prompt).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model_info(&self) -> Option<String> {
        self.inner.model_info()
    }
}
