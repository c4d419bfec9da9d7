//! Configuration management for mealscope
//!
//! Settings load from environment variables with sensible defaults and are
//! passed explicitly into the pipeline constructors; there is no process-wide
//! mutable configuration.
//!
//! # Environment Variables
//!
//! - `MEALSCOPE_PROVIDER`: Provider selection (ollama|openai|claude|gemini|grok|groq) - default: "ollama"
//! - `MEALSCOPE_VISION_MODEL`: Model for image understanding - default: "qwen2.5vl:7b"
//! - `MEALSCOPE_ANALYSIS_MODEL`: Model for structured analysis - default: "qwen2.5:7b"
//! - `MEALSCOPE_REQUEST_TIMEOUT`: Per-call timeout in seconds - default: "60"
//! - `MEALSCOPE_RETRY_ATTEMPTS`: Total model attempts per call - default: "3"
//! - `MEALSCOPE_CACHE_TTL`: Knowledge cache TTL in seconds - default: "3600"
//! - `MEALSCOPE_CACHE_CAPACITY`: Max cached entries - default: "1024"
//! - `MEALSCOPE_RETRIEVAL_TOP_K`: Snippets per retrieval query - default: "2"
//! - `MEALSCOPE_LOG_LEVEL`: Logging level - default: "info"
//!
//! Provider credentials are read directly by the genai library
//! (`OLLAMA_HOST`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY`, ...).

use crate::knowledge::DEFAULT_TOP_K;
use crate::model::{GenAiGateway, ModelGateway, Provider, RetryPolicy, RetryingGateway};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_VISION_MODEL: &str = "qwen2.5vl:7b";
const DEFAULT_ANALYSIS_MODEL: &str = "qwen2.5:7b";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_ATTEMPTS: usize = 3;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_CAPACITY: u64 = 1024;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for mealscope
#[derive(Debug, Clone)]
pub struct MealscopeConfig {
    /// LLM provider
    pub provider: Provider,

    /// Model used for image understanding
    pub vision_model: String,

    /// Model used for structured analysis and advice
    pub analysis_model: String,

    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,

    /// Total model attempts per call, including the first
    pub retry_attempts: usize,

    /// Knowledge cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Maximum cached knowledge entries
    pub cache_capacity: u64,

    /// Snippets fetched per retrieval query
    pub retrieval_top_k: usize,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for MealscopeConfig {
    /// Loads configuration from environment variables with defaults
    fn default() -> Self {
        let provider = env::var("MEALSCOPE_PROVIDER")
            .ok()
            .and_then(|s| Provider::from_str(&s).ok())
            .unwrap_or(Provider::Ollama);

        let vision_model = env::var("MEALSCOPE_VISION_MODEL")
            .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string());
        let analysis_model = env::var("MEALSCOPE_ANALYSIS_MODEL")
            .unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL.to_string());

        let request_timeout_secs = env::var("MEALSCOPE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let retry_attempts = env::var("MEALSCOPE_RETRY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS);

        let cache_ttl_secs = env::var("MEALSCOPE_CACHE_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let cache_capacity = env::var("MEALSCOPE_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        let retrieval_top_k = env::var("MEALSCOPE_RETRIEVAL_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOP_K);

        let log_level = env::var("MEALSCOPE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            vision_model,
            analysis_model,
            request_timeout_secs,
            retry_attempts,
            cache_ttl_secs,
            cache_capacity,
            retrieval_top_k,
            log_level,
        }
    }
}

impl MealscopeConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "retry attempts must be at least 1".to_string(),
            ));
        }

        if self.retrieval_top_k == 0 {
            return Err(ConfigError::ValidationFailed(
                "retrieval top-k must be at least 1".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            ..RetryPolicy::default()
        }
    }

    /// Creates the vision gateway with retry layered on top
    pub fn create_vision_gateway(&self) -> Arc<dyn ModelGateway> {
        let inner: Arc<dyn ModelGateway> = Arc::new(GenAiGateway::new(
            self.provider,
            self.vision_model.clone(),
            self.request_timeout(),
        ));
        Arc::new(RetryingGateway::new(inner, self.retry_policy()))
    }

    /// Creates the analysis gateway with retry layered on top
    pub fn create_analysis_gateway(&self) -> Arc<dyn ModelGateway> {
        let inner: Arc<dyn ModelGateway> = Arc::new(GenAiGateway::new(
            self.provider,
            self.analysis_model.clone(),
            self.request_timeout(),
        ));
        Arc::new(RetryingGateway::new(inner, self.retry_policy()))
    }
}

impl fmt::Display for MealscopeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mealscope Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Vision Model: {}", self.vision_model)?;
        writeln!(f, "  Analysis Model: {}", self.analysis_model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Retry Attempts: {}", self.retry_attempts)?;
        writeln!(f, "  Cache TTL: {}s", self.cache_ttl_secs)?;
        writeln!(f, "  Cache Capacity: {}", self.cache_capacity)?;
        writeln!(f, "  Retrieval Top-K: {}", self.retrieval_top_k)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> MealscopeConfig {
        MealscopeConfig {
            provider: Provider::Ollama,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            retrieval_top_k: DEFAULT_TOP_K,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    #[test]
    fn test_base_configuration_is_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = base_config();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_excessive_timeout() {
        let mut config = base_config();
        config.request_timeout_secs = 601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let mut config = base_config();
        config.retry_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", base_config());
        assert!(display.contains("Mealscope Configuration:"));
        assert!(display.contains("Vision Model:"));
    }
}
