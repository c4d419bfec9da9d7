//! Model gateway error types

use thiserror::Error;

/// Errors surfaced by a model gateway call
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request was rejected before reaching the provider
    #[error("invalid model request: {0}")]
    InvalidRequest(String),

    /// The call exceeded the configured deadline
    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The provider answered but the content is unusable
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// The provider failed outright (network, auth, server error)
    #[error("model provider error: {0}")]
    Provider(String),
}

impl ModelError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Timeout { .. } | ModelError::Provider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ModelError::Timeout { seconds: 30 }.is_transient());
        assert!(ModelError::Provider("502".into()).is_transient());
        assert!(!ModelError::InvalidRequest("empty prompt".into()).is_transient());
        assert!(!ModelError::InvalidResponse("not json".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = ModelError::Timeout { seconds: 30 };
        assert_eq!(err.to_string(), "model call timed out after 30s");
    }
}
