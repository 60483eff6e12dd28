//! Boundary between the adapter and a generative-model service

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures on the AI path. All of them are absorbed by the rule-based
/// fallback and never reach the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("AI service error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed AI response: {0}")]
    Malformed(String),

    #[error("AI calls paused for another {0:?} after repeated failures")]
    CoolingDown(Duration),
}

impl AiError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Http(_) => "http",
            AiError::Status { status: 429, .. } => "quota",
            AiError::Status { .. } => "status",
            AiError::Timeout(_) => "timeout",
            AiError::Malformed(_) => "malformed",
            AiError::CoolingDown(_) => "cooling_down",
        }
    }

    /// Transport errors and server-side 5xx may succeed on a second try.
    /// Timeouts and quota errors are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Http(_) => true,
            AiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Raw text reply from the model and the tokens it cost
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens: u64,
}

/// A generative-model service that turns a prompt into text
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(AiError::Http("reset".into()).is_retryable());
        assert!(
            AiError::Status {
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            !AiError::Status {
                status: 429,
                message: "quota".into()
            }
            .is_retryable()
        );
        assert!(!AiError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!AiError::Malformed("x".into()).is_retryable());
    }

    #[test]
    fn quota_has_its_own_kind() {
        let err = AiError::Status {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(err.kind(), "quota");
    }
}
