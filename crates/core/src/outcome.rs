use serde::{Deserialize, Serialize};

/// Category of a failed request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Invalid,
    NotFound,
    Throttled,
    Unavailable,
}

/// JSON error body returned by the HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub outcome: String,
    pub kind: OutcomeKind,
    pub message: String,
}

impl Outcome {
    pub fn error(kind: OutcomeKind, message: &str) -> Self {
        Self {
            outcome: "error".to_string(),
            kind,
            message: message.to_string(),
        }
    }

    pub fn invalid(message: &str) -> Self {
        Self::error(OutcomeKind::Invalid, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::error(OutcomeKind::NotFound, message)
    }

    pub fn throttled(message: &str) -> Self {
        Self::error(OutcomeKind::Throttled, message)
    }

    pub fn unavailable(message: &str) -> Self {
        Self::error(OutcomeKind::Unavailable, message)
    }
}
