use std::path::PathBuf;

use crate::model::Severity;
use serde::Serialize;
use thiserror::Error;

/// PetMate core error types
#[derive(Debug, Error)]
pub enum PetMateError {
    #[error("Failed to load {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(
        "Keyword '{keyword}' maps to both {first} and {second} severity with no precedence rule"
    )]
    ConflictingKeyword {
        keyword: String,
        first: Severity,
        second: Severity,
    },

    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),
}

impl PetMateError {
    /// True for errors that make a static database unusable at startup
    pub fn is_fatal_load(&self) -> bool {
        matches!(
            self,
            PetMateError::DataLoad { .. }
                | PetMateError::InvalidData(_)
                | PetMateError::ConflictingKeyword { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PetMateError>;

/// A malformed record that was ignored while loading a static database.
/// Not an error: loading continues with the remaining records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}
