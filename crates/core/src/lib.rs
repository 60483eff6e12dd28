//! petmate-core: symptom analysis and vet lookup
//!
//! This crate holds the static symptom and hospital databases, the
//! rule-based analyzer, the vet locator and the response types shared with
//! the HTTP server.

pub mod advisory;
pub mod analyzer;
pub mod capability;
pub mod error;
pub mod hospitals;
pub mod locator;
pub mod model;
pub mod outcome;
pub mod symptoms;

pub use advisory::{Advisory, AnalysisOutcome, DISCLAIMER};
pub use analyzer::{RuleAnalyzer, normalize};
pub use capability::Capabilities;
pub use error::{PetMateError, Result, SkippedRecord};
pub use hospitals::{HospitalDatabase, HospitalEntry};
pub use locator::{HospitalQuery, RankedHospital, VetLocator, haversine_km};
pub use model::{
    AnalysisResult, AnalysisSource, Coordinates, Severity, Species, UNKNOWN_CONDITION, UserQuery,
};
pub use outcome::{Outcome, OutcomeKind};
pub use symptoms::{DuplicatePolicy, SymptomDatabase, SymptomEntry};
