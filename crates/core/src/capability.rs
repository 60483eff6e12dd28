use serde::{Deserialize, Serialize};

use crate::advisory::DISCLAIMER;
use crate::hospitals::HospitalDatabase;
use crate::model::{Severity, Species};
use crate::symptoms::SymptomDatabase;

/// What this instance can do, with a summary of the loaded data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub name: String,
    pub version: String,
    pub species: Vec<Species>,
    pub severities: Vec<Severity>,
    pub symptom_keywords: usize,
    pub conditions: usize,
    pub hospitals: usize,
    pub skipped_records: usize,
    pub ai_enabled: bool,
    pub disclaimer: String,
}

impl Capabilities {
    /// Describe a running instance
    pub fn describe(
        symptoms: &SymptomDatabase,
        hospitals: &HospitalDatabase,
        ai_enabled: bool,
    ) -> Self {
        Self {
            name: "PetMate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            species: vec![Species::Dog, Species::Cat],
            severities: Severity::ALL.to_vec(),
            symptom_keywords: symptoms.len(),
            conditions: symptoms.condition_count(),
            hospitals: hospitals.len(),
            skipped_records: symptoms.skipped().len() + hospitals.skipped().len(),
            ai_enabled,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}
