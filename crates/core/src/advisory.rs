use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locator::RankedHospital;
use crate::model::{AnalysisResult, Species};

/// Attached to every advisory response
pub const DISCLAIMER: &str = "PetMate provides advisory information only and is not a \
substitute for professional veterinary diagnosis. If your pet is in distress, contact a \
veterinarian immediately.";

/// Either an analysis or an explicit marker that none could be produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Available(AnalysisResult),
    Unavailable { reason: String },
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Available(result) => Some(result),
            AnalysisOutcome::Unavailable { .. } => None,
        }
    }
}

/// Combined response for one symptom-intake query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub species: Species,
    pub analysis: AnalysisOutcome,
    pub hospitals: Vec<RankedHospital>,
    pub disclaimer: String,
}

impl Advisory {
    pub fn new(species: Species, analysis: AnalysisOutcome, hospitals: Vec<RankedHospital>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            species,
            analysis,
            hospitals,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}
