//! Hospital Database: static list of veterinary hospitals

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{PetMateError, Result, SkippedRecord};
use crate::model::{Coordinates, Species};

/// Highest rating a hospital can carry
pub const MAX_RATING: f64 = 5.0;

/// A veterinary hospital record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub rating: f64,
    pub phone: String,
    /// Open 24/7 for emergencies
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl HospitalEntry {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Whether the hospital treats the species. Hospitals without listed
    /// specialties are general practices.
    pub fn treats(&self, species: Species) -> bool {
        self.specialties.is_empty()
            || self.specialties.iter().any(|s| {
                s.eq_ignore_ascii_case(species.specialty()) || s.eq_ignore_ascii_case("general")
            })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must be non-empty".to_string());
        }
        if !self.coordinates().is_valid() {
            return Err(format!(
                "invalid coordinates ({}, {})",
                self.latitude, self.longitude
            ));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(format!("rating {} outside 0-5", self.rating));
        }
        Ok(())
    }
}

/// Immutable hospital list
#[derive(Debug, Clone, Default)]
pub struct HospitalDatabase {
    hospitals: Vec<HospitalEntry>,
    skipped: Vec<SkippedRecord>,
}

impl HospitalDatabase {
    /// Load the database from a JSON file. Same semantics as the symptom
    /// table: whole-file failures are fatal, bad records are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PetMateError::DataLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let db = Self::from_json_str(&raw).map_err(|e| match e {
            PetMateError::InvalidData(reason) => PetMateError::DataLoad {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::info!(
            path = %path.display(),
            hospitals = db.len(),
            skipped = db.skipped.len(),
            "Hospital database loaded"
        );
        Ok(db)
    }

    /// Parse from JSON text: `{"hospitals": [...]}` or a bare array
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: JsonValue = serde_json::from_str(raw)
            .map_err(|e| PetMateError::InvalidData(format!("Malformed JSON: {}", e)))?;

        let records = match doc {
            JsonValue::Array(records) => records,
            JsonValue::Object(mut obj) => match obj.remove("hospitals") {
                Some(JsonValue::Array(records)) => records,
                _ => {
                    return Err(PetMateError::InvalidData(
                        "Expected a 'hospitals' array".to_string(),
                    ));
                }
            },
            _ => {
                return Err(PetMateError::InvalidData(
                    "Expected an array or object at the top level".to_string(),
                ));
            }
        };

        let mut hospitals = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let parsed = serde_json::from_value::<HospitalEntry>(record)
                .map_err(|e| e.to_string())
                .and_then(|h| h.validate().map(|_| h));
            match parsed {
                Ok(hospital) => hospitals.push(hospital),
                Err(reason) => {
                    tracing::warn!(record = index, reason = %reason, "Skipping malformed hospital record");
                    skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        Ok(Self { hospitals, skipped })
    }

    pub fn from_entries(hospitals: Vec<HospitalEntry>) -> Self {
        Self {
            hospitals,
            skipped: Vec::new(),
        }
    }

    pub fn hospitals(&self) -> &[HospitalEntry] {
        &self.hospitals
    }

    pub fn len(&self) -> usize {
        self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospitals.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }
}
