//! Symptom Database: keyword → condition table loaded once at startup

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::analyzer::normalize;
use crate::error::{PetMateError, Result, SkippedRecord};
use crate::model::{Severity, Species};

/// Weight given to a keyword when the record does not set one
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Aggregate matched weight at which a condition reaches full confidence
pub const DEFAULT_FULL_CONFIDENCE_WEIGHT: f64 = 3.0;

/// How to resolve a keyword listed twice with different severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the load
    #[default]
    Reject,
    /// Keep the entry that appeared first
    KeepFirst,
    /// Keep the more severe entry
    PreferSevere,
}

/// One keyword and the condition it points to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomEntry {
    /// Normalized keyword or phrase (lowercase, punctuation stripped)
    pub keyword: String,
    pub condition: String,
    pub severity: Severity,
    pub action: String,
    pub description: String,
    pub weight: f64,
    /// Species the entry is limited to; `None` means every species
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<Vec<Species>>,
}

impl SymptomEntry {
    pub fn applies_to(&self, species: Species) -> bool {
        self.species
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&species))
    }

    /// Whether some species could see both entries
    pub fn shares_species_with(&self, other: &SymptomEntry) -> bool {
        match (&self.species, &other.species) {
            (Some(mine), Some(theirs)) => mine.iter().any(|s| theirs.contains(s)),
            _ => true,
        }
    }

    /// Action text with the `{pet}` placeholder filled in
    pub fn action_for(&self, species: Species) -> String {
        self.action.replace("{pet}", species.as_str())
    }
}

/// On-disk shape of a symptom record
#[derive(Debug, Deserialize)]
struct SymptomRecord {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    keyword: Option<String>,
    condition: String,
    severity: Severity,
    action: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    species: Option<Vec<Species>>,
}

/// Immutable symptom table
#[derive(Debug, Clone, Default)]
pub struct SymptomDatabase {
    entries: Vec<SymptomEntry>,
    full_confidence_weight: f64,
    skipped: Vec<SkippedRecord>,
}

impl SymptomDatabase {
    /// Load the database from a JSON file.
    ///
    /// An unreadable or unparseable file is fatal; individual malformed
    /// records are skipped with a warning.
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
            entries = db.len(),
            conditions = db.condition_count(),
            skipped = db.skipped.len(),
            "Symptom database loaded"
        );
        Ok(db)
    }

    /// Parse a database from JSON text.
    ///
    /// Accepts either a bare array of records or an object with a
    /// `symptoms` array and optional `duplicate_policy` and
    /// `full_confidence_weight` settings.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: JsonValue = serde_json::from_str(raw)
            .map_err(|e| PetMateError::InvalidData(format!("Malformed JSON: {}", e)))?;

        let (records, policy, full_weight) = match doc {
            JsonValue::Array(records) => (records, DuplicatePolicy::default(), None),
            JsonValue::Object(mut obj) => {
                let records = match obj.remove("symptoms") {
                    Some(JsonValue::Array(records)) => records,
                    _ => {
                        return Err(PetMateError::InvalidData(
                            "Expected a 'symptoms' array".to_string(),
                        ));
                    }
                };
                let policy = match obj.remove("duplicate_policy") {
                    Some(v) => serde_json::from_value(v).map_err(|e| {
                        PetMateError::InvalidData(format!("Invalid duplicate_policy: {}", e))
                    })?,
                    None => DuplicatePolicy::default(),
                };
                let full_weight = match obj.remove("full_confidence_weight") {
                    Some(v) => Some(v.as_f64().filter(|w| w.is_finite() && *w > 0.0).ok_or_else(
                        || {
                            PetMateError::InvalidData(
                                "full_confidence_weight must be a positive number".to_string(),
                            )
                        },
                    )?),
                    None => None,
                };
                (records, policy, full_weight)
            }
            _ => {
                return Err(PetMateError::InvalidData(
                    "Expected an array or object at the top level".to_string(),
                ));
            }
        };

        let mut builder = Builder::new(policy);
        for (index, record) in records.into_iter().enumerate() {
            builder.push(index, record)?;
        }

        Ok(Self {
            entries: builder.entries,
            full_confidence_weight: full_weight.unwrap_or(DEFAULT_FULL_CONFIDENCE_WEIGHT),
            skipped: builder.skipped,
        })
    }

    pub fn entries(&self) -> &[SymptomEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn full_confidence_weight(&self) -> f64 {
        self.full_confidence_weight
    }

    /// Number of distinct condition names
    pub fn condition_count(&self) -> usize {
        let mut names: Vec<&str> = self.entries.iter().map(|e| e.condition.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

/// Accumulates entries while enforcing keyword uniqueness
struct Builder {
    policy: DuplicatePolicy,
    entries: Vec<SymptomEntry>,
    /// Entry indices per keyword; more than one only for disjoint species scopes
    by_keyword: HashMap<String, Vec<usize>>,
    skipped: Vec<SkippedRecord>,
}

impl Builder {
    fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            by_keyword: HashMap::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, index: usize, reason: String) {
        tracing::warn!(record = index, reason = %reason, "Skipping malformed symptom record");
        self.skipped.push(SkippedRecord { index, reason });
    }

    fn push(&mut self, index: usize, value: JsonValue) -> Result<()> {
        let record: SymptomRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                self.skip(index, e.to_string());
                return Ok(());
            }
        };

        let condition = record.condition.trim().to_string();
        let action = record.action.trim().to_string();
        if condition.is_empty() || action.is_empty() {
            self.skip(index, "condition and action must be non-empty".to_string());
            return Ok(());
        }

        let weight = record.weight.unwrap_or(DEFAULT_WEIGHT);
        if !weight.is_finite() || weight <= 0.0 {
            self.skip(index, format!("weight must be positive, got {}", weight));
            return Ok(());
        }

        if record.species.as_ref().is_some_and(|s| s.is_empty()) {
            self.skip(index, "species list is empty".to_string());
            return Ok(());
        }

        let mut keywords: Vec<String> = record
            .keywords
            .iter()
            .chain(record.keyword.iter())
            .map(|k| normalize(k))
            .filter(|k| !k.is_empty())
            .collect();
        keywords.dedup();
        if keywords.is_empty() {
            self.skip(index, "record has no usable keywords".to_string());
            return Ok(());
        }

        for keyword in keywords {
            let entry = SymptomEntry {
                keyword,
                condition: condition.clone(),
                severity: record.severity,
                action: action.clone(),
                description: record.description.trim().to_string(),
                weight,
                species: record.species.clone(),
            };
            self.insert(entry)?;
        }
        Ok(())
    }

    fn insert(&mut self, entry: SymptomEntry) -> Result<()> {
        let existing = self.by_keyword.get(&entry.keyword).and_then(|indices| {
            indices
                .iter()
                .copied()
                .find(|&i| self.entries[i].shares_species_with(&entry))
        });
        let Some(existing) = existing else {
            self.by_keyword
                .entry(entry.keyword.clone())
                .or_default()
                .push(self.entries.len());
            self.entries.push(entry);
            return Ok(());
        };

        let current = &self.entries[existing];
        if current.severity == entry.severity {
            tracing::debug!(keyword = %entry.keyword, "Duplicate keyword merged");
            return Ok(());
        }

        match self.policy {
            DuplicatePolicy::Reject => Err(PetMateError::ConflictingKeyword {
                keyword: entry.keyword,
                first: current.severity,
                second: entry.severity,
            }),
            DuplicatePolicy::KeepFirst => {
                tracing::warn!(keyword = %entry.keyword, "Conflicting duplicate keyword ignored");
                Ok(())
            }
            DuplicatePolicy::PreferSevere => {
                if entry.severity > current.severity {
                    tracing::warn!(
                        keyword = %entry.keyword,
                        severity = %entry.severity,
                        "Conflicting duplicate keyword replaced by more severe entry"
                    );
                    self.entries[existing] = entry;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_object_form_with_settings() {
        let db = SymptomDatabase::from_json_str(
            r#"{
                "duplicate_policy": "keep_first",
                "full_confidence_weight": 2.0,
                "symptoms": [
                    {"keywords": ["Vomiting", "won't eat"], "condition": "Digestive Upset",
                     "severity": "moderate", "action": "See a vet"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.full_confidence_weight(), 2.0);
        assert_eq!(db.entries()[0].keyword, "vomiting");
        assert_eq!(db.entries()[1].keyword, "wont eat");
        assert_eq!(db.entries()[0].weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn loads_bare_array_with_single_keyword_field() {
        let db = SymptomDatabase::from_json_str(
            r#"[{"keyword": "cough", "condition": "Respiratory Issue",
                 "severity": "mild", "action": "Monitor your {pet}"}]"#,
        )
        .unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.entries()[0].severity, Severity::Low);
        assert_eq!(db.entries()[0].action_for(Species::Cat), "Monitor your cat");
    }

    #[test]
    fn skips_malformed_records() {
        let db = SymptomDatabase::from_json_str(
            r#"[
                {"keyword": "limp", "condition": "Leg Injury", "severity": "moderate", "action": "Rest"},
                {"keyword": "itch", "condition": "Skin", "severity": "unheard-of", "action": "x"},
                {"keyword": "sneeze", "condition": "Cold", "severity": "low", "action": "x", "weight": -1},
                {"keywords": ["!!!"], "condition": "Nothing", "severity": "low", "action": "x"},
                {"keyword": "eye", "condition": "", "severity": "low", "action": "x"},
                42
            ]"#,
        )
        .unwrap();

        assert_eq!(db.len(), 1);
        let skipped: Vec<usize> = db.skipped().iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn keywords_are_case_insensitive_and_deduplicated() {
        let db = SymptomDatabase::from_json_str(
            r#"[
                {"keywords": ["Cough", "COUGH"], "condition": "A", "severity": "low", "action": "x"},
                {"keyword": "cough", "condition": "B", "severity": "low", "action": "y"}
            ]"#,
        )
        .unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.entries()[0].condition, "A");
    }

    #[test]
    fn contradictory_duplicates_fail_by_default() {
        let err = SymptomDatabase::from_json_str(
            r#"[
                {"keyword": "seizure", "condition": "A", "severity": "high", "action": "x"},
                {"keyword": "Seizure", "condition": "B", "severity": "emergency", "action": "y"}
            ]"#,
        )
        .unwrap_err();

        assert!(matches!(err, PetMateError::ConflictingKeyword { .. }));
        assert!(err.is_fatal_load());
    }

    #[test]
    fn prefer_severe_policy_replaces_in_place() {
        let db = SymptomDatabase::from_json_str(
            r#"{"duplicate_policy": "prefer_severe", "symptoms": [
                {"keyword": "seizure", "condition": "A", "severity": "high", "action": "x"},
                {"keyword": "limp", "condition": "C", "severity": "low", "action": "z"},
                {"keyword": "seizure", "condition": "B", "severity": "emergency", "action": "y"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.entries()[0].condition, "B");
        assert_eq!(db.entries()[0].severity, Severity::Emergency);
    }

    #[test]
    fn unparseable_document_is_fatal() {
        assert!(SymptomDatabase::from_json_str("not json").is_err());
        assert!(SymptomDatabase::from_json_str(r#"{"entries": []}"#).is_err());
        assert!(SymptomDatabase::from_json_str(r#""text""#).is_err());
        assert!(
            SymptomDatabase::from_json_str(r#"{"duplicate_policy": "coin_flip", "symptoms": []}"#)
                .is_err()
        );
    }

    #[test]
    fn missing_file_is_data_load_error() {
        let err = SymptomDatabase::load("/nonexistent/petmate/symptoms.json").unwrap_err();
        assert!(matches!(err, PetMateError::DataLoad { .. }));
    }

    #[test]
    fn disjoint_species_scopes_do_not_collide() {
        let db = SymptomDatabase::from_json_str(
            r#"[
                {"keyword": "hacking", "condition": "Hairball", "severity": "low",
                 "action": "x", "species": ["cat"]},
                {"keyword": "hacking", "condition": "Kennel Cough", "severity": "low",
                 "action": "y", "species": ["dog"]},
                {"keyword": "retching", "condition": "Hairball", "severity": "low",
                 "action": "x", "species": ["cat"]},
                {"keyword": "retching", "condition": "Bloat", "severity": "emergency",
                 "action": "z", "species": ["dog"]}
            ]"#,
        )
        .unwrap();

        assert_eq!(db.len(), 4);
        let dog: Vec<&str> = db
            .entries()
            .iter()
            .filter(|e| e.applies_to(Species::Dog))
            .map(|e| e.condition.as_str())
            .collect();
        assert_eq!(dog, vec!["Kennel Cough", "Bloat"]);
    }

    #[test]
    fn overlapping_species_scopes_still_conflict() {
        let err = SymptomDatabase::from_json_str(
            r#"[
                {"keyword": "hacking", "condition": "Hairball", "severity": "low",
                 "action": "x", "species": ["cat"]},
                {"keyword": "hacking", "condition": "Cough", "severity": "moderate",
                 "action": "y"}
            ]"#,
        )
        .unwrap_err();

        assert!(matches!(err, PetMateError::ConflictingKeyword { .. }));
    }

    #[test]
    fn species_scoped_entries() {
        let db = SymptomDatabase::from_json_str(
            r#"[{"keyword": "hairball", "condition": "Hairball", "severity": "low",
                 "action": "x", "species": ["cat"]}]"#,
        )
        .unwrap();

        assert!(db.entries()[0].applies_to(Species::Cat));
        assert!(!db.entries()[0].applies_to(Species::Dog));
    }
}
