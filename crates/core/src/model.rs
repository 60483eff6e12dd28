//! Shared value types: severity, species, coordinates and analysis results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Condition name used when nothing in the symptom text could be matched
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Ordinal urgency classification. Ordering follows urgency, so
/// `Severity::Emergency > Severity::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Emergency,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Emergency => "emergency",
        }
    }

    /// Whether a result at this severity should be flagged for prompt vet attention
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::High | Severity::Emergency)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive. Accepts `mild` and `severe` as aliases for
    /// `low` and `high`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "mild" => Ok(Severity::Low),
            "moderate" => Ok(Severity::Moderate),
            "high" | "severe" => Ok(Severity::High),
            "emergency" => Ok(Severity::Emergency),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pet species supported by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Species {
    Dog,
    Cat,
}

impl Species {
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
        }
    }

    /// Hospital specialty tag that covers this species
    pub fn specialty(&self) -> &'static str {
        match self {
            Species::Dog => "canine",
            Species::Cat => "feline",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dog" => Ok(Species::Dog),
            "cat" => Ok(Species::Cat),
            other => Err(format!("unsupported species '{other}' (expected dog or cat)")),
        }
    }
}

impl TryFrom<String> for Species {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A point on the earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Which path produced an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    RuleBased,
    AiGenerated,
}

/// Best-effort health insight for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub condition: String,
    /// Match strength in [0, 1], not a probability
    pub confidence: f64,
    pub severity: Severity,
    pub recommended_action: String,
    #[serde(default)]
    pub description: String,
    pub urgent: bool,
    pub source: AnalysisSource,
    /// Always present; empty for AI-generated and Unknown results
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

impl AnalysisResult {
    /// The zero-confidence result returned when no keyword matched
    pub fn unknown(species: Species) -> Self {
        Self {
            condition: UNKNOWN_CONDITION.to_string(),
            confidence: 0.0,
            severity: Severity::Moderate,
            recommended_action: format!(
                "Unknown - consult a veterinarian about your {species} if symptoms persist or worsen"
            ),
            description: "Symptoms could not be matched to a known condition".to_string(),
            urgent: false,
            source: AnalysisSource::RuleBased,
            matched_keywords: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.condition == UNKNOWN_CONDITION
    }
}

/// One symptom-intake request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub symptoms: String,
    pub species: Species,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub max_distance_km: Option<f64>,
}
