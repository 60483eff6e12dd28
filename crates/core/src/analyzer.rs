//! Rule-based symptom analyzer
//!
//! Normalizes free text, matches it against the symptom table by keyword
//! containment at word boundaries and scores each condition by the summed
//! weight of its matched keywords. Deterministic: the same text and
//! database always give the same result.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PetMateError, Result};
use crate::model::{AnalysisResult, AnalysisSource, Severity, Species};
use crate::symptoms::{SymptomDatabase, SymptomEntry};

/// Scores closer than this are treated as tied
const SCORE_EPSILON: f64 = 1e-9;

/// Lowercase, drop apostrophes, turn every other non-alphanumeric character
/// into a separator and collapse whitespace.
///
/// `"Won't EAT!!"` becomes `"wont eat"`.
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else if matches!(c, '\'' | '\u{2019}' | '`') {
            continue;
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `keyword` starts at a word boundary inside the padded haystack.
/// A keyword may be a stem: `vomit` matches `vomiting`.
fn contains_keyword(padded: &str, keyword: &str) -> bool {
    padded.contains(&format!(" {keyword}"))
}

/// Running score for one condition
struct Tally<'a> {
    condition: &'a str,
    order: usize,
    score: f64,
    lead: &'a SymptomEntry,
    keywords: Vec<String>,
}

/// Keyword-scoring analyzer over an immutable symptom table
#[derive(Debug, Clone)]
pub struct RuleAnalyzer {
    db: Arc<SymptomDatabase>,
    condition_order: HashMap<String, usize>,
}

impl RuleAnalyzer {
    pub fn new(db: Arc<SymptomDatabase>) -> Self {
        let mut condition_order = HashMap::new();
        for (idx, entry) in db.entries().iter().enumerate() {
            condition_order.entry(entry.condition.clone()).or_insert(idx);
        }
        Self {
            db,
            condition_order,
        }
    }

    pub fn database(&self) -> &SymptomDatabase {
        &self.db
    }

    /// Analyze symptom text for the given species.
    ///
    /// Returns the zero-confidence "Unknown" result when nothing matches and
    /// `AnalysisUnavailable` only when there is no table to match against.
    pub fn analyze(&self, text: &str, species: Species) -> Result<AnalysisResult> {
        if self.db.is_empty() {
            return Err(PetMateError::AnalysisUnavailable(
                "symptom database is empty".to_string(),
            ));
        }

        let normalized = normalize(text);
        if normalized.is_empty() {
            return Ok(AnalysisResult::unknown(species));
        }
        let padded = format!(" {normalized} ");

        let mut tallies: Vec<Tally<'_>> = Vec::new();
        for entry in self.db.entries() {
            if !entry.applies_to(species) || !contains_keyword(&padded, &entry.keyword) {
                continue;
            }

            match tallies.iter_mut().find(|t| t.condition == entry.condition) {
                Some(tally) => {
                    tally.score += entry.weight;
                    tally.keywords.push(entry.keyword.clone());
                    if entry.severity > tally.lead.severity {
                        tally.lead = entry;
                    }
                }
                None => tallies.push(Tally {
                    condition: &entry.condition,
                    order: self.condition_order[&entry.condition],
                    score: entry.weight,
                    lead: entry,
                    keywords: vec![entry.keyword.clone()],
                }),
            }
        }

        let Some(winner) = tallies.into_iter().reduce(pick_winner) else {
            tracing::debug!(species = %species, "No symptom keywords matched");
            return Ok(AnalysisResult::unknown(species));
        };

        let confidence = round2(winner.score / self.db.full_confidence_weight()).clamp(0.0, 1.0);
        let severity = winner.lead.severity;
        let description = if winner.lead.description.is_empty() {
            format!("Symptoms consistent with {}", winner.condition)
        } else {
            winner.lead.description.clone()
        };

        tracing::debug!(
            condition = winner.condition,
            score = winner.score,
            confidence = confidence,
            "Rule-based analysis complete"
        );

        Ok(AnalysisResult {
            condition: winner.condition.to_string(),
            confidence,
            severity,
            recommended_action: winner.lead.action_for(species),
            description,
            urgent: severity.is_urgent(),
            source: AnalysisSource::RuleBased,
            matched_keywords: winner.keywords,
        })
    }
}

/// Highest score wins; ties go to the more severe condition, then to the
/// condition that appears first in the table.
fn pick_winner<'a>(best: Tally<'a>, candidate: Tally<'a>) -> Tally<'a> {
    let diff = candidate.score - best.score;
    if diff > SCORE_EPSILON {
        return candidate;
    }
    if diff < -SCORE_EPSILON {
        return best;
    }
    let (best_sev, cand_sev): (Severity, Severity) = (best.lead.severity, candidate.lead.severity);
    if cand_sev > best_sev || (cand_sev == best_sev && candidate.order < best.order) {
        candidate
    } else {
        best
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
