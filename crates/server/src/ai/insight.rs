//! Prompt construction and strict validation of model replies

use petmate_core::{AnalysisResult, AnalysisSource, Severity, Species};
use serde_json::{Map, Value as JsonValue};

use super::provider::AiError;

/// Longest slice of user text embedded in a prompt, in characters
pub const MAX_SYMPTOM_CHARS: usize = 1000;

pub const SYSTEM_PROMPT: &str = r#"You are a veterinary triage assistant for dogs and cats. Read the owner's description of their pet's symptoms and give a brief, cautious assessment.

Return ONLY a JSON object with exactly these keys:
- "condition": string (short name of the most likely condition)
- "confidence": number between 0 and 1
- "severity": one of "low", "moderate", "high", "emergency"
- "description": string (one sentence)
- "action": string (what the owner should do next; mention a veterinarian when appropriate)
- "urgent": boolean

Do not include any other text."#;

/// Build the user prompt, bounding the embedded symptom text
pub fn build_user_prompt(symptoms: &str, species: Species) -> String {
    let bounded: String = symptoms.trim().chars().take(MAX_SYMPTOM_CHARS).collect();
    format!("Pet: {species}. Symptoms: {bounded}")
}

/// Parse a model reply into an analysis result.
///
/// Every field is checked. Anything missing, mistyped or out of range is
/// rejected as a whole; partial replies are never returned.
pub fn parse_insight(text: &str) -> Result<AnalysisResult, AiError> {
    let json_str = extract_json(text)?;
    let value: JsonValue = serde_json::from_str(&json_str)
        .map_err(|e| AiError::Malformed(format!("Reply is not valid JSON: {}", e)))?;
    let obj = value
        .as_object()
        .ok_or_else(|| AiError::Malformed("Reply is not a JSON object".to_string()))?;

    let condition = required_str(obj, &["condition", "condition_name"])?;

    let confidence = obj
        .get("confidence")
        .ok_or_else(|| AiError::Malformed("Missing field 'confidence'".to_string()))?
        .as_f64()
        .ok_or_else(|| AiError::Malformed("Field 'confidence' is not a number".to_string()))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(AiError::Malformed(format!(
            "Confidence {} outside [0, 1]",
            confidence
        )));
    }

    let severity: Severity = required_str(obj, &["severity"])?
        .parse()
        .map_err(AiError::Malformed)?;

    let recommended_action = required_str(obj, &["action", "recommended_action"])?;

    let description = match obj.get("description") {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(AiError::Malformed(
                "Field 'description' is not a string".to_string(),
            ));
        }
    };

    let urgent = match obj.get("urgent") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(_) => {
            return Err(AiError::Malformed(
                "Field 'urgent' is not a boolean".to_string(),
            ));
        }
    };

    Ok(AnalysisResult {
        condition,
        confidence,
        severity,
        recommended_action,
        description,
        urgent: urgent || severity.is_urgent(),
        source: AnalysisSource::AiGenerated,
        matched_keywords: Vec::new(),
    })
}

/// First non-empty string found under any of `keys`
fn required_str(obj: &Map<String, JsonValue>, keys: &[&str]) -> Result<String, AiError> {
    for key in keys {
        match obj.get(*key) {
            Some(JsonValue::String(s)) if !s.trim().is_empty() => return Ok(s.trim().to_string()),
            Some(JsonValue::Null) | None => continue,
            Some(_) => {
                return Err(AiError::Malformed(format!(
                    "Field '{}' must be a non-empty string",
                    key
                )));
            }
        }
    }
    Err(AiError::Malformed(format!("Missing field '{}'", keys[0])))
}

/// Extract a JSON object from text that might contain markdown code blocks
fn extract_json(text: &str) -> Result<String, AiError> {
    let trimmed = text.trim();

    // Direct JSON object
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    // Wrapped in ```json ... ```
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return Ok(after[..end].trim().to_string());
        }
    }

    // Wrapped in ``` ... ```
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            return Ok(after[..end].trim().to_string());
        }
    }

    // Prose around a bare object: take the outermost braces
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(trimmed[start..=end].to_string());
        }
    }

    Err(AiError::Malformed(
        "Could not find a JSON object in the reply".to_string(),
    ))
}
