//! Symptom-intake endpoint

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use petmate_core::{Advisory, UserQuery};

use crate::AppState;
use crate::error::AppError;

/// Longest accepted symptom description, in characters
pub const MAX_SYMPTOM_LENGTH: usize = 5000;

/// POST /api/analyze - Analyze symptoms and list nearby hospitals
///
/// Whitespace-only symptom text is accepted and yields the "Unknown"
/// result. A missing or invalid location just means no hospitals.
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> Result<Json<Advisory>, AppError> {
    let Json(query) = body?;

    if query.symptoms.chars().count() > MAX_SYMPTOM_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Symptom description exceeds {} characters",
            MAX_SYMPTOM_LENGTH
        )));
    }

    tracing::info!(
        species = %query.species,
        has_location = query.location.is_some(),
        location_valid = query.location.is_some_and(|l| l.is_valid()),
        "Analyze request"
    );

    Ok(Json(state.orchestrator.handle(query).await))
}
