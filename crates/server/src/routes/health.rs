//! Health check endpoint

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use petmate_core::Outcome;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    ai_enabled: bool,
}

/// GET /health - Report whether symptom analysis can be served
pub async fn check(State(state): State<AppState>) -> Response {
    let analyzer = state.orchestrator.analyzer();
    if analyzer.rules().database().is_empty() {
        tracing::error!("Health check failed: symptom database is empty");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Outcome::unavailable("Symptom database is empty")),
        )
            .into_response();
    }

    Json(HealthResponse {
        status: "healthy".to_string(),
        ai_enabled: analyzer.ai_enabled(),
    })
    .into_response()
}
