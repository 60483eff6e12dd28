//! Metadata endpoint handler

use axum::{Json, extract::State};
use petmate_core::Capabilities;

use crate::AppState;

/// GET /metadata - Return service capabilities and loaded data summary
pub async fn get(State(state): State<AppState>) -> Json<Capabilities> {
    let analyzer = state.orchestrator.analyzer();
    Json(Capabilities::describe(
        analyzer.rules().database(),
        state.orchestrator.locator().database(),
        analyzer.ai_enabled(),
    ))
}
