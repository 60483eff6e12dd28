//! AI usage statistics endpoint

use axum::{Json, extract::State};

use crate::AppState;
use crate::ai::UsageStats;

/// GET /api/stats - AI calls, fallbacks, tokens and cache hits since startup
pub async fn get(State(state): State<AppState>) -> Json<UsageStats> {
    Json(state.orchestrator.analyzer().stats())
}
