pub mod analyze;
pub mod health;
pub mod hospitals;
pub mod metadata;
pub mod metrics;
pub mod stats;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Build PetMate API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze::analyze))
        .route("/hospitals", get(hospitals::search))
        .route("/stats", get(stats::get))
}
