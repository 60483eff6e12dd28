//! petmate-server library crate
//!
//! Exposes `AppState`, `build_app` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod ai;
pub mod config;
mod error;
mod middleware;
pub mod orchestrator;
mod routes;

use std::sync::Arc;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use petmate_core::{HospitalDatabase, PetMateError, RuleAnalyzer, SymptomDatabase, VetLocator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ai::{AiAnalyzer, ClaudeClient, InsightProvider};
use config::Config;
use orchestrator::Orchestrator;

/// Shared, read-only application state
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Load both databases from disk and wire the AI client when a key is set.
    ///
    /// An unreadable database file is fatal; malformed records inside a
    /// readable file are skipped during load.
    pub fn load(config: &Config) -> Result<Self, PetMateError> {
        let symptoms = SymptomDatabase::load(&config.symptom_db_path)?;
        let hospitals = HospitalDatabase::load(&config.hospital_db_path)?;

        let provider = config.ai.api_key.as_ref().map(|key| {
            let client = ClaudeClient::new(key.clone())
                .with_base_url(&config.ai.base_url)
                .with_model(&config.ai.model)
                .with_sampling(config.ai.max_tokens, config.ai.temperature)
                .with_timeout(config.ai.timeout);
            Arc::new(client) as Arc<dyn InsightProvider>
        });

        Ok(Self::new(symptoms, hospitals, provider, config))
    }

    /// Assemble state from already-loaded databases
    pub fn new(
        symptoms: SymptomDatabase,
        hospitals: HospitalDatabase,
        provider: Option<Arc<dyn InsightProvider>>,
        config: &Config,
    ) -> Self {
        tracing::info!(
            symptom_keywords = symptoms.len(),
            conditions = symptoms.condition_count(),
            hospitals = hospitals.len(),
            ai_enabled = provider.is_some(),
            "Databases loaded"
        );

        let rules = RuleAnalyzer::new(Arc::new(symptoms));
        let analyzer = AiAnalyzer::new(rules, provider, &config.ai);
        let locator = VetLocator::new(Arc::new(hospitals));

        Self {
            orchestrator: Arc::new(Orchestrator::new(
                Arc::new(analyzer),
                locator,
                config.default_hospital_limit,
                config.default_search_radius_km,
            )),
        }
    }
}

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // API routes are rate limited
    let api_routes = Router::new()
        .nest("/api", routes::api_routes())
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    // build_recorder() + set_global_recorder() so repeated calls in tests
    // don't panic; the second install is ignored but the handle still works
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    let public_routes = Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(error::not_found)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
