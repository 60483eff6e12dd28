//! Hospital search endpoint

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use petmate_core::{Coordinates, HospitalQuery, RankedHospital, Species};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;
use crate::orchestrator::MAX_HOSPITAL_LIMIT;

/// Query parameters for hospital search
#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<usize>,
    pub max_distance_km: Option<f64>,
    pub min_rating: Option<f64>,
    pub emergency: Option<bool>,
    pub species: Option<Species>,
}

impl SearchParams {
    fn to_query(&self, default_limit: usize) -> Result<HospitalQuery, AppError> {
        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "lat and lon must be given together".to_string(),
                ));
            }
        };

        if let Some(min) = self.min_rating {
            if !(0.0..=petmate_core::hospitals::MAX_RATING).contains(&min) {
                return Err(AppError::BadRequest(
                    "min_rating must be between 0 and 5".to_string(),
                ));
            }
        }

        Ok(HospitalQuery {
            location,
            limit: self.limit.unwrap_or(default_limit).min(MAX_HOSPITAL_LIMIT),
            max_distance_km: self.max_distance_km,
            min_rating: self.min_rating,
            emergency_only: self.emergency.unwrap_or(false),
            species: self.species,
        })
    }
}

/// Response body for hospital search
#[derive(Serialize)]
pub struct HospitalList {
    total: usize,
    hospitals: Vec<RankedHospital>,
}

/// GET /api/hospitals - Nearby hospitals, closest first
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<HospitalList>, AppError> {
    let Query(params) = params?;
    let query = params.to_query(state.orchestrator.default_limit())?;

    let hospitals = state.orchestrator.locator().search(&query);
    tracing::debug!(found = hospitals.len(), "Hospital search");

    Ok(Json(HospitalList {
        total: hospitals.len(),
        hospitals,
    }))
}
