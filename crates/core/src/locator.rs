//! Vet Locator: great-circle distance ranking over the hospital list

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hospitals::{HospitalDatabase, HospitalEntry};
use crate::model::{Coordinates, Species};

/// Mean earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine), rounded to 2 decimals
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding error can push `a` a hair past 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    ((EARTH_RADIUS_KM * c) * 100.0).round() / 100.0
}

/// A hospital with its distance from the caller and its position in the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHospital {
    #[serde(flatten)]
    pub hospital: HospitalEntry,
    pub distance_km: f64,
    /// 1-based position after sorting
    pub rank: usize,
}

/// Search parameters for [`VetLocator::search`]
#[derive(Debug, Clone, Default)]
pub struct HospitalQuery {
    pub location: Option<Coordinates>,
    pub limit: usize,
    pub max_distance_km: Option<f64>,
    pub min_rating: Option<f64>,
    pub emergency_only: bool,
    pub species: Option<Species>,
}

impl HospitalQuery {
    pub fn near(location: Option<Coordinates>, limit: usize) -> Self {
        Self {
            location,
            limit,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct VetLocator {
    db: Arc<HospitalDatabase>,
}

impl VetLocator {
    pub fn new(db: Arc<HospitalDatabase>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &HospitalDatabase {
        &self.db
    }

    /// Nearest hospitals, closest first, ties broken by higher rating.
    ///
    /// An absent or invalid location, an empty database, a zero limit or a
    /// non-positive `max_distance_km` all yield an empty list.
    pub fn find_nearby(
        &self,
        location: Option<Coordinates>,
        limit: usize,
        max_distance_km: Option<f64>,
    ) -> Vec<RankedHospital> {
        self.search(&HospitalQuery {
            max_distance_km,
            ..HospitalQuery::near(location, limit)
        })
    }

    /// [`find_nearby`](Self::find_nearby) with rating, emergency and species filters
    pub fn search(&self, query: &HospitalQuery) -> Vec<RankedHospital> {
        let Some(origin) = query.location.filter(Coordinates::is_valid) else {
            tracing::debug!("No usable location, skipping hospital lookup");
            return Vec::new();
        };
        if query.limit == 0 || self.db.is_empty() {
            return Vec::new();
        }
        if let Some(max) = query.max_distance_km {
            // NaN, zero and negative radii admit nothing
            if max.is_nan() || max <= 0.0 {
                return Vec::new();
            }
        }

        let mut ranked: Vec<RankedHospital> = self
            .db
            .hospitals()
            .iter()
            .filter(|h| query.min_rating.is_none_or(|min| h.rating >= min))
            .filter(|h| !query.emergency_only || h.is_emergency)
            .filter(|h| query.species.is_none_or(|s| h.treats(s)))
            .map(|h| RankedHospital {
                distance_km: haversine_km(origin, h.coordinates()),
                hospital: h.clone(),
                rank: 0,
            })
            .filter(|r| query.max_distance_km.is_none_or(|max| r.distance_km <= max))
            .collect();

        ranked.sort_by(compare_ranked);
        ranked.truncate(query.limit);
        for (idx, r) in ranked.iter_mut().enumerate() {
            r.rank = idx + 1;
        }
        ranked
    }
}

fn compare_ranked(a: &RankedHospital, b: &RankedHospital) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.hospital.rating.total_cmp(&a.hospital.rating))
}
