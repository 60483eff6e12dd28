//! Combines symptom analysis and hospital lookup into one advisory

use std::sync::Arc;

use petmate_core::{Advisory, AnalysisOutcome, UserQuery, VetLocator};

use crate::ai::AiAnalyzer;

/// Upper bound on hospitals returned for a single query
pub const MAX_HOSPITAL_LIMIT: usize = 50;

#[derive(Clone)]
pub struct Orchestrator {
    analyzer: Arc<AiAnalyzer>,
    locator: VetLocator,
    default_limit: usize,
    default_radius_km: f64,
}

impl Orchestrator {
    pub fn new(
        analyzer: Arc<AiAnalyzer>,
        locator: VetLocator,
        default_limit: usize,
        default_radius_km: f64,
    ) -> Self {
        Self {
            analyzer,
            locator,
            default_limit,
            default_radius_km,
        }
    }

    pub fn analyzer(&self) -> &AiAnalyzer {
        &self.analyzer
    }

    pub fn locator(&self) -> &VetLocator {
        &self.locator
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Run analysis and hospital lookup side by side and merge the results.
    ///
    /// Neither branch can abort the other: an empty hospital list still
    /// returns the analysis, and a failed analysis is reported as
    /// `Unavailable` next to whatever hospitals were found.
    pub async fn handle(&self, query: UserQuery) -> Advisory {
        let limit = query
            .limit
            .unwrap_or(self.default_limit)
            .min(MAX_HOSPITAL_LIMIT);
        let radius = query.max_distance_km.or(Some(self.default_radius_km));

        let analysis = async {
            match self.analyzer.analyze(&query.symptoms, query.species).await {
                Ok(result) => AnalysisOutcome::Available(result),
                Err(err) => {
                    tracing::error!(error = %err, "Analysis unavailable");
                    AnalysisOutcome::Unavailable {
                        reason: err.to_string(),
                    }
                }
            }
        };
        let hospitals = async { self.locator.find_nearby(query.location, limit, radius) };

        let (analysis, hospitals) = tokio::join!(analysis, hospitals);

        let summary = match &analysis {
            AnalysisOutcome::Available(r) => r.condition.as_str(),
            AnalysisOutcome::Unavailable { .. } => "unavailable",
        };
        tracing::info!(
            species = %query.species,
            analysis = summary,
            hospitals = hospitals.len(),
            "Advisory assembled"
        );

        Advisory::new(query.species, analysis, hospitals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use petmate_core::{
        AnalysisSource, Coordinates, HospitalDatabase, RuleAnalyzer, Species, SymptomDatabase,
    };

    const SYMPTOMS: &str = r#"[
        {"keywords": ["vomit", "won't eat"], "condition": "Digestive Upset",
         "severity": "moderate", "action": "Call your vet"}
    ]"#;

    const HOSPITALS: &str = r#"[
        {"name": "Near", "latitude": 42.37, "longitude": -71.06, "address": "a",
         "rating": 4.0, "phone": "1"},
        {"name": "Far", "latitude": 43.50, "longitude": -71.06, "address": "b",
         "rating": 5.0, "phone": "2"}
    ]"#;

    fn orchestrator(symptoms: SymptomDatabase, hospitals: HospitalDatabase) -> Orchestrator {
        let config = Config::default();
        let analyzer = AiAnalyzer::rule_based(RuleAnalyzer::new(Arc::new(symptoms)), &config.ai);
        Orchestrator::new(
            Arc::new(analyzer),
            VetLocator::new(Arc::new(hospitals)),
            config.default_hospital_limit,
            config.default_search_radius_km,
        )
    }

    fn query(location: Option<Coordinates>) -> UserQuery {
        UserQuery {
            symptoms: "My dog has been vomiting for two days and won't eat anything".to_string(),
            species: Species::Dog,
            location,
            limit: None,
            max_distance_km: None,
        }
    }

    #[tokio::test]
    async fn combines_analysis_and_hospitals() {
        let o = orchestrator(
            SymptomDatabase::from_json_str(SYMPTOMS).unwrap(),
            HospitalDatabase::from_json_str(HOSPITALS).unwrap(),
        );

        let advisory = o.handle(query(Some(Coordinates::new(42.3601, -71.0589)))).await;
        let result = advisory.analysis.result().unwrap();
        assert_eq!(result.condition, "Digestive Upset");
        assert_eq!(result.source, AnalysisSource::RuleBased);
        // default 50 km radius leaves out the far hospital
        assert_eq!(advisory.hospitals.len(), 1);
        assert_eq!(advisory.hospitals[0].hospital.name, "Near");
    }

    #[tokio::test]
    async fn missing_location_still_returns_analysis() {
        let o = orchestrator(
            SymptomDatabase::from_json_str(SYMPTOMS).unwrap(),
            HospitalDatabase::from_json_str(HOSPITALS).unwrap(),
        );

        let advisory = o.handle(query(None)).await;
        assert!(advisory.analysis.result().is_some());
        assert!(advisory.hospitals.is_empty());
    }

    #[tokio::test]
    async fn empty_symptom_table_is_reported_unavailable() {
        let o = orchestrator(
            SymptomDatabase::default(),
            HospitalDatabase::from_json_str(HOSPITALS).unwrap(),
        );

        let advisory = o.handle(query(Some(Coordinates::new(42.3601, -71.0589)))).await;
        assert!(matches!(
            advisory.analysis,
            AnalysisOutcome::Unavailable { .. }
        ));
        assert_eq!(advisory.hospitals.len(), 1);
    }

    #[tokio::test]
    async fn explicit_radius_and_limit_are_honoured() {
        let o = orchestrator(
            SymptomDatabase::from_json_str(SYMPTOMS).unwrap(),
            HospitalDatabase::from_json_str(HOSPITALS).unwrap(),
        );

        let mut q = query(Some(Coordinates::new(42.3601, -71.0589)));
        q.max_distance_km = Some(500.0);
        assert_eq!(o.handle(q.clone()).await.hospitals.len(), 2);

        q.limit = Some(1);
        assert_eq!(o.handle(q.clone()).await.hospitals.len(), 1);

        q.max_distance_km = Some(0.0);
        assert!(o.handle(q).await.hospitals.is_empty());
    }
}
