//! Server configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Hard cap on retries against the model service
pub const MAX_AI_RETRIES: u32 = 1;

/// Settings for the AI Analyzer Adapter
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Absent means rule-based-only mode
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Consecutive failures before AI calls pause; 0 disables the pause
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub symptom_db_path: PathBuf,
    pub hospital_db_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub default_hospital_limit: usize,
    pub default_search_radius_km: f64,
    pub ai: AiConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults
    /// for missing or unparseable values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let ai = AiConfig {
            api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            model: var("AI_MODEL", crate::ai::client::DEFAULT_MODEL),
            base_url: var("AI_BASE_URL", crate::ai::client::DEFAULT_BASE_URL),
            max_tokens: parse_or(&lookup, "AI_MAX_TOKENS", 150),
            temperature: parse_or(&lookup, "AI_TEMPERATURE", 0.3),
            timeout: Duration::from_secs(parse_or(&lookup, "API_TIMEOUT", 10)),
            max_retries: parse_or(&lookup, "API_RETRY_ATTEMPTS", MAX_AI_RETRIES)
                .min(MAX_AI_RETRIES),
            failure_threshold: parse_or(&lookup, "AI_FAILURE_THRESHOLD", 3),
            cooldown: Duration::from_secs(parse_or(&lookup, "AI_COOLDOWN_SECS", 30)),
            cache_enabled: parse_bool_or(&lookup, "ENABLE_CACHE", true),
            cache_ttl: Duration::from_secs(parse_or(&lookup, "CACHE_DURATION", 3600)),
            cache_capacity: parse_or(&lookup, "CACHE_CAPACITY", 256),
        };

        Self {
            bind_address: var("BIND_ADDRESS", "0.0.0.0:8080"),
            symptom_db_path: var("SYMPTOM_DB_PATH", "data/symptoms.json").into(),
            hospital_db_path: var("HOSPITAL_DB_PATH", "data/vet_hospitals.json").into(),
            cors_origins: var("CORS_ORIGINS", "*")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit_rps: parse_or(&lookup, "RATE_LIMIT_RPS", 50).max(1),
            default_hospital_limit: parse_or(&lookup, "DEFAULT_HOSPITAL_LIMIT", 5),
            default_search_radius_km: parse_or(&lookup, "DEFAULT_SEARCH_RADIUS_KM", 50.0),
            ai,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, "Unparseable config value, using default");
            default
        }),
        None => default,
    }
}

fn parse_bool_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" => true,
        Some(v) if v == "false" || v == "0" => false,
        Some(v) => {
            tracing::warn!(key = key, value = %v, "Unparseable boolean config value, using default");
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.symptom_db_path, PathBuf::from("data/symptoms.json"));
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.default_hospital_limit, 5);
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.timeout, Duration::from_secs(10));
        assert!(config.ai.cache_enabled);
    }

    #[test]
    fn reads_overrides() {
        let config = from_map(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("API_TIMEOUT", "3"),
            ("ENABLE_CACHE", "False"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("RATE_LIMIT_RPS", "0"),
        ]);
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.timeout, Duration::from_secs(3));
        assert!(!config.ai.cache_enabled);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.rate_limit_rps, 1);
    }

    #[test]
    fn retries_are_capped_and_bad_values_fall_back() {
        let config = from_map(&[
            ("API_RETRY_ATTEMPTS", "5"),
            ("CACHE_DURATION", "an hour"),
            ("ANTHROPIC_API_KEY", "  "),
        ]);
        assert_eq!(config.ai.max_retries, MAX_AI_RETRIES);
        assert_eq!(config.ai.cache_ttl, Duration::from_secs(3600));
        assert!(config.ai.api_key.is_none());
    }
}
