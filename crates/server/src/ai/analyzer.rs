//! AI Analyzer Adapter
//!
//! Asks the generative model first and falls back to the rule-based
//! analyzer on any failure: transport errors, quota, timeout, or a reply
//! that does not validate. Only validated replies are tagged
//! `AiGenerated`; every fallback result comes straight from the rules.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use petmate_core::{AnalysisResult, AnalysisSource, RuleAnalyzer, Species, normalize};
use serde::Serialize;

use super::backoff::FailureBackoff;
use super::cache::InsightCache;
use super::insight::{SYSTEM_PROMPT, build_user_prompt, parse_insight};
use super::provider::{AiError, InsightProvider};
use crate::config::{AiConfig, MAX_AI_RETRIES};

/// Counters for AI usage since startup
#[derive(Default)]
struct UsageCounters {
    ai_calls: AtomicU64,
    ai_failures: AtomicU64,
    fallbacks: AtomicU64,
    total_tokens: AtomicU64,
    cache_hits: AtomicU64,
}

/// Rough blended price of one model token, for cost monitoring only
pub const ESTIMATED_COST_PER_TOKEN_USD: f64 = 0.000002;

/// Point-in-time view of AI usage
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageStats {
    pub mode: &'static str,
    pub ai_calls: u64,
    pub ai_failures: u64,
    pub fallbacks: u64,
    pub total_tokens: u64,
    pub cache_hits: u64,
    pub estimated_cost_usd: f64,
}

pub struct AiAnalyzer {
    rules: RuleAnalyzer,
    provider: Option<Arc<dyn InsightProvider>>,
    timeout: Duration,
    max_retries: u32,
    backoff: FailureBackoff,
    cache: Option<InsightCache>,
    counters: UsageCounters,
}

impl AiAnalyzer {
    pub fn new(
        rules: RuleAnalyzer,
        provider: Option<Arc<dyn InsightProvider>>,
        config: &AiConfig,
    ) -> Self {
        Self {
            rules,
            provider,
            timeout: config.timeout,
            max_retries: config.max_retries.min(MAX_AI_RETRIES),
            backoff: FailureBackoff::new(config.failure_threshold, config.cooldown),
            cache: config
                .cache_enabled
                .then(|| InsightCache::new(config.cache_capacity, config.cache_ttl)),
            counters: UsageCounters::default(),
        }
    }

    /// Adapter without a model service: every call goes to the rules
    pub fn rule_based(rules: RuleAnalyzer, config: &AiConfig) -> Self {
        Self::new(rules, None, config)
    }

    pub fn ai_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn rules(&self) -> &RuleAnalyzer {
        &self.rules
    }

    pub fn stats(&self) -> UsageStats {
        let total_tokens = self.counters.total_tokens.load(Ordering::Relaxed);
        UsageStats {
            mode: if self.ai_enabled() { "ai" } else { "rule_based" },
            ai_calls: self.counters.ai_calls.load(Ordering::Relaxed),
            ai_failures: self.counters.ai_failures.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            total_tokens,
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            estimated_cost_usd: total_tokens as f64 * ESTIMATED_COST_PER_TOKEN_USD,
        }
    }

    /// Analyze symptom text, preferring the model and falling back to the
    /// rules. Errors only when the rule-based path itself is unavailable.
    pub async fn analyze(
        &self,
        symptoms: &str,
        species: Species,
    ) -> petmate_core::Result<AnalysisResult> {
        let Some(provider) = self.provider.as_deref() else {
            return self.rule_based_result(symptoms, species);
        };

        // Nothing to send: the rules already answer "Unknown" for this
        if normalize(symptoms).is_empty() {
            return self.rule_based_result(symptoms, species);
        }

        let key = InsightCache::key(species, symptoms);
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("petmate_ai_cache_hits_total").increment(1);
            tracing::debug!(species = %species, "AI result served from cache");
            return Ok(hit);
        }

        match self.ask(provider, symptoms, species).await {
            Ok(result) => {
                if let Some(cache) = &self.cache {
                    cache.insert(key, result.clone());
                }
                metrics::counter!("petmate_analyses_total", "source" => "ai_generated")
                    .increment(1);
                Ok(result)
            }
            Err(err) => {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("petmate_ai_fallbacks_total", "kind" => err.kind()).increment(1);
                tracing::warn!(
                    kind = err.kind(),
                    error = %err,
                    "AI analysis failed, falling back to rule-based analyzer"
                );
                self.rule_based_result(symptoms, species)
            }
        }
    }

    fn rule_based_result(
        &self,
        symptoms: &str,
        species: Species,
    ) -> petmate_core::Result<AnalysisResult> {
        let result = self.rules.analyze(symptoms, species)?;
        debug_assert_eq!(result.source, AnalysisSource::RuleBased);
        metrics::counter!("petmate_analyses_total", "source" => "rule_based").increment(1);
        Ok(result)
    }

    /// One model round trip with at most `max_retries` extra attempts for
    /// retryable errors, each bounded by the timeout
    async fn ask(
        &self,
        provider: &dyn InsightProvider,
        symptoms: &str,
        species: Species,
    ) -> Result<AnalysisResult, AiError> {
        self.backoff.check().map_err(AiError::CoolingDown)?;

        let prompt = build_user_prompt(symptoms, species);
        let mut attempt = 0;
        let completion = loop {
            self.counters.ai_calls.fetch_add(1, Ordering::Relaxed);
            let outcome =
                match tokio::time::timeout(self.timeout, provider.complete(SYSTEM_PROMPT, &prompt))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AiError::Timeout(self.timeout)),
                };

            match outcome {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(kind = err.kind(), attempt = attempt, "Retrying AI request");
                }
                other => break other,
            }
        };

        let parsed = completion.and_then(|c| {
            self.counters
                .total_tokens
                .fetch_add(c.tokens, Ordering::Relaxed);
            parse_insight(&c.text)
        });

        match &parsed {
            Ok(result) => {
                self.backoff.record_success();
                tracing::info!(
                    condition = %result.condition,
                    severity = %result.severity,
                    confidence = result.confidence,
                    "AI analysis complete"
                );
            }
            Err(_) => {
                self.counters.ai_failures.fetch_add(1, Ordering::Relaxed);
                self.backoff.record_failure();
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::Completion;
    use async_trait::async_trait;
    use petmate_core::SymptomDatabase;
    use std::sync::Mutex;

    const TABLE: &str = r#"[
        {"keywords": ["vomit", "won't eat"], "condition": "Digestive Upset",
         "severity": "moderate", "action": "Call your vet if your {pet} keeps vomiting"}
    ]"#;

    const VALID_REPLY: &str = r#"{"condition": "Gastritis", "confidence": 0.8,
        "severity": "moderate", "action": "See a vet", "urgent": false}"#;

    /// Replays a fixed script of replies, one per call
    struct Scripted {
        replies: Mutex<Vec<Result<Completion, AiError>>>,
        calls: AtomicU64,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<Completion, AiError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicU64::new(0),
            })
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl InsightProvider for Scripted {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<Completion, AiError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AiError::Http("script exhausted".into())))
        }
    }

    struct Hangs;

    #[async_trait]
    impl InsightProvider for Hangs {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<Completion, AiError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(AiError::Http("unreachable".into()))
        }
    }

    fn text(reply: &str) -> Result<Completion, AiError> {
        Ok(Completion {
            text: reply.to_string(),
            tokens: 10,
        })
    }

    fn config() -> AiConfig {
        let mut config = crate::config::Config::default().ai;
        config.timeout = Duration::from_millis(50);
        config
    }

    fn rules() -> RuleAnalyzer {
        RuleAnalyzer::new(Arc::new(SymptomDatabase::from_json_str(TABLE).unwrap()))
    }

    const SYMPTOMS: &str = "My dog has been vomiting for two days and won't eat anything";

    #[tokio::test]
    async fn valid_reply_is_ai_generated() {
        let provider = Scripted::new(vec![text(VALID_REPLY)]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &config());

        let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        assert_eq!(result.source, AnalysisSource::AiGenerated);
        assert_eq!(result.condition, "Gastritis");

        let stats = analyzer.stats();
        assert_eq!(stats.mode, "ai");
        assert_eq!(stats.ai_calls, 1);
        assert_eq!(stats.total_tokens, 10);
        assert!((stats.estimated_cost_usd - 10.0 * ESTIMATED_COST_PER_TOKEN_USD).abs() < 1e-12);
        assert_eq!(stats.fallbacks, 0);
    }

    #[tokio::test]
    async fn failures_fall_back_to_rules() {
        let expected = rules().analyze(SYMPTOMS, Species::Dog).unwrap();
        let failures = vec![
            Err(AiError::Status {
                status: 429,
                message: "quota".into(),
            }),
            text("not json at all"),
            text(r#"{"condition": "X", "confidence": 3.0, "severity": "low", "action": "y"}"#),
            text(r#"{"condition": "X", "confidence": "high", "severity": "low", "action": "y"}"#),
        ];

        for failure in failures {
            let mut cfg = config();
            cfg.max_retries = 0;
            let analyzer = AiAnalyzer::new(rules(), Some(Scripted::new(vec![failure])), &cfg);
            let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
            assert_eq!(result, expected);
            assert_eq!(result.source, AnalysisSource::RuleBased);
            assert_eq!(analyzer.stats().fallbacks, 1);
        }
    }

    #[tokio::test]
    async fn timeout_falls_back_to_rules() {
        let analyzer = AiAnalyzer::new(rules(), Some(Arc::new(Hangs)), &config());
        let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        assert_eq!(result, rules().analyze(SYMPTOMS, Species::Dog).unwrap());
        assert_eq!(analyzer.stats().ai_failures, 1);
    }

    #[tokio::test]
    async fn retries_transport_errors_once() {
        let provider = Scripted::new(vec![Err(AiError::Http("reset".into())), text(VALID_REPLY)]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &config());

        let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        assert_eq!(result.source, AnalysisSource::AiGenerated);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn never_retries_more_than_once() {
        let provider = Scripted::new(vec![
            Err(AiError::Http("reset".into())),
            Err(AiError::Http("reset".into())),
            text(VALID_REPLY),
        ]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &config());

        let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        assert_eq!(result.source, AnalysisSource::RuleBased);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn repeated_failures_pause_ai_calls() {
        let mut cfg = config();
        cfg.failure_threshold = 2;
        cfg.cooldown = Duration::from_secs(60);
        cfg.max_retries = 0;
        let provider = Scripted::new(vec![text("garbage"), text("garbage"), text(VALID_REPLY)]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &cfg);

        for _ in 0..3 {
            let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
            assert_eq!(result.source, AnalysisSource::RuleBased);
        }
        assert_eq!(provider.calls(), 2);
        assert_eq!(analyzer.stats().fallbacks, 3);
    }

    #[tokio::test]
    async fn caches_ai_results_only() {
        let provider = Scripted::new(vec![text(VALID_REPLY)]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &config());

        analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        let again = analyzer
            .analyze("my dog has been VOMITING for two days and won't eat anything!", Species::Dog)
            .await
            .unwrap();
        assert_eq!(again.source, AnalysisSource::AiGenerated);
        assert_eq!(provider.calls(), 1);
        assert_eq!(analyzer.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn blank_text_skips_the_model() {
        let provider = Scripted::new(vec![text(VALID_REPLY)]);
        let analyzer = AiAnalyzer::new(rules(), Some(provider.clone()), &config());

        let result = analyzer.analyze("  ?! ", Species::Cat).await.unwrap();
        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn rule_based_mode_never_calls_out() {
        let analyzer = AiAnalyzer::rule_based(rules(), &config());
        let result = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap();
        assert_eq!(result.condition, "Digestive Upset");
        assert_eq!(analyzer.stats().mode, "rule_based");
        assert_eq!(analyzer.stats().ai_calls, 0);
    }

    #[tokio::test]
    async fn empty_rules_and_failed_ai_is_unavailable() {
        let empty = RuleAnalyzer::new(Arc::new(SymptomDatabase::default()));
        let provider = Scripted::new(vec![text("garbage")]);
        let analyzer = AiAnalyzer::new(empty, Some(provider), &config());

        let err = analyzer.analyze(SYMPTOMS, Species::Dog).await.unwrap_err();
        assert!(matches!(err, petmate_core::PetMateError::AnalysisUnavailable(_)));
    }
}
