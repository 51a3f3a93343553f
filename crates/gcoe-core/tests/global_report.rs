//! End-to-end engine behaviour on scripted providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gcoe_core::{
    Assessment, AssessmentContext, AssessmentProvider, BusinessProfile, BusinessType,
    ComplianceEngine, Confidence, EngineConfig, ExecutionStatus, GlobalReport, JurisdictionId,
    ProviderRegistry, ProviderResult, RequestError, TimeoutPolicy,
};

/// Answers `score` after `delay`, counting invocations.
struct Scripted {
    score: f64,
    savings: f64,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AssessmentProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn assess(
        &self,
        _profile: &BusinessProfile,
        _ctx: &AssessmentContext,
    ) -> ProviderResult<Assessment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Assessment::new(self.score, self.savings).with_sub_score("tax", self.score))
    }
}

fn scripted(score: f64, delay_ms: u64, calls: &Arc<AtomicUsize>) -> Arc<Scripted> {
    Arc::new(Scripted {
        score,
        savings: 10_000.0,
        delay: Duration::from_millis(delay_ms),
        calls: Arc::clone(calls),
    })
}

fn fallback_config(timeout_ms: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.orchestrator.provider_timeout_ms = timeout_ms;
    config.orchestrator.timeout_policy = TimeoutPolicy::Fallback;
    config
}

fn profile(jurisdictions: &[&str]) -> BusinessProfile {
    BusinessProfile::new("Acme Ltd", BusinessType::Technology, 12_000_000.0, vec![])
        .with_jurisdictions(jurisdictions.iter().copied())
}

#[tokio::test(start_paused = true)]
async fn test_mixed_outcomes_weighted_composite() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ProviderRegistry::new()
        .register("A", scripted(0.92, 0, &calls))
        .register("B", scripted(0.99, 10_000, &calls))
        .register("C", scripted(0.81, 0, &calls));
    let engine = ComplianceEngine::new(Arc::new(registry), fallback_config(500));

    let report = engine
        .assess(&profile(&["A", "B", "C"]))
        .await
        .expect("valid request");

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0].status, ExecutionStatus::Succeeded);
    assert_eq!(report.results[1].status, ExecutionStatus::FallbackUsed);
    assert_eq!(report.results[1].score, 0.70);
    assert_eq!(report.results[2].status, ExecutionStatus::Succeeded);

    let expected = (0.92 * 1.0 + 0.70 * 0.49 + 0.81 * 0.7) / (1.0 + 0.49 + 0.7);
    assert!((report.composite_score - expected).abs() < 1e-9);
    assert_eq!(report.primary.as_str(), "A");
    assert_eq!(report.secondaries, vec![JurisdictionId::new("C")]);
    assert_eq!(report.confidence, Confidence::Reduced);
    assert!(report.synergy.matches.is_empty());
    // Fallbacks carry no savings.
    assert!((report.jurisdiction_savings - 20_000.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_request_invokes_no_provider() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ProviderRegistry::new().register("uk", scripted(0.9, 0, &calls));
    let engine = ComplianceEngine::new(Arc::new(registry), EngineConfig::default());

    let err = engine.assess(&profile(&[])).await.expect_err("empty list");

    assert_eq!(err, RequestError::EmptyJurisdictions);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_profile_invokes_no_provider() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ProviderRegistry::new().register("uk", scripted(0.9, 0, &calls));
    let engine = ComplianceEngine::new(Arc::new(registry), EngineConfig::default());

    let mut bad = profile(&["uk"]);
    bad.revenue = f64::NAN;
    let err = engine.assess(&bad).await.expect_err("non-finite revenue");
    assert!(matches!(err, RequestError::InvalidField { ref field, .. } if field == "revenue"));

    let blank = profile(&["uk", "  "]);
    let err = engine.assess(&blank).await.expect_err("blank id");
    assert_eq!(err, RequestError::BlankJurisdiction { position: 1 });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_failed_yields_neutral_low_confidence_report() {
    let engine = ComplianceEngine::new(Arc::new(ProviderRegistry::new()), EngineConfig::default());

    let report = engine
        .assess(&profile(&["X", "Y"]))
        .await
        .expect("valid request");

    assert_eq!(report.composite_score, 0.8);
    assert!(report.aggregate.all_failed);
    assert_eq!(report.confidence, Confidence::Low);
    assert!(report.is_low_confidence());
    assert_eq!(report.primary.as_str(), "X");
    assert!(report.secondaries.is_empty());
    assert!(report
        .results
        .iter()
        .all(|r| r.status == ExecutionStatus::Failed));
    assert_eq!(report.total_savings, 0.0);
}

#[tokio::test]
async fn test_identical_inputs_give_identical_reports() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ProviderRegistry::new()
            .register("uk", scripted(0.86, 3, &calls))
            .register("eu", scripted(0.84, 1, &calls))
            .register("us", scripted(0.79, 0, &calls)),
    );
    let engine = ComplianceEngine::new(registry, EngineConfig::default());
    let request = profile(&["uk", "eu", "us", "nowhere"]);

    let first: GlobalReport = engine.assess(&request).await.expect("valid");
    let first_json = serde_json::to_string(&first).expect("serialize");
    for _ in 0..10 {
        let rerun = engine.assess(&request).await.expect("valid");
        assert_eq!(rerun, first);
        assert_eq!(serde_json::to_string(&rerun).expect("serialize"), first_json);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 33);
}

#[tokio::test]
async fn test_tie_break_prefers_first_requested() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ProviderRegistry::new()
            .register("P", scripted(0.85, 0, &calls))
            .register("Q", scripted(0.85, 0, &calls)),
    );
    let engine = ComplianceEngine::new(registry, EngineConfig::default());

    let forward = engine.assess(&profile(&["P", "Q"])).await.expect("valid");
    let reverse = engine.assess(&profile(&["Q", "P"])).await.expect("valid");

    assert_eq!(forward.primary.as_str(), "P");
    assert_eq!(reverse.primary.as_str(), "Q");
}

#[tokio::test]
async fn test_treaty_pair_discounts_complexity() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ProviderRegistry::new()
            .register("uk", scripted(0.9, 0, &calls))
            .register("us", scripted(0.88, 0, &calls)),
    );
    let engine = ComplianceEngine::new(registry, EngineConfig::default());

    let report = engine.assess(&profile(&["usa", "uk"])).await.expect("valid");

    // Revenue above 10M lifts us past uk.
    assert_eq!(report.primary.as_str(), "us");
    // The treaty eases complexity but carries no savings bonus.
    assert_eq!(report.synergy.matches.len(), 1);
    assert_eq!(report.synergy.total_bonus, 0.0);
    assert_eq!(report.total_savings, report.jurisdiction_savings);
    assert!((report.complexity_score - 0.4 * 0.95).abs() < 1e-12);
    assert_eq!(report.market_access.len(), 2);
}
