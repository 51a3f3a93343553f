//! End-to-end assessment pipeline.
//!
//! validate → fan out to providers → aggregate → synergies → selection →
//! complexity/cost → [`GlobalReport`]. Only request validation can fail;
//! everything past it is total and folds provider trouble into the report.

use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::aggregate::ScoreAggregator;
use crate::config::EngineConfig;
use crate::domain::{BusinessProfile, JurisdictionResult, RequestResult};
use crate::estimate::ComplexityCostEstimator;
use crate::metrics::METRICS;
use crate::obs::{assessment_span, emit_assessment_finished, emit_assessment_started};
use crate::orchestrator::ParallelOrchestrator;
use crate::provider::ProviderRegistry;
use crate::report::{Confidence, GlobalReport};
use crate::selector::{market_access_benefits, selection_rationale, AffinityTable, JurisdictionSelector};
use crate::synergy::{SynergyDetector, SynergyTable};

/// Entry point for callers. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    config: EngineConfig,
    orchestrator: ParallelOrchestrator,
    aggregator: ScoreAggregator,
    synergies: SynergyDetector,
    selector: JurisdictionSelector,
    estimator: ComplexityCostEstimator,
}

impl ComplianceEngine {
    /// Engine with the built-in synergy and affinity tables.
    pub fn new(registry: Arc<ProviderRegistry>, config: EngineConfig) -> Self {
        Self::with_tables(
            registry,
            config,
            SynergyTable::standard(),
            AffinityTable::standard(),
        )
    }

    pub fn with_tables(
        registry: Arc<ProviderRegistry>,
        config: EngineConfig,
        synergies: SynergyTable,
        affinities: AffinityTable,
    ) -> Self {
        Self {
            orchestrator: ParallelOrchestrator::new(registry, config.orchestrator.clone()),
            aggregator: ScoreAggregator::new(config.scoring.clone()),
            synergies: SynergyDetector::new(synergies),
            selector: JurisdictionSelector::new(config.selection.clone(), affinities),
            estimator: ComplexityCostEstimator::new(config.estimation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn synergy_table(&self) -> &SynergyTable {
        self.synergies.table()
    }

    /// Assess one business profile.
    ///
    /// Returns `Err` only for an invalid request, in which case no provider
    /// has been called.
    pub async fn assess(&self, profile: &BusinessProfile) -> RequestResult<GlobalReport> {
        let span = assessment_span(&profile.company_name);
        self.run(profile).instrument(span).await
    }

    async fn run(&self, profile: &BusinessProfile) -> RequestResult<GlobalReport> {
        profile.validate()?;
        METRICS.inc_assessments();

        let profile = Arc::new(profile.clone());
        emit_assessment_started(&profile.company_name, profile.jurisdictions.len());

        let results = self
            .orchestrator
            .dispatch(Arc::clone(&profile), &profile.jurisdictions)
            .await;

        Ok(self.build_report(&profile, results))
    }

    /// Assess several profiles concurrently. Each profile gets its own
    /// result; one invalid request does not affect the others.
    pub async fn assess_batch(
        &self,
        profiles: &[BusinessProfile],
    ) -> Vec<RequestResult<GlobalReport>> {
        join_all(profiles.iter().map(|p| self.assess(p))).await
    }

    /// Sequential post-processing over the immutable result list.
    fn build_report(
        &self,
        profile: &BusinessProfile,
        results: Vec<JurisdictionResult>,
    ) -> GlobalReport {
        let aggregate = self.aggregator.aggregate(&results);
        let synergy = self.synergies.detect(profile, &results);
        let selection = self.selector.select(profile, &results);
        let selected = selection.selected();
        let estimate = self.estimator.estimate(&selected, &synergy.matches);

        let confidence = if aggregate.all_failed || selection.low_confidence {
            Confidence::Low
        } else if aggregate.degraded {
            Confidence::Reduced
        } else {
            Confidence::Full
        };

        let jurisdiction_savings: f64 = results
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| r.savings)
            .sum();
        let total_savings = jurisdiction_savings + synergy.total_bonus;

        emit_assessment_finished(
            &profile.company_name,
            aggregate.composite,
            &selection.primary,
            confidence == Confidence::Low,
        );

        GlobalReport {
            company_name: profile.company_name.clone(),
            requested: profile.jurisdictions.clone(),
            composite_score: aggregate.composite,
            confidence,
            selection_rationale: selection_rationale(profile, &selection.primary),
            market_access: market_access_benefits(&selected),
            primary: selection.primary,
            secondaries: selection.secondaries,
            ranking: selection.ranking,
            jurisdiction_savings,
            total_savings,
            complexity_score: estimate.complexity,
            cost_estimate: estimate.cost,
            synergy,
            aggregate,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Assessment, BusinessType, JurisdictionId, RequestError};
    use crate::provider::{AssessmentContext, AssessmentProvider, ProviderResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    struct Fixed {
        score: f64,
        savings: f64,
    }

    #[async_trait]
    impl AssessmentProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn assess(
            &self,
            _profile: &BusinessProfile,
            _ctx: &AssessmentContext,
        ) -> ProviderResult<Assessment> {
            Ok(Assessment::new(self.score, self.savings))
        }
    }

    fn engine() -> ComplianceEngine {
        let registry = ProviderRegistry::new()
            .register(
                "uk",
                Arc::new(Fixed {
                    score: 0.88,
                    savings: 100_000.0,
                }),
            )
            .register(
                "eu",
                Arc::new(Fixed {
                    score: 0.82,
                    savings: 40_000.0,
                }),
            );
        ComplianceEngine::new(Arc::new(registry), EngineConfig::default())
    }

    fn profile(jurisdictions: &[&str]) -> BusinessProfile {
        BusinessProfile::new("Acme Ltd", BusinessType::Technology, 1_000_000.0, vec![])
            .with_jurisdictions(jurisdictions.iter().copied())
    }

    #[tokio::test]
    async fn test_savings_include_synergy_bonus() {
        let report = engine().assess(&profile(&["uk", "eu"])).await.expect("valid");

        assert_eq!(report.primary.as_str(), "uk");
        assert_eq!(report.secondaries, vec![JurisdictionId::new("eu")]);
        assert_eq!(report.confidence, Confidence::Full);
        assert!((report.jurisdiction_savings - 140_000.0).abs() < 1e-9);
        assert!((report.synergy.total_bonus - 20_000.0).abs() < 1e-9);
        assert!((report.total_savings - 160_000.0).abs() < 1e-9);
        // Two selected, eu-uk discount 0.9.
        assert!((report.complexity_score - 0.36).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_aliases_resolve_before_dispatch() {
        let report = engine()
            .assess(&profile(&["United_Kingdom", "Germany"]))
            .await
            .expect("valid");
        let ids: Vec<&str> = report.requested.iter().map(|j| j.as_str()).collect();
        assert_eq!(ids, vec!["uk", "eu"]);
        assert_eq!(report.degraded_results().count(), 0);
    }

    #[tokio::test]
    async fn test_alias_duplicate_is_rejected() {
        let err = engine()
            .assess(&profile(&["uk", "united_kingdom"]))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, RequestError::DuplicateJurisdiction { .. }));
    }

    #[tokio::test]
    async fn test_unknown_jurisdiction_reduces_confidence() {
        let report = engine().assess(&profile(&["uk", "zz"])).await.expect("valid");
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.confidence, Confidence::Reduced);
        assert!((report.composite_score - 0.88).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_batch_keeps_invalid_requests_separate() {
        let reports = engine()
            .assess_batch(&[profile(&["uk"]), profile(&[])])
            .await;
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_ok());
        assert_eq!(reports[1], Err(RequestError::EmptyJurisdictions));
    }

    /// Records each lifecycle event with the names of its enclosing spans.
    #[derive(Clone, Default)]
    struct EventScopes(Arc<Mutex<Vec<(String, Vec<String>)>>>);

    struct EventField(Option<String>);

    impl Visit for EventField {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "event" {
                self.0 = Some(value.to_string());
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    impl<S> Layer<S> for EventScopes
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
            let mut field = EventField(None);
            event.record(&mut field);
            let Some(name) = field.0 else {
                return;
            };
            let spans = ctx
                .event_scope(event)
                .map(|scope| scope.from_root().map(|s| s.name().to_string()).collect())
                .unwrap_or_default();
            self.0.lock().unwrap().push((name, spans));
        }
    }

    #[tokio::test]
    async fn test_lifecycle_events_share_assessment_span() {
        let scopes = EventScopes::default();
        let subscriber = tracing_subscriber::registry().with(scopes.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        engine()
            .assess(&profile(&["uk", "eu", "zz"]))
            .await
            .expect("valid");

        let events = scopes.0.lock().unwrap().clone();
        for name in [
            "assessment.started",
            "provider.completed",
            "provider.degraded",
            "assessment.finished",
        ] {
            assert!(events.iter().any(|(n, _)| n == name), "missing {name}");
        }
        for (name, spans) in &events {
            assert_eq!(
                spans.first().map(String::as_str),
                Some("gcoe.assessment"),
                "{name} ran outside the assessment span"
            );
        }
    }
}
