//! GCOE Core Library
//!
//! Fans one business assessment out to pluggable jurisdiction providers,
//! tolerates their failures, and folds the partial results into a single
//! [`GlobalReport`].

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod engine;
pub mod estimate;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod selector;
pub mod synergy;
pub mod telemetry;

pub use aggregate::{AggregateScore, ScoreAggregator, WeightedScore};
pub use config::{
    ConfigError, EngineConfig, EstimationConfig, OrchestratorConfig, ScoringConfig,
    SelectionConfig, TimeoutPolicy,
};
pub use domain::{
    clamp_unit, Assessment, BusinessProfile, BusinessType, ExecutionStatus, FailureReason,
    JurisdictionId, JurisdictionPair, JurisdictionResult, RequestError, RequestResult,
    DEFAULT_PROFIT_MARGIN,
};
pub use engine::ComplianceEngine;
pub use estimate::{ComplexityCostEstimator, ComplexityEstimate, CostEstimate, CostTier};
pub use orchestrator::ParallelOrchestrator;
pub use provider::{
    AssessmentContext, AssessmentProvider, ProviderError, ProviderRegistry, ProviderResult,
};
pub use report::{render_report_md, Confidence, GlobalReport};
pub use selector::{
    market_access_benefits, selection_rationale, AffinityCondition, AffinityRule, AffinityTable,
    JurisdictionSelector, RankedJurisdiction, Selection,
};
pub use synergy::{
    SynergyBonus, SynergyDetector, SynergyMatch, SynergyReport, SynergyRule, SynergyTable,
};

pub use metrics::METRICS;
pub use obs::{
    assessment_span, emit_assessment_finished, emit_assessment_started,
    emit_provider_completed, emit_provider_degraded,
};
pub use telemetry::init_tracing;

/// GCOE version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
