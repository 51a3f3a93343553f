//! Structured observability hooks for the assessment pipeline.
//!
//! - `assessment_span`: the span every event of one request runs under
//! - `emit_*`: lifecycle events (start, provider outcome, finish)
//!
//! Verbosity follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::domain::{ExecutionStatus, FailureReason, JurisdictionId};

/// Span for one assessment. Attach it with `tracing::Instrument`; the
/// orchestrator's tasks inherit it through `in_current_span`.
pub fn assessment_span(company: &str) -> tracing::Span {
    tracing::info_span!("gcoe.assessment", company = %company)
}

pub fn emit_assessment_started(company: &str, jurisdictions: usize) {
    info!(
        event = "assessment.started",
        company = %company,
        jurisdictions = jurisdictions,
    );
}

pub fn emit_provider_completed(
    jurisdiction: &JurisdictionId,
    status: ExecutionStatus,
    score: f64,
    latency_ms: u64,
) {
    info!(
        event = "provider.completed",
        jurisdiction = %jurisdiction,
        status = %status,
        score = score,
        latency_ms = latency_ms,
    );
}

/// Warning-level event for any result that is not a plain success.
pub fn emit_provider_degraded(jurisdiction: &JurisdictionId, reason: &FailureReason) {
    warn!(
        event = "provider.degraded",
        jurisdiction = %jurisdiction,
        reason = %reason,
    );
}

pub fn emit_assessment_finished(
    company: &str,
    composite: f64,
    primary: &JurisdictionId,
    low_confidence: bool,
) {
    info!(
        event = "assessment.finished",
        company = %company,
        composite = composite,
        primary = %primary,
        low_confidence = low_confidence,
    );
}
