//! Bounded, failure-isolated provider fan-out.
//!
//! Each known jurisdiction gets its own task; a [`Semaphore`] caps how many
//! run at once and a [`JoinSet`] is the fan-in barrier. Every call is raced
//! against its own deadline, so a hung provider can delay the barrier by at
//! most `provider_timeout_ms`. Results are slotted back by request index,
//! which keeps the output order independent of completion order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, instrument, warn, Instrument};

use crate::config::{OrchestratorConfig, TimeoutPolicy};
use crate::domain::{BusinessProfile, FailureReason, JurisdictionId, JurisdictionResult};
use crate::metrics::METRICS;
use crate::obs::{emit_provider_completed, emit_provider_degraded};
use crate::provider::{AssessmentContext, AssessmentProvider, ProviderRegistry};

/// Runs one provider call per requested jurisdiction.
#[derive(Debug, Clone)]
pub struct ParallelOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: OrchestratorConfig,
}

impl ParallelOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Assess `profile` against every entry of `jurisdictions`.
    ///
    /// Always returns exactly one result per requested jurisdiction, in the
    /// requested order. Unknown identifiers become `Failed` results without
    /// a task being spawned; provider errors, panics and timeouts are
    /// absorbed per [`OrchestratorConfig`]. Callers reject an empty list
    /// before getting here.
    #[instrument(skip_all, fields(company = %profile.company_name, requested = jurisdictions.len()))]
    pub async fn dispatch(
        &self,
        profile: Arc<BusinessProfile>,
        jurisdictions: &[JurisdictionId],
    ) -> Vec<JurisdictionResult> {
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut slots: Vec<Option<JurisdictionResult>> = vec![None; jurisdictions.len()];
        let mut join_set = JoinSet::new();

        for (idx, jurisdiction) in jurisdictions.iter().cloned().enumerate() {
            let Some(provider) = self.registry.get(&jurisdiction) else {
                METRICS.inc_unknown_jurisdictions();
                let reason = FailureReason::UnknownJurisdiction;
                emit_provider_degraded(&jurisdiction, &reason);
                slots[idx] = Some(JurisdictionResult::failed(jurisdiction, reason));
                continue;
            };

            let profile = Arc::clone(&profile);
            let permits = Arc::clone(&permits);
            let config = self.config.clone();
            join_set.spawn(
                async move {
                    // The semaphore is never closed, so acquisition only fails
                    // if that invariant is broken; run unthrottled in that case.
                    let _permit = permits.acquire_owned().await.ok();
                    let result = call_provider(provider, profile, jurisdiction, &config).await;
                    (idx, result)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => warn!(error = %e, "orchestrator task lost before reporting"),
            }
        }

        jurisdictions
            .iter()
            .zip(slots)
            .map(|(jurisdiction, slot)| {
                slot.unwrap_or_else(|| {
                    let reason = FailureReason::ProviderPanicked {
                        message: "task lost before reporting".to_string(),
                    };
                    emit_provider_degraded(jurisdiction, &reason);
                    JurisdictionResult::failed(jurisdiction.clone(), reason)
                })
            })
            .collect()
    }
}

/// Run a single provider call under its deadline and classify the outcome.
async fn call_provider(
    provider: Arc<dyn AssessmentProvider>,
    profile: Arc<BusinessProfile>,
    jurisdiction: JurisdictionId,
    config: &OrchestratorConfig,
) -> JurisdictionResult {
    METRICS.inc_provider_calls();
    let limit = Duration::from_millis(config.provider_timeout_ms);
    let started = Instant::now();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctx = AssessmentContext::new(jurisdiction.clone(), started + limit, cancel_rx);

    debug!(jurisdiction = %jurisdiction, provider = provider.name(), "provider call started");

    // The call runs in its own task so a panic stays contained and a
    // provider that stops yielding cannot hold the deadline hostage.
    let mut call =
        tokio::spawn(async move { provider.assess(&profile, &ctx).await }.in_current_span());
    let outcome = tokio::time::timeout(limit, &mut call).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    METRICS.record_provider_latency(latency_ms);

    let result = match outcome {
        Ok(Ok(Ok(assessment))) => match assessment.check() {
            Ok(()) => JurisdictionResult::succeeded(jurisdiction, assessment),
            Err(message) => fallback(
                jurisdiction,
                config,
                FailureReason::InvalidAssessment { message },
            ),
        },
        Ok(Ok(Err(e))) => fallback(
            jurisdiction,
            config,
            FailureReason::ProviderError {
                message: e.to_string(),
            },
        ),
        Ok(Err(join_err)) => fallback(
            jurisdiction,
            config,
            FailureReason::ProviderPanicked {
                message: join_error_message(join_err),
            },
        ),
        Err(_elapsed) => {
            let _ = cancel_tx.send(true);
            call.abort();
            METRICS.inc_provider_timeouts();
            let reason = FailureReason::Timeout {
                limit_ms: config.provider_timeout_ms,
            };
            match config.timeout_policy {
                TimeoutPolicy::Fail => {
                    emit_provider_degraded(&jurisdiction, &reason);
                    JurisdictionResult::failed(jurisdiction, reason)
                }
                TimeoutPolicy::Fallback => fallback(jurisdiction, config, reason),
            }
        }
    };

    emit_provider_completed(
        &result.jurisdiction,
        result.status,
        result.score,
        latency_ms,
    );
    result
}

fn fallback(
    jurisdiction: JurisdictionId,
    config: &OrchestratorConfig,
    reason: FailureReason,
) -> JurisdictionResult {
    METRICS.inc_provider_fallbacks();
    emit_provider_degraded(&jurisdiction, &reason);
    JurisdictionResult::fallback(jurisdiction, config.fallback_score, reason)
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            return (*s).to_string();
        }
        if let Some(s) = payload.downcast_ref::<String>() {
            return s.clone();
        }
        "non-string panic payload".to_string()
    } else {
        err.to_string()
    }
}
