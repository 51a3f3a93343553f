//! Global atomic counters for GCOE observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. after a batch of assessments).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters with no allocation or locking.
pub struct Metrics {
    assessments: AtomicU64,
    provider_calls: AtomicU64,
    provider_timeouts: AtomicU64,
    provider_fallbacks: AtomicU64,
    unknown_jurisdictions: AtomicU64,
    provider_latency_ms_total: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            assessments: AtomicU64::new(0),
            provider_calls: AtomicU64::new(0),
            provider_timeouts: AtomicU64::new(0),
            provider_fallbacks: AtomicU64::new(0),
            unknown_jurisdictions: AtomicU64::new(0),
            provider_latency_ms_total: AtomicU64::new(0),
        }
    }

    pub fn inc_assessments(&self) {
        self.assessments.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "assessments", "counter incremented");
    }

    pub fn inc_provider_calls(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "provider_calls", "counter incremented");
    }

    pub fn inc_provider_timeouts(&self) {
        self.provider_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "provider_timeouts", "counter incremented");
    }

    pub fn inc_provider_fallbacks(&self) {
        self.provider_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "provider_fallbacks", "counter incremented");
    }

    pub fn inc_unknown_jurisdictions(&self) {
        self.unknown_jurisdictions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "unknown_jurisdictions", "counter incremented");
    }

    /// Add one provider call's wall time to the running total.
    pub fn record_provider_latency(&self, latency_ms: u64) {
        self.provider_latency_ms_total
            .fetch_add(latency_ms, Ordering::Relaxed);
        tracing::trace!(metric = "provider_latency_ms_total", latency_ms, "latency recorded");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            assessments = self.assessments(),
            provider_calls = self.provider_calls(),
            provider_timeouts = self.provider_timeouts(),
            provider_fallbacks = self.provider_fallbacks(),
            unknown_jurisdictions = self.unknown_jurisdictions(),
            provider_latency_ms_total = self.provider_latency_ms_total(),
        );
    }

    pub fn assessments(&self) -> u64 {
        self.assessments.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> u64 {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_timeouts(&self) -> u64 {
        self.provider_timeouts.load(Ordering::Relaxed)
    }

    pub fn provider_fallbacks(&self) -> u64 {
        self.provider_fallbacks.load(Ordering::Relaxed)
    }

    pub fn unknown_jurisdictions(&self) -> u64 {
        self.unknown_jurisdictions.load(Ordering::Relaxed)
    }

    pub fn provider_latency_ms_total(&self) -> u64 {
        self.provider_latency_ms_total.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.assessments.store(0, Ordering::Relaxed);
        self.provider_calls.store(0, Ordering::Relaxed);
        self.provider_timeouts.store(0, Ordering::Relaxed);
        self.provider_fallbacks.store(0, Ordering::Relaxed);
        self.unknown_jurisdictions.store(0, Ordering::Relaxed);
        self.provider_latency_ms_total.store(0, Ordering::Relaxed);
    }
}
