//! The jurisdiction assessment provider contract.
//!
//! # Module layout
//!
//! - [`AssessmentProvider`]: one implementation per jurisdiction
//! - [`AssessmentContext`]: deadline and cancellation signal for one call
//! - [`ProviderError`]: failures a provider may report
//! - [`registry`]: `ProviderRegistry`, jurisdiction → provider lookup

pub mod registry;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{Assessment, BusinessProfile, JurisdictionId};

pub use registry::ProviderRegistry;

/// Errors a provider may return instead of an assessment.
///
/// The orchestrator turns every one of these into a `FallbackUsed` result;
/// none of them ever reaches the caller of the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("required input missing: {field}")]
    MissingInput { field: String },

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Per-call context handed to a provider.
///
/// Long-running providers should check [`AssessmentContext::is_cancelled`]
/// between steps; the orchestrator raises the signal once the deadline passes.
#[derive(Debug, Clone)]
pub struct AssessmentContext {
    pub jurisdiction: JurisdictionId,
    pub deadline: Instant,
    cancelled: watch::Receiver<bool>,
}

impl AssessmentContext {
    pub fn new(
        jurisdiction: JurisdictionId,
        deadline: Instant,
        cancelled: watch::Receiver<bool>,
    ) -> Self {
        Self {
            jurisdiction,
            deadline,
            cancelled,
        }
    }

    /// Context that never cancels, for calling a provider directly.
    pub fn detached(jurisdiction: JurisdictionId, deadline: Instant) -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(jurisdiction, deadline, rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the orchestrator raises the cancel signal. Never
    /// resolves for a detached context.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        if rx.wait_for(|c| *c).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A pluggable compliance assessment for one jurisdiction.
///
/// Implementations must be pure functions of the profile: no shared mutable
/// state and no dependence on earlier calls. External data belongs in the
/// provider's own immutable snapshot, fixed at construction.
#[async_trait]
pub trait AssessmentProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Assess `profile` for `ctx.jurisdiction`.
    async fn assess(
        &self,
        profile: &BusinessProfile,
        ctx: &AssessmentContext,
    ) -> ProviderResult<Assessment>;
}
