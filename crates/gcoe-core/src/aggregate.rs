//! Global composite score.
//!
//! Weighted mean of per-jurisdiction scores. Position in the caller's
//! preference order picks the base weight; fallback results are discounted
//! and failed results drop out of the denominator entirely.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::domain::{clamp_unit, ExecutionStatus, JurisdictionId, JurisdictionResult};

/// Effective weight one result carried into the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedScore {
    pub jurisdiction: JurisdictionId,
    pub score: f64,
    pub weight: f64,
}

/// Output of [`ScoreAggregator::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    /// Global composite in `[0, 1]`.
    pub composite: f64,
    /// One entry per input result, in input order (failed entries weigh 0).
    pub weights: Vec<WeightedScore>,
    /// Number of results that contributed a non-zero weight.
    pub contributing: usize,
    /// No result was usable; `composite` is the neutral default.
    pub all_failed: bool,
    /// At least one result was not a plain success.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Effective weight of the result at `position` with `status`.
    pub fn weight_for(&self, position: usize, status: ExecutionStatus) -> f64 {
        let base = if position == 0 {
            self.config.primary_weight
        } else {
            self.config.secondary_weight
        };
        let weight = match status {
            ExecutionStatus::Succeeded => base,
            ExecutionStatus::FallbackUsed => base * self.config.fallback_weight_factor,
            ExecutionStatus::Failed => 0.0,
        };
        clamp_unit(weight)
    }

    /// Reduce `results` (in request order) into one composite score.
    pub fn aggregate(&self, results: &[JurisdictionResult]) -> AggregateScore {
        let weights: Vec<WeightedScore> = results
            .iter()
            .enumerate()
            .map(|(position, r)| WeightedScore {
                jurisdiction: r.jurisdiction.clone(),
                score: clamp_unit(r.score),
                weight: self.weight_for(position, r.status),
            })
            .collect();

        let degraded = results
            .iter()
            .any(|r| r.status != ExecutionStatus::Succeeded);
        let contributing = weights.iter().filter(|w| w.weight > 0.0).count();
        let total_weight: f64 = weights.iter().map(|w| w.weight).sum();

        if contributing == 0 || total_weight <= 0.0 {
            return AggregateScore {
                composite: clamp_unit(self.config.neutral_score),
                weights,
                contributing: 0,
                all_failed: true,
                degraded: true,
            };
        }

        let weighted_sum: f64 = weights.iter().map(|w| w.score * w.weight).sum();
        AggregateScore {
            composite: clamp_unit(weighted_sum / total_weight),
            weights,
            contributing,
            all_failed: false,
            degraded,
        }
    }
}
