//! Compliance complexity and coarse cost / timeline estimate.

use serde::{Deserialize, Serialize};

use crate::config::EstimationConfig;
use crate::domain::{clamp_unit, JurisdictionId};
use crate::synergy::SynergyMatch;

/// Coarse relative cost band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl CostTier {
    pub fn from_complexity(complexity: f64) -> Self {
        if complexity < 0.3 {
            Self::Low
        } else if complexity < 0.55 {
            Self::Moderate
        } else if complexity < 0.8 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    /// Typical setup time in weeks, as an inclusive range.
    pub fn setup_weeks(self) -> (u32, u32) {
        match self {
            Self::Low => (4, 8),
            Self::Moderate => (8, 16),
            Self::High => (16, 26),
            Self::VeryHigh => (26, 52),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub tier: CostTier,
    pub setup_weeks_min: u32,
    pub setup_weeks_max: u32,
    pub annual_compliance_cost: f64,
}

/// Output of [`ComplexityCostEstimator::estimate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityEstimate {
    /// Complexity in `[0, 1]`.
    pub complexity: f64,
    /// Synergy discounts that applied to the selected set.
    pub discounts_applied: usize,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone)]
pub struct ComplexityCostEstimator {
    config: EstimationConfig,
}

impl ComplexityCostEstimator {
    pub fn new(config: EstimationConfig) -> Self {
        Self { config }
    }

    /// Step-wise base complexity for `count` selected jurisdictions.
    pub fn base_complexity(count: usize) -> f64 {
        match count {
            0 => 0.0,
            1 => 0.2,
            2 => 0.4,
            3 => 0.6,
            4 => 0.8,
            _ => 1.0,
        }
    }

    /// Estimate complexity and cost for the `selected` set.
    ///
    /// Each synergy whose two members are both selected discounts the base
    /// complexity multiplicatively.
    pub fn estimate(&self, selected: &[JurisdictionId], synergies: &[SynergyMatch]) -> ComplexityEstimate {
        let mut complexity = Self::base_complexity(selected.len());
        let mut discounts_applied = 0;
        for m in synergies {
            if selected.contains(&m.pair.first) && selected.contains(&m.pair.second) {
                complexity *= clamp_unit(m.complexity_discount);
                discounts_applied += 1;
            }
        }
        let complexity = clamp_unit(complexity);

        let tier = CostTier::from_complexity(complexity);
        let (setup_weeks_min, setup_weeks_max) = tier.setup_weeks();
        let annual_compliance_cost =
            self.config.annual_cost_per_jurisdiction * selected.len() as f64 * (0.5 + complexity);

        ComplexityEstimate {
            complexity,
            discounts_applied,
            cost: CostEstimate {
                tier,
                setup_weeks_min,
                setup_weeks_max,
                annual_compliance_cost,
            },
        }
    }
}
