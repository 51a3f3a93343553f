//! Engine configuration.
//!
//! Every tuning constant of the pipeline lives here so it can be overridden
//! from a JSON file. `Default` reproduces the documented values.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What a timed-out provider call turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// `Failed` with reason `timeout`; excluded from aggregation.
    Fail,
    /// `FallbackUsed` with the fallback score.
    Fallback,
}

/// Fan-out limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum provider calls in flight at once.
    pub max_in_flight: usize,
    /// Per-call deadline (milliseconds), measured from when the call starts.
    pub provider_timeout_ms: u64,
    pub timeout_policy: TimeoutPolicy,
    /// Score substituted when a provider errors.
    pub fallback_score: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            provider_timeout_ms: 5_000,
            timeout_policy: TimeoutPolicy::Fail,
            fallback_score: 0.70,
        }
    }
}

/// Weights for the global composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the first requested jurisdiction.
    pub primary_weight: f64,
    /// Weight of every other jurisdiction.
    pub secondary_weight: f64,
    /// Multiplier applied to `FallbackUsed` results. Must be in `(0, 1)`.
    pub fallback_weight_factor: f64,
    /// Composite reported when no provider produced a usable result.
    pub neutral_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            primary_weight: 1.0,
            secondary_weight: 0.7,
            fallback_weight_factor: 0.7,
            neutral_score: 0.8,
        }
    }
}

/// Primary / secondary selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Secondaries must score strictly above this.
    pub acceptance_threshold: f64,
    pub max_secondaries: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.70,
            max_secondaries: 3,
        }
    }
}

/// Cost model for the complexity estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Ongoing annual compliance cost of one jurisdiction at zero complexity
    /// is half of this; at full complexity it is one and a half times it.
    pub annual_cost_per_jurisdiction: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            annual_cost_per_jurisdiction: 25_000.0,
        }
    }
}

/// Top-level configuration for [`crate::ComplianceEngine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub orchestrator: OrchestratorConfig,
    pub scoring: ScoringConfig,
    pub selection: SelectionConfig,
    pub estimation: EstimationConfig,
}

impl EngineConfig {
    /// Load and validate a JSON config file. Missing sections take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.orchestrator;
        if o.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.max_in_flight must be at least 1".into(),
            ));
        }
        if o.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.provider_timeout_ms must be positive".into(),
            ));
        }
        unit("orchestrator.fallback_score", o.fallback_score)?;

        let s = &self.scoring;
        unit("scoring.primary_weight", s.primary_weight)?;
        unit("scoring.secondary_weight", s.secondary_weight)?;
        unit("scoring.neutral_score", s.neutral_score)?;
        if !(s.fallback_weight_factor > 0.0 && s.fallback_weight_factor < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scoring.fallback_weight_factor must be in (0, 1), got {}",
                s.fallback_weight_factor
            )));
        }
        if s.primary_weight == 0.0 && s.secondary_weight == 0.0 {
            return Err(ConfigError::Invalid(
                "scoring weights must not all be zero".into(),
            ));
        }

        unit(
            "selection.acceptance_threshold",
            self.selection.acceptance_threshold,
        )?;

        let cost = self.estimation.annual_cost_per_jurisdiction;
        if !cost.is_finite() || cost < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "estimation.annual_cost_per_jurisdiction must be non-negative, got {cost}"
            )));
        }
        Ok(())
    }
}

fn unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.orchestrator.fallback_score, 0.70);
        assert_eq!(cfg.scoring.neutral_score, 0.8);
        assert_eq!(cfg.selection.acceptance_threshold, 0.70);
        assert_eq!(cfg.orchestrator.timeout_policy, TimeoutPolicy::Fail);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "orchestrator": { "max_in_flight": 2, "timeout_policy": "fallback" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.orchestrator.max_in_flight, 2);
        assert_eq!(cfg.orchestrator.timeout_policy, TimeoutPolicy::Fallback);
        assert_eq!(cfg.orchestrator.provider_timeout_ms, 5_000);
        assert_eq!(cfg.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_fallback_factor_must_be_below_one() {
        let err = EngineConfig::from_json_str(r#"{ "scoring": { "fallback_weight_factor": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_in_flight_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.orchestrator.max_in_flight = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "selection": {{ "max_secondaries": 1 }} }}"#).unwrap();
        let cfg = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.selection.max_secondaries, 1);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
