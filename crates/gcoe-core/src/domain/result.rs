//! Per-jurisdiction outcomes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::jurisdiction::JurisdictionId;

/// Clamp a score or weight into `[0, 1]`. Non-finite input maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// What a provider hands back for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Composite compliance score in `[0, 1]`.
    pub score: f64,
    /// Estimated annual tax / cost savings.
    pub savings: f64,
    /// Named compliance dimensions, each in `[0, 1]`.
    #[serde(default)]
    pub sub_scores: BTreeMap<String, f64>,
}

impl Assessment {
    pub fn new(score: f64, savings: f64) -> Self {
        Self {
            score,
            savings,
            sub_scores: BTreeMap::new(),
        }
    }

    pub fn with_sub_score(mut self, dimension: impl Into<String>, score: f64) -> Self {
        self.sub_scores.insert(dimension.into(), score);
        self
    }

    /// Reject values that cannot be clamped into meaning.
    pub fn check(&self) -> Result<(), String> {
        if !self.score.is_finite() {
            return Err(format!("composite score is not finite: {}", self.score));
        }
        if !self.savings.is_finite() {
            return Err(format!("savings estimate is not finite: {}", self.savings));
        }
        for (dimension, value) in &self.sub_scores {
            if dimension.trim().is_empty() {
                return Err("sub-score with empty dimension name".to_string());
            }
            if !value.is_finite() {
                return Err(format!("sub-score {dimension} is not finite"));
            }
        }
        Ok(())
    }
}

/// How a provider call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
    FallbackUsed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::FallbackUsed => write!(f, "fallback_used"),
        }
    }
}

/// Why a result is not a plain success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The call exceeded its deadline.
    Timeout { limit_ms: u64 },
    /// No provider is registered for the identifier.
    UnknownJurisdiction,
    /// The provider returned an error value.
    ProviderError { message: String },
    /// The provider task panicked or was lost.
    ProviderPanicked { message: String },
    /// The provider returned an assessment that could not be used.
    InvalidAssessment { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { limit_ms } => write!(f, "timeout after {limit_ms}ms"),
            Self::UnknownJurisdiction => write!(f, "unknown jurisdiction"),
            Self::ProviderError { message } => write!(f, "provider error: {message}"),
            Self::ProviderPanicked { message } => write!(f, "provider panicked: {message}"),
            Self::InvalidAssessment { message } => write!(f, "invalid assessment: {message}"),
        }
    }
}

/// The outcome for one requested jurisdiction.
///
/// Produced exactly once by the orchestrator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionResult {
    pub jurisdiction: JurisdictionId,
    /// Composite compliance score, clamped to `[0, 1]`.
    pub score: f64,
    /// Non-negative savings estimate.
    pub savings: f64,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// Set whenever the score is a substitute rather than a provider answer.
    pub degraded: bool,
    #[serde(default)]
    pub sub_scores: BTreeMap<String, f64>,
}

impl JurisdictionResult {
    /// Wrap a provider answer, clamping every value into range.
    pub fn succeeded(jurisdiction: JurisdictionId, assessment: Assessment) -> Self {
        Self {
            jurisdiction,
            score: clamp_unit(assessment.score),
            savings: assessment.savings.max(0.0),
            status: ExecutionStatus::Succeeded,
            failure: None,
            degraded: false,
            sub_scores: assessment
                .sub_scores
                .into_iter()
                .map(|(k, v)| (k, clamp_unit(v)))
                .collect(),
        }
    }

    /// Conservative substitute used when a provider could not answer.
    pub fn fallback(
        jurisdiction: JurisdictionId,
        fallback_score: f64,
        reason: FailureReason,
    ) -> Self {
        Self {
            jurisdiction,
            score: clamp_unit(fallback_score),
            savings: 0.0,
            status: ExecutionStatus::FallbackUsed,
            failure: Some(reason),
            degraded: true,
            sub_scores: BTreeMap::new(),
        }
    }

    /// A result that contributes nothing to aggregation.
    pub fn failed(jurisdiction: JurisdictionId, reason: FailureReason) -> Self {
        Self {
            jurisdiction,
            score: 0.0,
            savings: 0.0,
            status: ExecutionStatus::Failed,
            failure: Some(reason),
            degraded: true,
            sub_scores: BTreeMap::new(),
        }
    }

    /// `true` for results that may take part in synergy and selection.
    pub fn is_usable(&self) -> bool {
        self.status != ExecutionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_clamps_out_of_range_values() {
        let assessment = Assessment::new(1.4, -10.0).with_sub_score("tax", -0.3);
        let result = JurisdictionResult::succeeded("uk".into(), assessment);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.savings, 0.0);
        assert_eq!(result.sub_scores["tax"], 0.0);
        assert!(!result.degraded);
    }

    #[test]
    fn test_check_rejects_nan_score() {
        let assessment = Assessment::new(f64::NAN, 0.0);
        assert!(assessment.check().is_err());
    }

    #[test]
    fn test_fallback_is_degraded_and_usable() {
        let result = JurisdictionResult::fallback(
            "us".into(),
            0.7,
            FailureReason::ProviderError {
                message: "boom".to_string(),
            },
        );
        assert!(result.degraded);
        assert!(result.is_usable());
        assert_eq!(result.status, ExecutionStatus::FallbackUsed);
    }

    #[test]
    fn test_failed_is_not_usable() {
        let result = JurisdictionResult::failed("xx".into(), FailureReason::UnknownJurisdiction);
        assert!(!result.is_usable());
        assert_eq!(result.failure.unwrap().to_string(), "unknown jurisdiction");
    }

    #[test]
    fn test_failure_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(FailureReason::Timeout { limit_ms: 50 }).unwrap();
        assert_eq!(json["kind"], "timeout");
        assert_eq!(json["limit_ms"], 50);
    }

    #[test]
    fn test_result_carries_no_timing_fields() {
        let result = JurisdictionResult::succeeded("uk".into(), Assessment::new(0.8, 10.0));
        let json = serde_json::to_value(&result).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["degraded", "jurisdiction", "savings", "score", "status", "sub_scores"]
        );
    }
}
