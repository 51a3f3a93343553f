//! Per-jurisdiction rulebooks: the constants a [`crate::RulebookProvider`]
//! scores against.

use std::path::Path;

use gcoe_core::JurisdictionId;
use serde::{Deserialize, Serialize};

/// Errors produced while loading rulebooks from disk.
#[derive(Debug, thiserror::Error)]
pub enum RulebookError {
    #[error("failed to read rulebook file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse rulebooks: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid rulebook for {jurisdiction}: {reason}")]
    Invalid {
        jurisdiction: String,
        reason: String,
    },
}

/// Relative importance of each scored dimension. Sums to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub structure: f64,
    pub tax: f64,
    pub data_protection: f64,
    pub employment: f64,
    pub regulatory: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            structure: 0.15,
            tax: 0.25,
            data_protection: 0.25,
            employment: 0.15,
            regulatory: 0.20,
        }
    }
}

impl DimensionWeights {
    pub fn total(&self) -> f64 {
        self.structure + self.tax + self.data_protection + self.employment + self.regulatory
    }
}

/// Revenue above which an entity counts as established for structure scoring.
pub const ESTABLISHED_REVENUE: f64 = 100_000.0;

/// Effective tax rate that maps to a tax sub-score of zero.
pub const TAX_RATE_CEILING: f64 = 0.35;

/// Share of remote staff above which the remote-work factor applies.
pub const REMOTE_SHARE_LIMIT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rulebook {
    pub jurisdiction: JurisdictionId,
    /// Display name reported by the provider.
    pub name: String,
    /// Statutory corporate rate.
    pub headline_tax_rate: f64,
    /// Rate reachable with standard planning.
    pub optimised_tax_rate: f64,
    /// Preferential rate for IP income, if the jurisdiction has a regime.
    #[serde(default)]
    pub ip_regime_rate: Option<f64>,
    pub structure_score_established: f64,
    pub structure_score_early: f64,
    pub data_protection_base: f64,
    /// Multiplier when personal data is processed.
    pub personal_data_factor: f64,
    /// Multiplier when data leaves the jurisdiction.
    pub transfer_factor: f64,
    pub employment_base: f64,
    /// Multiplier when more than half the staff is remote.
    pub remote_factor: f64,
    pub regulatory_score: f64,
    #[serde(default)]
    pub weights: DimensionWeights,
}

impl Rulebook {
    /// Rate applied to `holds_ip` profiles after planning.
    pub fn effective_rate(&self, holds_ip: bool) -> f64 {
        match self.ip_regime_rate {
            Some(ip) if holds_ip => self.optimised_tax_rate.min(ip),
            _ => self.optimised_tax_rate,
        }
    }

    pub fn validate(&self) -> Result<(), RulebookError> {
        let invalid = |reason: String| RulebookError::Invalid {
            jurisdiction: self.jurisdiction.to_string(),
            reason,
        };

        if self.jurisdiction.is_blank() {
            return Err(invalid("jurisdiction must not be blank".into()));
        }
        let unit_fields = [
            ("headline_tax_rate", self.headline_tax_rate),
            ("optimised_tax_rate", self.optimised_tax_rate),
            ("structure_score_established", self.structure_score_established),
            ("structure_score_early", self.structure_score_early),
            ("data_protection_base", self.data_protection_base),
            ("personal_data_factor", self.personal_data_factor),
            ("transfer_factor", self.transfer_factor),
            ("employment_base", self.employment_base),
            ("remote_factor", self.remote_factor),
            ("regulatory_score", self.regulatory_score),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{field} must be in [0, 1], got {value}")));
            }
        }
        if let Some(ip) = self.ip_regime_rate {
            if !(0.0..=1.0).contains(&ip) {
                return Err(invalid(format!("ip_regime_rate must be in [0, 1], got {ip}")));
            }
        }
        if self.optimised_tax_rate > self.headline_tax_rate {
            return Err(invalid(
                "optimised_tax_rate must not exceed headline_tax_rate".into(),
            ));
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(invalid(format!(
                "dimension weights must sum to 1, got {}",
                self.weights.total()
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON array of rulebooks.
    pub fn list_from_json_str(raw: &str) -> Result<Vec<Self>, RulebookError> {
        let books: Vec<Self> = serde_json::from_str(raw)?;
        for book in &books {
            book.validate()?;
        }
        Ok(books)
    }

    pub fn list_from_json_file(path: &Path) -> Result<Vec<Self>, RulebookError> {
        let raw = std::fs::read_to_string(path)?;
        Self::list_from_json_str(&raw)
    }

    pub fn uk() -> Self {
        Self {
            jurisdiction: "uk".into(),
            name: "UK corporate rulebook".into(),
            headline_tax_rate: 0.25,
            optimised_tax_rate: 0.19,
            ip_regime_rate: Some(0.10),
            structure_score_established: 0.9,
            structure_score_early: 0.7,
            data_protection_base: 0.9,
            personal_data_factor: 0.8,
            transfer_factor: 0.9,
            employment_base: 0.8,
            remote_factor: 0.95,
            regulatory_score: 0.8,
            weights: DimensionWeights::default(),
        }
    }

    pub fn us() -> Self {
        Self {
            jurisdiction: "us".into(),
            name: "US federal rulebook".into(),
            headline_tax_rate: 0.21,
            optimised_tax_rate: 0.17,
            ip_regime_rate: None,
            structure_score_established: 0.85,
            structure_score_early: 0.7,
            data_protection_base: 0.85,
            personal_data_factor: 0.7,
            transfer_factor: 0.95,
            employment_base: 0.8,
            remote_factor: 0.9,
            regulatory_score: 0.8,
            weights: DimensionWeights::default(),
        }
    }

    pub fn ae() -> Self {
        Self {
            jurisdiction: "ae".into(),
            name: "UAE free zone rulebook".into(),
            headline_tax_rate: 0.09,
            optimised_tax_rate: 0.0,
            ip_regime_rate: None,
            structure_score_established: 0.9,
            structure_score_early: 0.8,
            data_protection_base: 0.9,
            personal_data_factor: 0.9,
            transfer_factor: 0.85,
            employment_base: 0.85,
            remote_factor: 0.95,
            regulatory_score: 0.85,
            weights: DimensionWeights::default(),
        }
    }

    pub fn eu() -> Self {
        Self {
            jurisdiction: "eu".into(),
            name: "EU (Netherlands) rulebook".into(),
            headline_tax_rate: 0.25,
            optimised_tax_rate: 0.19,
            ip_regime_rate: Some(0.09),
            structure_score_established: 0.85,
            structure_score_early: 0.7,
            data_protection_base: 0.85,
            personal_data_factor: 0.8,
            transfer_factor: 0.85,
            employment_base: 0.75,
            remote_factor: 0.9,
            regulatory_score: 0.75,
            weights: DimensionWeights::default(),
        }
    }

    pub fn ch() -> Self {
        Self {
            jurisdiction: "ch".into(),
            name: "Swiss cantonal rulebook".into(),
            headline_tax_rate: 0.196,
            optimised_tax_rate: 0.1195,
            ip_regime_rate: Some(0.077),
            structure_score_established: 0.9,
            structure_score_early: 0.75,
            data_protection_base: 0.9,
            personal_data_factor: 0.85,
            transfer_factor: 0.9,
            employment_base: 0.85,
            remote_factor: 0.95,
            regulatory_score: 0.85,
            weights: DimensionWeights::default(),
        }
    }

    /// Built-in rulebooks for uk, us, ae, eu and ch.
    pub fn standard() -> Vec<Self> {
        vec![Self::uk(), Self::us(), Self::ae(), Self::eu(), Self::ch()]
    }
}
