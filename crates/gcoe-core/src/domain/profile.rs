//! The immutable request record handed to every provider.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{RequestError, RequestResult};
use super::jurisdiction::JurisdictionId;

/// Profit assumed as a share of revenue when the caller does not declare one.
pub const DEFAULT_PROFIT_MARGIN: f64 = 0.2;

/// Declared line of business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Technology,
    Fintech,
    Ai,
    Crypto,
    Trading,
    Ecommerce,
    Saas,
    Manufacturing,
    Consulting,
    Healthcare,
    #[serde(other)]
    Other,
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Technology => "technology",
            Self::Fintech => "fintech",
            Self::Ai => "ai",
            Self::Crypto => "crypto",
            Self::Trading => "trading",
            Self::Ecommerce => "ecommerce",
            Self::Saas => "saas",
            Self::Manufacturing => "manufacturing",
            Self::Consulting => "consulting",
            Self::Healthcare => "healthcare",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A business asking for a multi-jurisdiction compliance assessment.
///
/// Built once per request and shared read-only with every provider task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub company_name: String,
    #[serde(default)]
    pub business_type: BusinessType,
    /// Declared annual revenue.
    pub revenue: f64,
    /// Declared annual profit; see [`BusinessProfile::effective_profit`].
    #[serde(default)]
    pub profit: Option<f64>,
    /// Assumed `true` when not declared.
    #[serde(default = "assume_personal_data")]
    pub processes_personal_data: bool,
    #[serde(default)]
    pub international_data_transfers: bool,
    #[serde(default)]
    pub holds_intellectual_property: bool,
    #[serde(default)]
    pub employees: u32,
    #[serde(default)]
    pub remote_employees: u32,
    /// Requested jurisdictions in caller preference order.
    #[serde(default)]
    pub jurisdictions: Vec<JurisdictionId>,
}

impl BusinessProfile {
    /// Minimal profile; the remaining attributes take their undeclared
    /// defaults, so personal data processing is assumed.
    pub fn new(
        company_name: impl Into<String>,
        business_type: BusinessType,
        revenue: f64,
        jurisdictions: Vec<JurisdictionId>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            business_type,
            revenue,
            profit: None,
            processes_personal_data: true,
            international_data_transfers: false,
            holds_intellectual_property: false,
            employees: 0,
            remote_employees: 0,
            jurisdictions,
        }
    }

    /// Replace the requested jurisdictions (builder pattern).
    pub fn with_jurisdictions<I, J>(mut self, jurisdictions: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: Into<JurisdictionId>,
    {
        self.jurisdictions = jurisdictions.into_iter().map(Into::into).collect();
        self
    }

    /// Declared profit, or [`DEFAULT_PROFIT_MARGIN`] of revenue.
    pub fn effective_profit(&self) -> f64 {
        self.profit
            .unwrap_or(self.revenue * DEFAULT_PROFIT_MARGIN)
            .max(0.0)
    }

    /// Check the profile at the boundary, before any provider is invoked.
    pub fn validate(&self) -> RequestResult<()> {
        if self.company_name.trim().is_empty() {
            return Err(RequestError::MissingField {
                field: "company_name".to_string(),
            });
        }
        check_amount("revenue", self.revenue)?;
        if let Some(profit) = self.profit {
            check_amount("profit", profit)?;
        }
        if self.remote_employees > self.employees {
            return Err(RequestError::InvalidField {
                field: "remote_employees".to_string(),
                reason: format!(
                    "{} remote employees exceeds headcount {}",
                    self.remote_employees, self.employees
                ),
            });
        }

        if self.jurisdictions.is_empty() {
            return Err(RequestError::EmptyJurisdictions);
        }
        let mut seen = HashSet::new();
        for (position, id) in self.jurisdictions.iter().enumerate() {
            if id.is_blank() {
                return Err(RequestError::BlankJurisdiction { position });
            }
            if !seen.insert(id) {
                return Err(RequestError::DuplicateJurisdiction {
                    jurisdiction: id.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn assume_personal_data() -> bool {
    true
}

fn check_amount(field: &str, value: f64) -> RequestResult<()> {
    if !value.is_finite() {
        return Err(RequestError::InvalidField {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(RequestError::InvalidField {
            field: field.to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(())
}
