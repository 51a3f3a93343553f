//! Primary / secondary jurisdiction selection.
//!
//! Usable results are re-scored with a business affinity bonus, stably
//! sorted (first requested wins ties) and cut at the acceptance threshold.

use serde::{Deserialize, Serialize};

use crate::config::SelectionConfig;
use crate::domain::{clamp_unit, BusinessProfile, BusinessType, JurisdictionId, JurisdictionResult};

/// Condition under which a jurisdiction earns an affinity bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum AffinityCondition {
    BusinessType { types: Vec<BusinessType> },
    RevenueAbove { threshold: f64 },
    ProcessesPersonalData,
    HoldsIntellectualProperty,
}

impl AffinityCondition {
    pub fn matches(&self, profile: &BusinessProfile) -> bool {
        match self {
            Self::BusinessType { types } => types.contains(&profile.business_type),
            Self::RevenueAbove { threshold } => profile.revenue > *threshold,
            Self::ProcessesPersonalData => profile.processes_personal_data,
            Self::HoldsIntellectualProperty => profile.holds_intellectual_property,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityRule {
    pub jurisdiction: JurisdictionId,
    pub condition: AffinityCondition,
    pub bonus: f64,
}

/// Ordered affinity rules; the first matching rule per jurisdiction wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityTable {
    pub rules: Vec<AffinityRule>,
}

impl AffinityTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rule(
        mut self,
        jurisdiction: impl Into<JurisdictionId>,
        condition: AffinityCondition,
        bonus: f64,
    ) -> Self {
        self.rules.push(AffinityRule {
            jurisdiction: jurisdiction.into(),
            condition,
            bonus,
        });
        self
    }

    /// Built-in affinities.
    ///
    /// | Jurisdiction | Condition                  | Bonus |
    /// |--------------|----------------------------|-------|
    /// | uk           | fintech or ai              | +0.05 |
    /// | ae           | crypto or trading          | +0.10 |
    /// | us           | revenue above 10 000 000   | +0.05 |
    /// | eu           | processes personal data    | +0.05 |
    /// | ch           | holds intellectual property| +0.10 |
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(
                "uk",
                AffinityCondition::BusinessType {
                    types: vec![BusinessType::Fintech, BusinessType::Ai],
                },
                0.05,
            )
            .with_rule(
                "ae",
                AffinityCondition::BusinessType {
                    types: vec![BusinessType::Crypto, BusinessType::Trading],
                },
                0.10,
            )
            .with_rule(
                "us",
                AffinityCondition::RevenueAbove {
                    threshold: 10_000_000.0,
                },
                0.05,
            )
            .with_rule("eu", AffinityCondition::ProcessesPersonalData, 0.05)
            .with_rule("ch", AffinityCondition::HoldsIntellectualProperty, 0.10)
    }

    /// Bonus for `jurisdiction` given `profile` (0 when nothing matches).
    pub fn bonus_for(&self, jurisdiction: &JurisdictionId, profile: &BusinessProfile) -> f64 {
        self.rules
            .iter()
            .find(|r| &r.jurisdiction == jurisdiction && r.condition.matches(profile))
            .map(|r| r.bonus)
            .unwrap_or(0.0)
    }
}

/// One row of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedJurisdiction {
    pub jurisdiction: JurisdictionId,
    pub base_score: f64,
    pub affinity_bonus: f64,
    pub adjusted_score: f64,
}

/// Output of [`JurisdictionSelector::select`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub primary: JurisdictionId,
    pub secondaries: Vec<JurisdictionId>,
    /// Usable jurisdictions, best first.
    pub ranking: Vec<RankedJurisdiction>,
    /// No usable entry cleared the acceptance threshold.
    pub low_confidence: bool,
}

impl Selection {
    /// Primary followed by the secondaries.
    pub fn selected(&self) -> Vec<JurisdictionId> {
        std::iter::once(self.primary.clone())
            .chain(self.secondaries.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct JurisdictionSelector {
    config: SelectionConfig,
    affinities: AffinityTable,
}

impl JurisdictionSelector {
    pub fn new(config: SelectionConfig, affinities: AffinityTable) -> Self {
        Self { config, affinities }
    }

    /// Rank `results` (in request order) and pick the primary and secondaries.
    ///
    /// There is always exactly one primary. If every result failed, the
    /// first requested jurisdiction is returned as primary with
    /// `low_confidence` set. Callers never pass an empty slice.
    pub fn select(&self, profile: &BusinessProfile, results: &[JurisdictionResult]) -> Selection {
        let mut ranking: Vec<RankedJurisdiction> = results
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| {
                let affinity_bonus = self.affinities.bonus_for(&r.jurisdiction, profile);
                RankedJurisdiction {
                    jurisdiction: r.jurisdiction.clone(),
                    base_score: r.score,
                    affinity_bonus,
                    adjusted_score: clamp_unit(r.score + affinity_bonus),
                }
            })
            .collect();

        // `sort_by` is stable, so equal scores keep request order.
        ranking.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));

        let threshold = self.config.acceptance_threshold;
        if ranking.is_empty() {
            let primary = results
                .first()
                .map(|r| r.jurisdiction.clone())
                .or_else(|| profile.jurisdictions.first().cloned())
                .unwrap_or_else(|| JurisdictionId::new("unassigned"));
            return Selection {
                primary,
                secondaries: Vec::new(),
                ranking,
                low_confidence: true,
            };
        }

        let primary = ranking[0].jurisdiction.clone();
        let secondaries = ranking
            .iter()
            .skip(1)
            .take(self.config.max_secondaries)
            .filter(|r| r.adjusted_score > threshold)
            .map(|r| r.jurisdiction.clone())
            .collect();
        let low_confidence = ranking.iter().all(|r| r.adjusted_score <= threshold);

        Selection {
            primary,
            secondaries,
            ranking,
            low_confidence,
        }
    }
}

/// One-sentence explanation for the chosen primary.
pub fn selection_rationale(profile: &BusinessProfile, primary: &JurisdictionId) -> String {
    let business = profile.business_type;
    match primary.as_str() {
        "uk" => format!(
            "UK selected for {business} due to regulatory expertise and favorable business environment"
        ),
        "us" => format!("US selected for large market access and mature {business} ecosystem"),
        "ae" => "UAE selected for tax efficiency and strategic regional positioning".to_string(),
        "eu" => "EU selected for single market access and regulatory harmonization".to_string(),
        "ch" => "Switzerland selected for international structuring advantages and tax optimization"
            .to_string(),
        other => format!("{other} selected based on compliance score analysis"),
    }
}

/// Market-access benefits opened up by the selected jurisdictions.
pub fn market_access_benefits(selected: &[JurisdictionId]) -> Vec<String> {
    const BENEFITS: &[(&str, &str)] = &[
        ("uk", "Commonwealth market access and English common law advantages"),
        ("us", "Americas market access and largest single market"),
        ("ae", "Middle East and Africa regional hub access"),
        ("eu", "European single market with 450M+ consumers"),
        ("ch", "International neutrality and global financial center access"),
    ];

    BENEFITS
        .iter()
        .filter(|(code, _)| selected.iter().any(|j| j.as_str() == *code))
        .map(|(_, benefit)| (*benefit).to_string())
        .collect()
}
