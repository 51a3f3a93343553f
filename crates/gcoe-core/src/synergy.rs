//! Cross-jurisdiction synergy bonuses.
//!
//! A [`SynergyTable`] maps unordered jurisdiction pairs to a bonus rule.
//! [`SynergyDetector::detect`] walks every pair of usable results once,
//! in request order, and sums the matched bonuses. Rules that share a
//! `group` pay out once per request. Bonuses only feed the savings total;
//! they never touch per-jurisdiction scores.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{BusinessProfile, JurisdictionId, JurisdictionPair, JurisdictionResult};

/// How a synergy's savings are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynergyBonus {
    /// Fraction of declared revenue.
    RevenueShare { rate: f64 },
    /// Fraction of [`BusinessProfile::effective_profit`].
    ProfitShare { rate: f64 },
    /// Fixed annual amount.
    Flat { amount: f64 },
}

impl SynergyBonus {
    pub fn amount_for(&self, profile: &BusinessProfile) -> f64 {
        let amount = match self {
            Self::RevenueShare { rate } => profile.revenue * rate,
            Self::ProfitShare { rate } => profile.effective_profit() * rate,
            Self::Flat { amount } => *amount,
        };
        if amount.is_finite() {
            amount.max(0.0)
        } else {
            0.0
        }
    }
}

/// A recognised relationship between two jurisdictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub bonus: SynergyBonus,
    pub rationale: String,
    /// Multiplier applied to compliance complexity when both members are
    /// selected. Expected in `(0, 1]`.
    pub complexity_discount: f64,
    /// Rules in the same group pay their bonus at most once per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Bonus group for Swiss international structuring.
pub const CH_STRUCTURING: &str = "ch_structuring";
/// Bonus group for the UAE regional hub.
pub const AE_REGIONAL_HUB: &str = "ae_regional_hub";

/// Static pair → rule lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynergyTable {
    rules: BTreeMap<JurisdictionPair, SynergyRule>,
}

impl SynergyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a rule for the unordered pair `(a, b)` and return `self`.
    pub fn with_rule(
        mut self,
        a: impl Into<JurisdictionId>,
        b: impl Into<JurisdictionId>,
        rule: SynergyRule,
    ) -> Self {
        self.rules
            .insert(JurisdictionPair::new(a.into(), b.into()), rule);
        self
    }

    /// The built-in treaty / trade-agreement table.
    ///
    /// | Pairs                   | Bonus          | Group             | Complexity |
    /// |-------------------------|----------------|-------------------|------------|
    /// | eu-uk                   | 2% of revenue  |                   | ×0.90      |
    /// | ch with eu, uk or us    | 15% of profit  | `ch_structuring`  | ×0.95      |
    /// | ae with eu, uk, us or ch| 3% of revenue  | `ae_regional_hub` | ×0.95      |
    /// | uk-us                   | none           |                   | ×0.95      |
    pub fn standard() -> Self {
        let rule = |bonus: SynergyBonus, rationale: &str, discount: f64, group: Option<&str>| {
            SynergyRule {
                bonus,
                rationale: rationale.to_string(),
                complexity_discount: discount,
                group: group.map(str::to_string),
            }
        };

        let mut table = Self::empty()
            .with_rule(
                "uk",
                "eu",
                rule(
                    SynergyBonus::RevenueShare { rate: 0.02 },
                    "Trade and cooperation agreement eases UK-EU trade",
                    0.90,
                    None,
                ),
            )
            .with_rule(
                "uk",
                "us",
                rule(
                    SynergyBonus::Flat { amount: 0.0 },
                    "UK-US double taxation treaty",
                    0.95,
                    None,
                ),
            );

        for (partner, rationale) in [
            ("eu", "Swiss-EU bilateral agreements support international structuring"),
            ("uk", "Swiss holding structure over UK operations"),
            ("us", "US-Swiss double taxation treaty and banking cooperation"),
        ] {
            table = table.with_rule(
                "ch",
                partner,
                rule(
                    SynergyBonus::ProfitShare { rate: 0.15 },
                    rationale,
                    0.95,
                    Some(CH_STRUCTURING),
                ),
            );
        }

        for (partner, rationale) in [
            ("eu", "UAE-EU strategic partnership and investment protection"),
            ("uk", "UAE regional hub for UK operations"),
            ("us", "UAE regional hub for US operations"),
            ("ch", "UAE regional hub alongside Swiss structuring"),
        ] {
            table = table.with_rule(
                "ae",
                partner,
                rule(
                    SynergyBonus::RevenueShare { rate: 0.03 },
                    rationale,
                    0.95,
                    Some(AE_REGIONAL_HUB),
                ),
            );
        }
        table
    }

    pub fn get(&self, pair: &JurisdictionPair) -> Option<&SynergyRule> {
        self.rules.get(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JurisdictionPair, &SynergyRule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One matched pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyMatch {
    pub pair: JurisdictionPair,
    pub bonus: f64,
    pub rationale: String,
    pub complexity_discount: f64,
}

/// Output of [`SynergyDetector::detect`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynergyReport {
    pub total_bonus: f64,
    pub matches: Vec<SynergyMatch>,
}

impl SynergyReport {
    pub fn rationales(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.rationale.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SynergyDetector {
    table: SynergyTable,
}

impl SynergyDetector {
    pub fn new(table: SynergyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SynergyTable {
        &self.table
    }

    /// Find every table pair present among the usable `results`.
    ///
    /// Each unordered pair is counted at most once, however many times its
    /// members show up in `results`. A pair whose group has already paid is
    /// still reported, with a zero bonus.
    pub fn detect(&self, profile: &BusinessProfile, results: &[JurisdictionResult]) -> SynergyReport {
        let present: Vec<&JurisdictionId> = results
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| &r.jurisdiction)
            .collect();

        let mut seen: HashSet<JurisdictionPair> = HashSet::new();
        let mut paid_groups: HashSet<&str> = HashSet::new();
        let mut report = SynergyReport::default();

        for (i, a) in present.iter().enumerate() {
            for b in &present[i + 1..] {
                if a == b {
                    continue;
                }
                let pair = JurisdictionPair::new((*a).clone(), (*b).clone());
                if !seen.insert(pair.clone()) {
                    continue;
                }
                if let Some(rule) = self.table.get(&pair) {
                    let first_in_group = match rule.group.as_deref() {
                        Some(group) => paid_groups.insert(group),
                        None => true,
                    };
                    let bonus = if first_in_group {
                        rule.bonus.amount_for(profile)
                    } else {
                        0.0
                    };
                    report.total_bonus += bonus;
                    report.matches.push(SynergyMatch {
                        pair,
                        bonus,
                        rationale: rule.rationale.clone(),
                        complexity_discount: rule.complexity_discount,
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Assessment, BusinessType, FailureReason};

    fn profile() -> BusinessProfile {
        BusinessProfile::new("Acme Ltd", BusinessType::Technology, 12_000_000.0, vec![])
    }

    fn ok(id: &str) -> JurisdictionResult {
        JurisdictionResult::succeeded(id.into(), Assessment::new(0.9, 0.0))
    }

    #[test]
    fn test_standard_table_is_order_independent() {
        let table = SynergyTable::standard();
        let pair = JurisdictionPair::new("eu".into(), "uk".into());
        assert!(table.get(&pair).is_some());
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn test_detects_revenue_share_bonus() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("uk"), ok("eu")]);
        assert_eq!(report.matches.len(), 1);
        assert!((report.total_bonus - 240_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_entries_count_once() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("uk"), ok("eu"), ok("uk"), ok("eu")]);
        assert_eq!(report.matches.len(), 1);
        assert!((report.total_bonus - 240_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_swiss_structuring_pays_once_on_profit() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let mut p = profile();
        p.profit = Some(3_000_000.0);

        let report = detector.detect(&p, &[ok("ch"), ok("uk"), ok("us")]);
        let pairs: Vec<String> = report.matches.iter().map(|m| m.pair.to_string()).collect();
        assert_eq!(pairs, vec!["ch-uk", "ch-us", "uk-us"]);
        // ch-uk pays 15% of profit; ch-us shares its group; uk-us carries no bonus.
        assert!((report.matches[0].bonus - 450_000.0).abs() < 1e-6);
        assert_eq!(report.matches[1].bonus, 0.0);
        assert_eq!(report.matches[2].bonus, 0.0);
        assert!((report.total_bonus - 450_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_swiss_structuring_falls_back_to_profit_margin() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("eu"), ok("ch")]);
        // 12M revenue, 20% assumed margin, 15% structuring benefit.
        assert!((report.total_bonus - 360_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_uae_hub_pays_three_percent_of_revenue_once() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("ae"), ok("eu"), ok("us")]);
        let paid: Vec<&JurisdictionPair> = report
            .matches
            .iter()
            .filter(|m| m.bonus > 0.0)
            .map(|m| &m.pair)
            .collect();
        assert_eq!(paid, vec![&JurisdictionPair::new("ae".into(), "eu".into())]);
        assert_eq!(report.matches.len(), 2);
        assert!((report.total_bonus - 360_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_lone_jurisdiction_has_no_synergy() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("ae")]);
        assert!(report.matches.is_empty());
        assert_eq!(report.total_bonus, 0.0);
    }

    #[test]
    fn test_failed_results_do_not_participate() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let failed = JurisdictionResult::failed(
            "eu".into(),
            FailureReason::Timeout { limit_ms: 5 },
        );
        let report = detector.detect(&profile(), &[ok("uk"), failed]);
        assert!(report.matches.is_empty());
        assert_eq!(report.total_bonus, 0.0);
    }

    #[test]
    fn test_fallback_results_participate() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let fb = JurisdictionResult::fallback(
            "us".into(),
            0.7,
            FailureReason::ProviderError {
                message: "x".into(),
            },
        );
        let report = detector.detect(&profile(), &[ok("ch"), fb]);
        assert_eq!(
            report.rationales(),
            vec!["US-Swiss double taxation treaty and banking cooperation"]
        );
        assert!((report.total_bonus - 360_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_matches_follow_request_order() {
        let detector = SynergyDetector::new(SynergyTable::standard());
        let report = detector.detect(&profile(), &[ok("us"), ok("ch"), ok("eu")]);
        let pairs: Vec<String> = report.matches.iter().map(|m| m.pair.to_string()).collect();
        assert_eq!(pairs, vec!["ch-us", "ch-eu"]);
    }
}
