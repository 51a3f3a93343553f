//! The global report handed back to callers, plus a Markdown rendering.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateScore;
use crate::domain::{ExecutionStatus, JurisdictionId, JurisdictionResult};
use crate::estimate::CostEstimate;
use crate::selector::RankedJurisdiction;
use crate::synergy::SynergyReport;

/// How much the composite score can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every provider answered.
    Full,
    /// At least one result is a fallback or failure.
    Reduced,
    /// Nothing usable, or nothing cleared the acceptance threshold.
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// One full assessment. Built once per request and never mutated.
///
/// No wall-clock fields: identical inputs with identical provider outputs
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalReport {
    pub company_name: String,
    pub requested: Vec<JurisdictionId>,
    /// Exactly one entry per requested jurisdiction, in request order.
    pub results: Vec<JurisdictionResult>,
    pub composite_score: f64,
    pub aggregate: AggregateScore,
    pub confidence: Confidence,
    pub primary: JurisdictionId,
    pub secondaries: Vec<JurisdictionId>,
    pub ranking: Vec<RankedJurisdiction>,
    pub synergy: SynergyReport,
    /// Sum of savings reported by usable results.
    pub jurisdiction_savings: f64,
    /// `jurisdiction_savings` plus synergy bonuses.
    pub total_savings: f64,
    pub complexity_score: f64,
    pub cost_estimate: CostEstimate,
    pub selection_rationale: String,
    pub market_access: Vec<String>,
}

impl GlobalReport {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }

    pub fn result_for(&self, jurisdiction: &JurisdictionId) -> Option<&JurisdictionResult> {
        self.results.iter().find(|r| &r.jurisdiction == jurisdiction)
    }

    /// Results that were not a plain success.
    pub fn degraded_results(&self) -> impl Iterator<Item = &JurisdictionResult> {
        self.results
            .iter()
            .filter(|r| r.status != ExecutionStatus::Succeeded)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Render a report as Markdown for terminals and CI summaries.
pub fn render_report_md(report: &GlobalReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Compliance Report: {}\n\n", report.company_name));
    out.push_str(&format!(
        "- composite score: {:.3}\n- confidence: {}\n- primary: {}\n",
        report.composite_score, report.confidence, report.primary
    ));
    if !report.secondaries.is_empty() {
        let names: Vec<&str> = report.secondaries.iter().map(|j| j.as_str()).collect();
        out.push_str(&format!("- secondaries: {}\n", names.join(", ")));
    }
    out.push_str(&format!("- rationale: {}\n\n", report.selection_rationale));

    out.push_str("## Jurisdictions\n");
    out.push_str("| jurisdiction | status | score | savings |\n");
    out.push_str("|---|---|---|---|\n");
    for r in &report.results {
        out.push_str(&format!(
            "| {} | {} | {:.3} | {:.0} |\n",
            r.jurisdiction, r.status, r.score, r.savings
        ));
    }
    out.push('\n');

    let degraded: Vec<&JurisdictionResult> = report.degraded_results().collect();
    if !degraded.is_empty() {
        out.push_str("### Degraded\n");
        for r in degraded {
            match &r.failure {
                Some(reason) => out.push_str(&format!("- `{}`: {}\n", r.jurisdiction, reason)),
                None => out.push_str(&format!("- `{}`\n", r.jurisdiction)),
            }
        }
        out.push('\n');
    }

    if !report.synergy.matches.is_empty() {
        out.push_str("## Synergies\n");
        for m in &report.synergy.matches {
            out.push_str(&format!("- {}: {:.0} ({})\n", m.pair, m.bonus, m.rationale));
        }
        out.push('\n');
    }

    out.push_str("## Savings & Cost\n");
    out.push_str(&format!(
        "- jurisdiction savings: {:.0}\n- synergy bonus: {:.0}\n- total savings: {:.0}\n",
        report.jurisdiction_savings, report.synergy.total_bonus, report.total_savings
    ));
    let cost = &report.cost_estimate;
    out.push_str(&format!(
        "- complexity: {:.3}\n- cost tier: {:?}\n- setup: {}-{} weeks\n- annual compliance cost: {:.0}\n",
        report.complexity_score,
        cost.tier,
        cost.setup_weeks_min,
        cost.setup_weeks_max,
        cost.annual_compliance_cost
    ));

    if !report.market_access.is_empty() {
        out.push_str("\n## Market Access\n");
        for benefit in &report.market_access {
            out.push_str(&format!("- {benefit}\n"));
        }
    }
    out
}
