//! [`AssessmentProvider`] backed by a static [`Rulebook`].

use async_trait::async_trait;
use gcoe_core::{
    clamp_unit, Assessment, AssessmentContext, AssessmentProvider, BusinessProfile,
    ProviderError, ProviderResult,
};
use tracing::debug;

use crate::rulebook::{
    Rulebook, ESTABLISHED_REVENUE, REMOTE_SHARE_LIMIT, TAX_RATE_CEILING,
};

/// Scores a profile against one jurisdiction's rulebook.
///
/// Purely computational: no I/O and no awaiting, so it never comes near the
/// orchestrator's deadline.
#[derive(Debug, Clone)]
pub struct RulebookProvider {
    rulebook: Rulebook,
}

impl RulebookProvider {
    pub fn new(rulebook: Rulebook) -> Self {
        Self { rulebook }
    }

    pub fn rulebook(&self) -> &Rulebook {
        &self.rulebook
    }

    fn structure_score(&self, profile: &BusinessProfile) -> f64 {
        if profile.revenue > ESTABLISHED_REVENUE {
            self.rulebook.structure_score_established
        } else {
            self.rulebook.structure_score_early
        }
    }

    fn tax_score(&self, profile: &BusinessProfile) -> f64 {
        let rate = self.rulebook.effective_rate(profile.holds_intellectual_property);
        clamp_unit(1.0 - rate / TAX_RATE_CEILING)
    }

    fn data_protection_score(&self, profile: &BusinessProfile) -> f64 {
        let mut score = self.rulebook.data_protection_base;
        if profile.processes_personal_data {
            score *= self.rulebook.personal_data_factor;
        }
        if profile.international_data_transfers {
            score *= self.rulebook.transfer_factor;
        }
        clamp_unit(score)
    }

    fn employment_score(&self, profile: &BusinessProfile) -> f64 {
        let mut score = self.rulebook.employment_base;
        if profile.employees > 0
            && f64::from(profile.remote_employees) > f64::from(profile.employees) * REMOTE_SHARE_LIMIT
        {
            score *= self.rulebook.remote_factor;
        }
        clamp_unit(score)
    }

    /// Annual savings from moving the headline rate to the planned rate.
    pub fn savings(&self, profile: &BusinessProfile) -> f64 {
        let rate = self.rulebook.effective_rate(profile.holds_intellectual_property);
        (profile.effective_profit() * (self.rulebook.headline_tax_rate - rate)).max(0.0)
    }

    /// Synchronous scoring, shared by the async trait method.
    pub fn evaluate(&self, profile: &BusinessProfile) -> ProviderResult<Assessment> {
        if profile.company_name.trim().is_empty() {
            return Err(ProviderError::MissingInput {
                field: "company_name".into(),
            });
        }
        if !profile.revenue.is_finite() {
            return Err(ProviderError::Computation(format!(
                "revenue is not finite: {}",
                profile.revenue
            )));
        }

        let w = &self.rulebook.weights;
        let dimensions = [
            ("structure", self.structure_score(profile), w.structure),
            ("tax", self.tax_score(profile), w.tax),
            ("data_protection", self.data_protection_score(profile), w.data_protection),
            ("employment", self.employment_score(profile), w.employment),
            ("regulatory", clamp_unit(self.rulebook.regulatory_score), w.regulatory),
        ];

        let composite: f64 = dimensions.iter().map(|(_, score, weight)| score * weight).sum();
        let mut assessment = Assessment::new(clamp_unit(composite), self.savings(profile));
        for (dimension, score, _) in dimensions {
            assessment = assessment.with_sub_score(dimension, score);
        }
        Ok(assessment)
    }
}

#[async_trait]
impl AssessmentProvider for RulebookProvider {
    fn name(&self) -> &str {
        &self.rulebook.name
    }

    async fn assess(
        &self,
        profile: &BusinessProfile,
        ctx: &AssessmentContext,
    ) -> ProviderResult<Assessment> {
        if ctx.is_cancelled() {
            return Err(ProviderError::Unavailable("cancelled before start".into()));
        }
        let assessment = self.evaluate(profile)?;
        debug!(
            jurisdiction = %ctx.jurisdiction,
            score = assessment.score,
            savings = assessment.savings,
            "rulebook evaluated"
        );
        Ok(assessment)
    }
}
