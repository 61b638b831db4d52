//! The risk engine: the single entry point every consumer scores through.
//!
//! FLOW (fixed):
//!   1. Normalize the record into the training feature layout
//!   2. Ensemble over available models
//!   3. If no model answered, fall back to the rule table
//!   4. Classify the probability into a tier
//!   5. Explain from the rule table, independent of step 2/3
//!
//! RULES:
//!   - The engine owns no mutable state; `assess` takes `&self`.
//!   - Only malformed input is surfaced to callers. Missing artifacts and
//!     model failures degrade, they never fail a prediction.

use crate::{
    actions,
    assessment::{FallbackReason, RiskAssessment, ScoringMethod},
    classify::{self, RiskTier},
    customer::{CustomerInput, CustomerRecord},
    ensemble::{self, EnsembleOutcome},
    error::ScoringResult,
    explain,
    features::Preprocessor,
    model::ModelRegistry,
    rules,
};

#[derive(Debug, Clone, Default)]
pub struct ChurnRiskEngine {
    registry:     ModelRegistry,
    preprocessor: Preprocessor,
}

impl ChurnRiskEngine {
    pub fn new(registry: ModelRegistry, preprocessor: Preprocessor) -> Self {
        Self { registry, preprocessor }
    }

    /// Engine with no models and no fitted transformers.
    pub fn rules_only() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Validate a boundary input, then assess it.
    pub fn assess_input(&self, input: CustomerInput) -> ScoringResult<RiskAssessment> {
        let record = CustomerRecord::from_input(input)?;
        Ok(self.assess(&record))
    }

    /// Score one validated record. Always terminates in a result.
    pub fn assess(&self, record: &CustomerRecord) -> RiskAssessment {
        let evaluation = rules::evaluate(record);

        let (probability, method, contributions, failed_models) = if self.registry.is_empty() {
            (
                evaluation.probability,
                ScoringMethod::RuleBased { reason: FallbackReason::NoModelsLoaded },
                Vec::new(),
                Vec::new(),
            )
        } else {
            let features = self.preprocessor.normalize(record);
            match ensemble::combine(&features, &self.registry) {
                EnsembleOutcome::Blended { probability, contributions, failed } => {
                    let models = contributions.iter().map(|c| c.model).collect();
                    (probability, ScoringMethod::Ensemble { models }, contributions, failed)
                }
                EnsembleOutcome::NoModelAnswered { failed } => {
                    log::debug!(
                        "engine: falling back to rules for {}",
                        record.customer_id.as_deref().unwrap_or("<anonymous>")
                    );
                    (
                        evaluation.probability,
                        ScoringMethod::RuleBased { reason: FallbackReason::AllModelsFailed },
                        Vec::new(),
                        failed,
                    )
                }
            }
        };

        let tier = RiskTier::from_probability(probability);

        RiskAssessment {
            customer_id: record.customer_id.clone(),
            probability,
            tier,
            predicted_churn: classify::predicts_churn(probability),
            confidence: tier.confidence(),
            factors: explain::explain(record),
            recommended_actions: actions::recommended_actions(tier),
            method_label: method.label(),
            method,
            rule_points: evaluation.points,
            contributions,
            failed_models,
        }
    }
}
