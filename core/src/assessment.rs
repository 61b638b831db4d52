use crate::{
    classify::{Confidence, RiskTier},
    ensemble::ModelContribution,
    explain::RiskFactor,
    model::ModelKind,
    types::{CustomerId, Probability},
};
use serde::{Deserialize, Serialize};

/// Which path produced an assessment's probability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ScoringMethod {
    Ensemble { models: Vec<ModelKind> },
    RuleBased { reason: FallbackReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoModelsLoaded,
    AllModelsFailed,
}

impl ScoringMethod {
    pub fn is_rule_based(&self) -> bool {
        matches!(self, Self::RuleBased { .. })
    }

    /// Human-readable provenance, e.g. "ensemble (2 models)" or "rule-based".
    pub fn label(&self) -> String {
        match self {
            Self::Ensemble { models } if models.len() == 1 => format!("ensemble (1 model: {})", models[0]),
            Self::Ensemble { models } => format!("ensemble ({} models)", models.len()),
            Self::RuleBased { .. } => "rule-based".to_string(),
        }
    }
}

/// The result of scoring one customer. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub customer_id:         Option<CustomerId>,
    pub probability:         Probability,
    pub tier:                RiskTier,
    pub predicted_churn:     bool,
    pub confidence:          Confidence,
    pub factors:             Vec<RiskFactor>,
    pub recommended_actions: Vec<String>,
    pub method:              ScoringMethod,
    pub method_label:        String,
    /// Rule points for the record, regardless of scoring path.
    pub rule_points:         u32,
    /// Per-model answers; empty on the rule-based path.
    pub contributions:       Vec<ModelContribution>,
    /// Loaded models that errored or answered out of range on this call.
    pub failed_models:       Vec<ModelKind>,
}
