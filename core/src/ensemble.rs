//! Ensemble combiner: weighted average over whichever models answered.
//!
//! Weights of missing or failing models drop out of both numerator and
//! denominator, so a lone model's output comes back bit for bit. A model
//! that errors (or returns something that is not a probability) is excluded
//! for this call only; it is logged, never retried.

use crate::{
    features::NormalizedFeatures,
    model::{ModelKind, ModelRegistry},
    types::Probability,
};
use serde::{Deserialize, Serialize};

/// One model's answer and the weight it carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelContribution {
    pub model:       ModelKind,
    pub probability: Probability,
    pub weight:      f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleOutcome {
    /// At least one model answered.
    Blended {
        probability:   Probability,
        contributions: Vec<ModelContribution>,
        failed:        Vec<ModelKind>,
    },
    /// No model was loaded, or every loaded model failed.
    NoModelAnswered { failed: Vec<ModelKind> },
}

/// Query every available model and blend the answers.
pub fn combine(features: &NormalizedFeatures, registry: &ModelRegistry) -> EnsembleOutcome {
    let mut contributions = Vec::with_capacity(registry.len());
    let mut failed = Vec::new();

    for (kind, model) in registry.available() {
        let input = features.for_model(kind.requires_scaling());
        match model.predict_probability(input) {
            Ok(p) if p.is_finite() && (0.0..=1.0).contains(&p) => {
                contributions.push(ModelContribution { model: kind, probability: p, weight: kind.weight() });
            }
            Ok(p) => {
                log::warn!("ensemble: {kind} returned {p}, not a probability; excluded");
                failed.push(kind);
            }
            Err(e) => {
                log::warn!("ensemble: {kind} excluded: {e}");
                failed.push(kind);
            }
        }
    }

    match blend(&contributions) {
        Some(probability) => EnsembleOutcome::Blended { probability, contributions, failed },
        None => {
            if !failed.is_empty() {
                log::warn!("ensemble: all {} model(s) failed", failed.len());
            }
            EnsembleOutcome::NoModelAnswered { failed }
        }
    }
}

/// Weighted mean over the contributions; `None` when nothing contributed.
/// A lone contribution is returned untouched; otherwise weights are
/// normalized before they multiply.
pub fn blend(contributions: &[ModelContribution]) -> Option<Probability> {
    match contributions {
        [] => None,
        [only] => Some(only.probability),
        _ => {
            let total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
            if total_weight <= 0.0 {
                return None;
            }
            let blended: f64 = contributions
                .iter()
                .map(|c| c.probability * (c.weight / total_weight))
                .sum();
            Some(blended.clamp(0.0, 1.0))
        }
    }
}
