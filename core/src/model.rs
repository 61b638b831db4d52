//! Model handles and the registry that owns them.
//!
//! RULE: the registry is built once at startup and handed to every scoring
//! call. Nothing in the engine keeps a process-wide model cache.

use crate::{error::ScoringResult, types::Probability};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// The contract every trained classifier fulfils.
pub trait ChurnModel: Send + Sync {
    /// Churn probability for one normalized feature vector.
    fn predict_probability(&self, features: &[f64]) -> ScoringResult<Probability>;
}

/// The three model slots, each with a fixed ensemble weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Random forest.
    TreeEnsembleA,
    /// Gradient-boosted trees.
    TreeEnsembleB,
    NeuralNet,
}

impl ModelKind {
    /// Query order for the ensemble. Never reorder.
    pub const ALL: [ModelKind; 3] = [Self::NeuralNet, Self::TreeEnsembleB, Self::TreeEnsembleA];

    pub fn weight(&self) -> f64 {
        match self {
            Self::TreeEnsembleA => 0.25,
            Self::TreeEnsembleB => 0.35,
            Self::NeuralNet     => 0.40,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TreeEnsembleA => "tree_ensemble_a",
            Self::TreeEnsembleB => "tree_ensemble_b",
            Self::NeuralNet     => "neural_net",
        }
    }

    /// The neural net was trained on scaled inputs; the trees on raw units.
    pub fn requires_scaling(&self) -> bool {
        matches!(self, Self::NeuralNet)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only set of loaded models. Cheap to clone; handles are shared.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: Vec<(ModelKind, Arc<dyn ChurnModel>)>,
}

impl ModelRegistry {
    /// No models: every assessment takes the rule-based path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register (or replace) the model for `kind`.
    pub fn with_model(mut self, kind: ModelKind, model: Arc<dyn ChurnModel>) -> Self {
        self.models.retain(|(k, _)| *k != kind);
        self.models.push((kind, model));
        self.models.sort_by_key(|(k, _)| ModelKind::ALL.iter().position(|a| a == k));
        self
    }

    pub fn get(&self, kind: ModelKind) -> Option<&Arc<dyn ChurnModel>> {
        self.models.iter().find(|(k, _)| *k == kind).map(|(_, m)| m)
    }

    pub fn is_available(&self, kind: ModelKind) -> bool {
        self.get(kind).is_some()
    }

    /// Loaded models in ensemble query order.
    pub fn available(&self) -> impl Iterator<Item = (ModelKind, &dyn ChurnModel)> + '_ {
        self.models.iter().map(|(k, m)| (*k, m.as_ref()))
    }

    pub fn available_kinds(&self) -> Vec<ModelKind> {
        self.models.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("available", &self.available_kinds())
            .finish()
    }
}
