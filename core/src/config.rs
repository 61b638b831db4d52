use crate::model::ModelKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the trained artifacts live and how the runner reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub models_dir:     PathBuf,
    pub model_files:    ModelFiles,
    pub encoders_file:  String,
    pub scaler_file:    String,
    /// Intra-op threads per ONNX Runtime session.
    pub onnx_threads:   usize,
    /// Maximum alerts emitted per run.
    pub alert_limit:    usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFiles {
    pub tree_ensemble_a: String,
    pub tree_ensemble_b: String,
    pub neural_net:      String,
}

impl Default for ModelFiles {
    fn default() -> Self {
        Self {
            tree_ensemble_a: "random_forest_model.onnx".into(),
            tree_ensemble_b: "xgboost_model.onnx".into(),
            neural_net:      "neural_network_model.onnx".into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir:    PathBuf::from("models"),
            model_files:   ModelFiles::default(),
            encoders_file: "label_encoders.json".into(),
            scaler_file:   "scaler.json".into(),
            onnx_threads:  1,
            alert_limit:   20,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Absent keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Config pointing at `models_dir` with every other value defaulted.
    pub fn default_test(models_dir: impl Into<PathBuf>) -> Self {
        Self { models_dir: models_dir.into(), ..Self::default() }
    }

    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        let file = match kind {
            ModelKind::TreeEnsembleA => &self.model_files.tree_ensemble_a,
            ModelKind::TreeEnsembleB => &self.model_files.tree_ensemble_b,
            ModelKind::NeuralNet     => &self.model_files.neural_net,
        };
        self.models_dir.join(file)
    }

    pub fn encoders_path(&self) -> PathBuf {
        self.models_dir.join(&self.encoders_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.models_dir.join(&self.scaler_file)
    }
}
