//! Trained artifacts on disk: ONNX classifiers, label encoders, scaler.
//!
//! Classifiers are the ONNX exports of the training pipeline and run through
//! ONNX Runtime. Encoders and scaler are JSON. Loading is one-time and
//! blocking. A missing or unreadable artifact is never fatal: that model is
//! marked unavailable (or the normalizer falls back to built-in codes / raw
//! units) and a warning is logged.

use crate::{
    config::EngineConfig,
    error::{ScoringError, ScoringResult},
    features::{LabelEncoder, Preprocessor, StandardScaler, FEATURE_COUNT},
    model::{ChurnModel, ModelKind, ModelRegistry},
    types::Probability,
};
use ort::{
    memory::Allocator,
    session::{builder::GraphOptimizationLevel, Session, SessionOutputs},
    value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor},
};
use std::{
    collections::HashMap,
    fmt,
    path::Path,
    sync::{Arc, Mutex},
};

// ── ONNX classifiers ─────────────────────────────────────────────────────────

/// One exported classifier. A session needs exclusive access to run.
pub struct OnnxModel {
    kind:        ModelKind,
    session:     Mutex<Session>,
    input_name:  String,
    output_name: String,
}

fn rejected(path: &Path, reason: impl fmt::Display) -> ScoringError {
    ScoringError::Artifact { path: path.display().to_string(), reason: reason.to_string() }
}

impl OnnxModel {
    pub fn load(kind: ModelKind, path: &Path, threads: usize) -> ScoringResult<Self> {
        let session = Session::builder()
            .map_err(|e| rejected(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| rejected(path, e))?
            .with_intra_threads(threads)
            .map_err(|e| rejected(path, e))?
            .commit_from_file(path)
            .map_err(|e| rejected(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| rejected(path, "graph declares no inputs"))?;

        let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let output_name = probability_output(&output_names)
            .map(str::to_string)
            .ok_or_else(|| rejected(path, format!("no probability output among {output_names:?}")))?;

        log::debug!("model {kind}: input {input_name:?}, output {output_name:?}");
        Ok(Self { kind, session: Mutex::new(session), input_name, output_name })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("kind", &self.kind)
            .field("input", &self.input_name)
            .field("output", &self.output_name)
            .finish()
    }
}

impl ChurnModel for OnnxModel {
    fn predict_probability(&self, features: &[f64]) -> ScoringResult<Probability> {
        let name = self.kind.name();
        let values: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_array((vec![1_i64, values.len() as i64], values))
            .map_err(|e| ScoringError::model(name, e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ScoringError::model(name, "session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ScoringError::model(name, e.to_string()))?;

        let probability = extract_probability(&outputs, &self.output_name)
            .map_err(|reason| ScoringError::model(name, reason))?;
        Ok(probability)
    }
}

/// Pick the output carrying class probabilities. scikit-learn and XGBoost
/// exports name it `probabilities` next to a `label` output; Keras exports
/// have a single sigmoid output.
fn probability_output<'a>(names: &[&'a str]) -> Option<&'a str> {
    names
        .iter()
        .find(|n| n.contains("prob"))
        .or_else(|| names.iter().rev().find(|n| !n.contains("label")))
        .copied()
}

fn extract_probability(outputs: &SessionOutputs, output_name: &str) -> Result<Probability, String> {
    let output = outputs
        .get(output_name)
        .ok_or_else(|| format!("output {output_name:?} missing from run"))?;

    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return positive_class(&dims, data);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return positive_class_from_map(output);
    }
    Err(format!("output {output_name:?} is neither a tensor nor a sequence of maps"))
}

/// Churn probability from a probability tensor: `[1, 2]` / `[2]` hold both
/// classes (take class 1), `[1, 1]` / `[1]` hold the sigmoid output.
fn positive_class(dims: &[i64], data: &[f32]) -> Result<Probability, String> {
    let classes = match dims {
        [1, n] | [n] => *n,
        other => return Err(format!("unexpected probability shape {other:?}")),
    };
    let index = match classes {
        1 => 0,
        2 => 1,
        n => return Err(format!("expected 1 or 2 classes, got {n}")),
    };
    data.get(index)
        .map(|p| f64::from(*p))
        .ok_or_else(|| format!("probability tensor holds {} values", data.len()))
}

/// `seq(map(int64, float))`, as written by scikit-learn's ZipMap.
fn positive_class_from_map(output: &DynValue) -> Result<Probability, String> {
    let allocator = Allocator::default();
    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| e.to_string())?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| e.to_string())?;
    let first = maps.first().ok_or("empty probability sequence")?;
    let classes = first.try_extract_key_values::<i64, f32>().map_err(|e| e.to_string())?;

    classes
        .iter()
        .find(|(class, _)| *class == 1)
        .map(|(_, p)| f64::from(*p))
        .ok_or_else(|| "class 1 missing from probability map".to_string())
}

// ── Loading ──────────────────────────────────────────────────────────────────

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> ScoringResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load every model named in `config`. Failures mark the slot unavailable.
pub fn load_registry(config: &EngineConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::empty();

    for kind in ModelKind::ALL {
        let path = config.model_path(kind);
        if !path.exists() {
            log::warn!("model {kind} not found at {}", path.display());
            continue;
        }
        match OnnxModel::load(kind, &path, config.onnx_threads) {
            Ok(model) => {
                log::info!("model {kind} loaded from {}", path.display());
                registry = registry.with_model(kind, Arc::new(model));
            }
            Err(e) => log::warn!("model {kind} skipped: {e}"),
        }
    }

    if registry.is_empty() {
        log::warn!(
            "no models loaded from {}; scoring will use the rule-based fallback",
            config.models_dir.display()
        );
    } else {
        log::info!("loaded {} model(s): {:?}", registry.len(), registry.available_kinds());
    }
    registry
}

/// Load encoders and scaler. Either may be missing.
pub fn load_preprocessor(config: &EngineConfig) -> Preprocessor {
    let encoders_path = config.encoders_path();
    let encoders = if encoders_path.exists() {
        match read_json::<HashMap<String, Vec<String>>>(&encoders_path) {
            Ok(map) => map.into_iter().map(|(col, classes)| (col, LabelEncoder::new(classes))).collect(),
            Err(e) => {
                log::warn!("label encoders skipped: {e}");
                HashMap::new()
            }
        }
    } else {
        log::warn!("label encoders not found at {}", encoders_path.display());
        HashMap::new()
    };

    let scaler_path = config.scaler_path();
    let scaler = if scaler_path.exists() {
        match read_json::<StandardScaler>(&scaler_path).and_then(|s| check_scaler(&scaler_path, s)) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("scaler skipped: {e}");
                None
            }
        }
    } else {
        log::warn!("scaler not found at {}", scaler_path.display());
        None
    };

    Preprocessor::new(encoders, scaler)
}

fn check_scaler(path: &Path, scaler: StandardScaler) -> ScoringResult<StandardScaler> {
    if scaler.width() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
        return Err(rejected(
            path,
            format!("scaler fitted on {} features, normalizer produces {FEATURE_COUNT}", scaler.width()),
        ));
    }
    Ok(scaler)
}
