use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Model '{model}' failed: {reason}")]
    ModelInvocation { model: &'static str, reason: String },

    #[error("Artifact '{path}' rejected: {reason}")]
    Artifact { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScoringError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }

    pub(crate) fn model(model: &'static str, reason: impl Into<String>) -> Self {
        Self::ModelInvocation { model, reason: reason.into() }
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
