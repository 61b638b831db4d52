//! Feature normalizer: turns a `CustomerRecord` into the ordered numeric
//! vector the trained models were fitted on.
//!
//! Categorical columns go through fitted label encoders. A value the encoder
//! never saw is not an error: it is left "unencoded", meaning it keeps the
//! built-in ordinal code for the training domain (or -1 outside it), and the
//! column is reported in `NormalizedFeatures::unencoded`.

use crate::{
    customer::CustomerRecord,
    error::{ScoringError, ScoringResult},
    types::FeatureVector,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column order used at training time. Never reorder.
pub const FEATURE_ORDER: [&str; 20] = [
    "credit_score",
    "geography",
    "gender",
    "age",
    "balance",
    "num_products",
    "has_credit_card",
    "is_active_member",
    "estimated_salary",
    "complained",
    "satisfaction_score",
    "card_type",
    "points_earned",
    "monthly_transactions",
    "days_since_last_transaction",
    "monthly_logins",
    "avg_session_duration",
    "support_interactions",
    "session_abandonment_rate",
    "local_competition_index",
];

pub const FEATURE_COUNT: usize = FEATURE_ORDER.len();

/// Sentinel for a categorical value outside every known vocabulary.
pub const UNKNOWN_CATEGORY: f64 = -1.0;

/// The categorical columns and their training vocabularies, sorted the way
/// a fitted label encoder sorts its classes.
const CATEGORICAL_DOMAINS: [(&str, &[&str]); 3] = [
    ("geography", &["France", "Germany", "Spain"]),
    ("gender", &["Female", "Male"]),
    ("card_type", &["DIAMOND", "GOLD", "PLATINUM", "SILVER"]),
];

// ── Fitted transformers ──────────────────────────────────────────────────────

/// A fitted label encoder: code = index of the value in `classes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { classes: classes.into_iter().map(Into::into).collect() }
    }

    pub fn encode(&self, value: &str) -> Option<f64> {
        self.classes.iter().position(|c| c == value).map(|i| i as f64)
    }
}

/// A fitted standard scaler: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean:  Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Scale a vector. Widths must match; a zero scale divides by 1.
    pub fn scale(&self, values: &[f64]) -> ScoringResult<FeatureVector> {
        if values.len() != self.mean.len() || self.scale.len() != self.mean.len() {
            return Err(ScoringError::Other(anyhow::anyhow!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                values.len()
            )));
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect())
    }
}

// ── Normalizer ───────────────────────────────────────────────────────────────

/// Output of the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatures {
    /// Raw units, categorical columns encoded.
    pub raw: FeatureVector,
    /// Scaled vector, present only when a scaler is loaded.
    pub scaled: Option<FeatureVector>,
    /// Categorical columns whose value the fitted encoder did not know.
    pub unencoded: Vec<&'static str>,
}

impl NormalizedFeatures {
    /// The vector a model should see. Without a scaler, scaled consumers
    /// get the raw vector.
    pub fn for_model(&self, requires_scaling: bool) -> &[f64] {
        match (&self.scaled, requires_scaling) {
            (Some(scaled), true) => scaled,
            _ => &self.raw,
        }
    }
}

/// Immutable encoder/scaler state, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    encoders: HashMap<String, LabelEncoder>,
    scaler:   Option<StandardScaler>,
}

impl Preprocessor {
    pub fn new(encoders: HashMap<String, LabelEncoder>, scaler: Option<StandardScaler>) -> Self {
        Self { encoders, scaler }
    }

    pub fn has_encoders(&self) -> bool {
        !self.encoders.is_empty()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn normalize(&self, record: &CustomerRecord) -> NormalizedFeatures {
        let mut unencoded = Vec::new();
        let mut encode = |column: &'static str, value: &str| -> f64 {
            if let Some(encoder) = self.encoders.get(column) {
                if let Some(code) = encoder.encode(value) {
                    return code;
                }
                log::debug!("normalizer: unseen {column}={value:?}, passing through unencoded");
                unencoded.push(column);
            }
            builtin_code(column, value)
        };

        let raw = vec![
            f64::from(record.credit_score),
            encode("geography", &record.geography),
            encode("gender", &record.gender),
            f64::from(record.age),
            record.balance,
            f64::from(record.num_products),
            flag(record.has_credit_card),
            flag(record.is_active_member),
            record.estimated_salary,
            flag(record.complained),
            f64::from(record.satisfaction_score),
            encode("card_type", &record.card_type),
            f64::from(record.points_earned),
            f64::from(record.monthly_transactions),
            f64::from(record.days_since_last_transaction),
            f64::from(record.monthly_logins),
            record.avg_session_duration,
            f64::from(record.support_interactions),
            record.session_abandonment_rate,
            record.local_competition_index,
        ];

        // Scaler width is checked at load time; a failure here means a
        // hand-built Preprocessor, so degrade to raw-only.
        let scaled = self.scaler.as_ref().and_then(|s| match s.scale(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("normalizer: scaling skipped: {e}");
                None
            }
        });

        NormalizedFeatures { raw, scaled, unencoded }
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn builtin_code(column: &str, value: &str) -> f64 {
    CATEGORICAL_DOMAINS
        .iter()
        .find(|(name, _)| *name == column)
        .and_then(|(_, classes)| classes.iter().position(|c| *c == value))
        .map(|i| i as f64)
        .unwrap_or(UNKNOWN_CATEGORY)
}
