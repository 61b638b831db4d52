//! Risk classifier: the one set of tier thresholds every consumer shares.

use crate::types::Probability;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CRITICAL_THRESHOLD: Probability = 0.70;
pub const HIGH_THRESHOLD: Probability = 0.40;

/// Probability at or above which a customer is predicted to churn.
pub const CHURN_DECISION_THRESHOLD: Probability = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_probability(p: Probability) -> Self {
        if p >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if p >= HIGH_THRESHOLD {
            Self::High
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low      => "LOW",
            Self::High     => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Whether this tier warrants a retention alert.
    pub fn is_alertable(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Critical => Confidence::High,
            Self::High     => Confidence::Medium,
            Self::Low      => Confidence::High,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far the probability sits from the tier boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Medium,
    High,
}

pub fn predicts_churn(p: Probability) -> bool {
    p >= CHURN_DECISION_THRESHOLD
}
