//! churn-core: customer churn risk scoring.
//!
//! A customer record is normalized, scored by a weighted ensemble of the
//! trained models that are loaded (or by the rule table when none answer),
//! classified into a tier and explained by the rules that fired.

pub mod actions;
pub mod alerts;
pub mod artifacts;
pub mod assessment;
pub mod classify;
pub mod config;
pub mod customer;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod explain;
pub mod features;
pub mod model;
pub mod report;
pub mod rules;
pub mod types;

pub use assessment::{RiskAssessment, ScoringMethod};
pub use classify::RiskTier;
pub use customer::{CustomerInput, CustomerRecord};
pub use engine::ChurnRiskEngine;
pub use error::{ScoringError, ScoringResult};
pub use model::{ChurnModel, ModelKind, ModelRegistry};
