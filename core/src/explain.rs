//! Risk factor explainer.
//!
//! Factors come from re-evaluating the rule table on the record, whichever
//! path produced the probability. They are a readable rationale, not an
//! attribution of the model's internals.

use crate::{
    customer::CustomerRecord,
    rules::{self, RuleId, Severity},
};
use serde::{Deserialize, Serialize};

/// Number of factors retained on an assessment.
pub const MAX_FACTORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub rule:         RuleId,
    pub description:  String,
    pub severity:     Severity,
    pub contribution: u32,
}

/// Every triggered factor, descending by contribution; ties keep rule order.
pub fn all_factors(record: &CustomerRecord) -> Vec<RiskFactor> {
    let mut factors: Vec<RiskFactor> = rules::triggered_rules(record)
        .map(|rule| RiskFactor {
            rule:         rule.id,
            description:  rule.description.to_string(),
            severity:     rule.severity,
            contribution: rule.points(),
        })
        .collect();
    // sort_by is stable.
    factors.sort_by(|a, b| b.contribution.cmp(&a.contribution));
    factors
}

/// The top `MAX_FACTORS` factors.
pub fn explain(record: &CustomerRecord) -> Vec<RiskFactor> {
    let mut factors = all_factors(record);
    factors.truncate(MAX_FACTORS);
    factors
}
