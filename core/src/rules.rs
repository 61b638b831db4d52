//! The churn rule table and the rule-based fallback scorer.
//!
//! RULE: this is the only place rule weights live. The fallback scorer and
//! the factor explainer both evaluate `RULES`; nothing re-declares a
//! threshold.
//!
//! Scale: the canonical output is a probability in [0, 0.95]. The raw
//! points scale (weight x 100, 0..=205 with every rule firing) is kept on
//! `RuleEvaluation` for alert consumers; `probability = min(points / 180, 0.95)`.

use crate::{customer::CustomerRecord, types::Probability};
use serde::{Deserialize, Serialize};

/// Sum of weights is divided by this before capping.
pub const RULE_NORMALIZER: f64 = 1.8;

/// Rule-based output never claims more certainty than this.
pub const RULE_PROBABILITY_CAP: f64 = 0.95;

/// Points-scale equivalent of `RULE_NORMALIZER`.
pub const RULE_POINTS_NORMALIZER: u32 = 180;

pub const HIGH_RISK_MARKETS: &[&str] = &["Germany"];

const STALE_TRANSACTION_DAYS: u32 = 25;
const LOW_LOGIN_THRESHOLD: u32 = 5;
const LOW_SATISFACTION: u8 = 2;
const SENIOR_AGE: u32 = 50;
const LOW_TRANSACTION_COUNT: u32 = 40;
const HEAVY_SUPPORT_CONTACT: u32 = 5;
const PRODUCT_OVERLOAD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Complaint,
    InactiveMember,
    ProductOverload,
    StaleTransactions,
    LowEngagement,
    LowSatisfaction,
    HighRiskMarket,
    SeniorCustomer,
    LowTransactionVolume,
    HeavySupportContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
    VeryHigh,
    Critical,
}

pub struct RiskRule {
    pub id:          RuleId,
    pub weight:      f64,
    pub severity:    Severity,
    pub description: &'static str,
    pub applies:     fn(&CustomerRecord) -> bool,
}

impl RiskRule {
    /// Contribution on the points scale.
    pub fn points(&self) -> u32 {
        (self.weight * 100.0).round() as u32
    }
}

/// Declaration order is the explainer's tie-break order.
pub static RULES: [RiskRule; 10] = [
    RiskRule {
        id: RuleId::Complaint,
        weight: 0.40,
        severity: Severity::Critical,
        description: "Customer has a registered complaint",
        applies: |c| c.complained,
    },
    RiskRule {
        id: RuleId::InactiveMember,
        weight: 0.25,
        severity: Severity::VeryHigh,
        description: "Inactive member",
        applies: |c| !c.is_active_member,
    },
    RiskRule {
        id: RuleId::ProductOverload,
        weight: 0.30,
        severity: Severity::VeryHigh,
        description: "3+ products (product overload)",
        applies: |c| c.num_products >= PRODUCT_OVERLOAD,
    },
    RiskRule {
        id: RuleId::StaleTransactions,
        weight: 0.20,
        severity: Severity::High,
        description: "More than 25 days without a transaction",
        applies: |c| c.days_since_last_transaction > STALE_TRANSACTION_DAYS,
    },
    RiskRule {
        id: RuleId::LowEngagement,
        weight: 0.15,
        severity: Severity::High,
        description: "Low engagement (< 5 logins/month)",
        applies: |c| c.monthly_logins < LOW_LOGIN_THRESHOLD,
    },
    RiskRule {
        id: RuleId::LowSatisfaction,
        weight: 0.25,
        severity: Severity::VeryHigh,
        description: "Low satisfaction",
        applies: |c| c.satisfaction_score <= LOW_SATISFACTION,
    },
    RiskRule {
        id: RuleId::HighRiskMarket,
        weight: 0.15,
        severity: Severity::Medium,
        description: "Located in a high-risk market",
        applies: |c| HIGH_RISK_MARKETS.contains(&c.geography.as_str()),
    },
    RiskRule {
        id: RuleId::SeniorCustomer,
        weight: 0.15,
        severity: Severity::Medium,
        description: "Age over 50",
        applies: |c| c.age > SENIOR_AGE,
    },
    RiskRule {
        id: RuleId::LowTransactionVolume,
        weight: 0.10,
        severity: Severity::Medium,
        description: "Transactions below average",
        applies: |c| c.monthly_transactions < LOW_TRANSACTION_COUNT,
    },
    RiskRule {
        id: RuleId::HeavySupportContact,
        weight: 0.10,
        severity: Severity::Medium,
        description: "Heavy support contact",
        applies: |c| c.support_interactions > HEAVY_SUPPORT_CONTACT,
    },
];

/// Which rules fired for a record, on both scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub triggered:    Vec<RuleId>,
    pub weight_sum:   f64,
    pub points:       u32,
    pub probability:  Probability,
}

/// Rules that fire for `record`, in declaration order.
pub fn triggered_rules(record: &CustomerRecord) -> impl Iterator<Item = &'static RiskRule> + '_ {
    RULES.iter().filter(move |rule| (rule.applies)(record))
}

pub fn evaluate(record: &CustomerRecord) -> RuleEvaluation {
    let mut triggered = Vec::new();
    let mut weight_sum = 0.0;
    let mut points = 0;

    for rule in triggered_rules(record) {
        triggered.push(rule.id);
        weight_sum += rule.weight;
        points += rule.points();
    }

    RuleEvaluation {
        triggered,
        weight_sum,
        points,
        probability: (weight_sum / RULE_NORMALIZER).min(RULE_PROBABILITY_CAP),
    }
}

/// Deterministic fallback probability; used only when no model answered.
pub fn rule_based_probability(record: &CustomerRecord) -> Probability {
    evaluate(record).probability
}

/// Convert a points-scale score to the canonical probability scale.
pub fn points_to_probability(points: u32) -> Probability {
    (f64::from(points) / f64::from(RULE_POINTS_NORMALIZER)).min(RULE_PROBABILITY_CAP)
}
