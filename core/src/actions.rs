//! Recommended retention actions, selected by tier.

use crate::classify::RiskTier;

const CRITICAL_ACTIONS: [&str; 5] = [
    "Direct contact from the retention team within 24 hours",
    "Apply a high-value incentive (discount, cashback)",
    "Assign a dedicated account manager",
    "Investigate the root cause of dissatisfaction",
    "Full review of contracted products",
];

const HIGH_ACTIONS: [&str; 5] = [
    "Personalised reactivation campaign",
    "Satisfaction survey",
    "Targeted offers based on behaviour",
    "Re-onboarding of key features",
    "Enable personalised push notifications",
];

const LOW_ACTIONS: [&str; 5] = [
    "Continue regular communication",
    "Consider the loyalty programme",
    "Education on new features",
    "Encourage referrals",
    "Monthly metrics monitoring",
];

// Alert lists are shorter and more operational than assessment actions.
const CRITICAL_ALERT_ACTIONS: [&str; 4] = [
    "URGENT: immediate contact (24h)",
    "Assign a dedicated account manager",
    "Apply a high-value incentive",
    "Investigate the root cause",
];

const PROACTIVE_ALERT_ACTIONS: [&str; 4] = [
    "Proactive contact (48-72h)",
    "Reactivation campaign",
    "Satisfaction survey",
    "Personalised offers",
];

pub fn recommended_actions(tier: RiskTier) -> Vec<String> {
    let actions: &[&str] = match tier {
        RiskTier::Critical => &CRITICAL_ACTIONS,
        RiskTier::High     => &HIGH_ACTIONS,
        RiskTier::Low      => &LOW_ACTIONS,
    };
    actions.iter().map(|a| a.to_string()).collect()
}

pub fn alert_actions(tier: RiskTier) -> Vec<String> {
    let actions: &[&str] = match tier {
        RiskTier::Critical => &CRITICAL_ALERT_ACTIONS,
        _                  => &PROACTIVE_ALERT_ACTIONS,
    };
    actions.iter().map(|a| a.to_string()).collect()
}
