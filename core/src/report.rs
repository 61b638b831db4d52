//! Batch scoring and the portfolio summary built from it.

use crate::{
    assessment::RiskAssessment,
    classify::RiskTier,
    customer::CustomerRecord,
    engine::ChurnRiskEngine,
    types::Probability,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierSummary {
    pub critical:        usize,
    pub high:            usize,
    pub low:             usize,
    pub rule_based:      usize,
    pub avg_probability: Probability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_customers: usize,
    pub summary:         TierSummary,
    pub assessments:     Vec<RiskAssessment>,
    pub generated_at:    DateTime<Utc>,
}

impl TierSummary {
    pub fn from_assessments(assessments: &[RiskAssessment]) -> Self {
        let mut summary = Self::default();
        let mut total_probability = 0.0;

        for a in assessments {
            match a.tier {
                RiskTier::Critical => summary.critical += 1,
                RiskTier::High     => summary.high += 1,
                RiskTier::Low      => summary.low += 1,
            }
            if a.method.is_rule_based() {
                summary.rule_based += 1;
            }
            total_probability += a.probability;
        }

        if !assessments.is_empty() {
            summary.avg_probability = total_probability / assessments.len() as f64;
        }
        summary
    }
}

impl ChurnRiskEngine {
    /// Score a batch. Records without an id get `BATCH_{n}` (1-based).
    pub fn assess_batch<I>(&self, records: I) -> BatchReport
    where
        I: IntoIterator<Item = CustomerRecord>,
    {
        let assessments: Vec<RiskAssessment> = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                let record = if record.customer_id.is_some() {
                    record
                } else {
                    record.with_customer_id(format!("BATCH_{}", idx + 1))
                };
                self.assess(&record)
            })
            .collect();

        let summary = TierSummary::from_assessments(&assessments);
        log::info!(
            "batch: {} scored (critical={}, high={}, low={}, rule_based={})",
            assessments.len(),
            summary.critical,
            summary.high,
            summary.low,
            summary.rule_based,
        );

        BatchReport {
            total_customers: assessments.len(),
            summary,
            assessments,
            generated_at: Utc::now(),
        }
    }
}
