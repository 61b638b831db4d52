//! Retention alerts for the CRM team.
//!
//! Alerts are built from assessments, never re-scored: HIGH and CRITICAL
//! customers only, most likely to churn first. Delivering them (mail, chat,
//! webhooks) belongs to whoever consumes the alert list.

use crate::{
    actions,
    assessment::RiskAssessment,
    classify::RiskTier,
    customer::CustomerRecord,
    model::ModelKind,
    types::{CustomerId, Probability},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of the customer record an agent needs to act without a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub geography:                   String,
    pub age:                         u32,
    pub num_products:                u32,
    pub monthly_logins:              u32,
    pub days_since_last_transaction: u32,
    pub satisfaction_score:          u8,
    pub complained:                  bool,
    pub is_active_member:            bool,
}

impl From<&CustomerRecord> for CustomerProfile {
    fn from(r: &CustomerRecord) -> Self {
        Self {
            geography:                   r.geography.clone(),
            age:                         r.age,
            num_products:                r.num_products,
            monthly_logins:              r.monthly_logins,
            days_since_last_transaction: r.days_since_last_transaction,
            satisfaction_score:          r.satisfaction_score,
            complained:                  r.complained,
            is_active_member:            r.is_active_member,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAlert {
    pub alert_id:            Uuid,
    pub customer_id:         CustomerId,
    pub tier:                RiskTier,
    pub probability:         Probability,
    pub rule_points:         u32,
    pub scoring_method:      String,
    pub failed_models:       Vec<ModelKind>,
    pub profile:             CustomerProfile,
    pub risk_factors:        Vec<String>,
    pub recommended_actions: Vec<String>,
    pub created_at:          DateTime<Utc>,
}

impl CustomerAlert {
    pub fn from_assessment(
        record: &CustomerRecord,
        assessment: &RiskAssessment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id:            Uuid::new_v4(),
            customer_id:         assessment.customer_id.clone().unwrap_or_else(|| "N/A".to_string()),
            tier:                assessment.tier,
            probability:         assessment.probability,
            rule_points:         assessment.rule_points,
            scoring_method:      assessment.method_label.clone(),
            failed_models:       assessment.failed_models.clone(),
            profile:             CustomerProfile::from(record),
            risk_factors:        assessment.factors.iter().map(|f| f.description.clone()).collect(),
            recommended_actions: actions::alert_actions(assessment.tier),
            created_at,
        }
    }
}

/// Alerts for every alertable assessment, highest probability first,
/// capped at `limit`. Each assessment comes paired with the record it scored.
pub fn build_alerts<'a, I>(scored: I, limit: usize) -> Vec<CustomerAlert>
where
    I: IntoIterator<Item = (&'a CustomerRecord, &'a RiskAssessment)>,
{
    let mut at_risk: Vec<(&CustomerRecord, &RiskAssessment)> =
        scored.into_iter().filter(|(_, a)| a.tier.is_alertable()).collect();
    at_risk.sort_by(|(_, a), (_, b)| b.probability.total_cmp(&a.probability));

    let now = Utc::now();
    let alerts: Vec<CustomerAlert> = at_risk
        .into_iter()
        .take(limit)
        .map(|(record, assessment)| CustomerAlert::from_assessment(record, assessment, now))
        .collect();

    log::info!("alerts: {} built (limit {limit})", alerts.len());
    alerts
}
