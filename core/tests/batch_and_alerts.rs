use churn_core::{
    alerts,
    customer::{CustomerInput, FlagInput},
    features::Preprocessor,
    ChurnRiskEngine, CustomerRecord, ModelKind, ModelRegistry, RiskTier,
};
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn record(id: Option<&str>) -> CustomerRecord {
    CustomerRecord::from_input(CustomerInput {
        customer_id: id.map(str::to_string),
        credit_score: Some(680),
        geography: Some("France".into()),
        gender: Some("Female".into()),
        age: Some(38),
        balance: Some(12_000.0),
        num_products: Some(1),
        has_credit_card: Some(FlagInput::Int(1)),
        is_active_member: Some(FlagInput::Int(1)),
        estimated_salary: Some(60_000.0),
        complained: Some(FlagInput::Int(0)),
        satisfaction_score: Some(4),
        card_type: Some("PLATINUM".into()),
        monthly_transactions: Some(50),
        days_since_last_transaction: Some(3),
        monthly_logins: Some(15),
        support_interactions: Some(0),
        ..Default::default()
    })
    .unwrap()
}

/// Rule-based 0.40 / 1.8 ≈ 0.22 (LOW).
fn complained(id: Option<&str>) -> CustomerRecord {
    let mut r = record(id);
    r.complained = true;
    r
}

/// Rule-based 0.90 / 1.8 = 0.50 (HIGH).
fn high(id: Option<&str>) -> CustomerRecord {
    let mut r = complained(id);
    r.is_active_member = false;
    r.satisfaction_score = 2;
    r
}

/// Rule-based 1.35 / 1.8 = 0.75 (CRITICAL).
fn critical(id: Option<&str>) -> CustomerRecord {
    let mut r = high(id);
    r.num_products = 3;
    r.monthly_logins = 1;
    r
}

fn alerts_for(records: &[CustomerRecord], limit: usize) -> Vec<alerts::CustomerAlert> {
    let report = ChurnRiskEngine::rules_only().assess_batch(records.iter().cloned());
    alerts::build_alerts(records.iter().zip(&report.assessments), limit)
}

// ── Batch ────────────────────────────────────────────────────────────────────

/// Tier counts, rule-based count and the average all line up with the rows.
#[test]
fn batch_summary_counts_tiers() {
    let engine = ChurnRiskEngine::rules_only();
    let report = engine.assess_batch(vec![
        record(Some("A")),
        complained(Some("B")),
        high(Some("C")),
        critical(Some("D")),
    ]);

    assert_eq!(report.total_customers, 4);
    assert_eq!(report.summary.low, 2);
    assert_eq!(report.summary.high, 1);
    assert_eq!(report.summary.critical, 1);
    assert_eq!(report.summary.rule_based, 4);

    let mean: f64 =
        report.assessments.iter().map(|a| a.probability).sum::<f64>() / 4.0;
    assert!((report.summary.avg_probability - mean).abs() < 1e-12);
}

/// Rows without an id are labelled by their 1-based batch position.
#[test]
fn batch_assigns_positional_ids() {
    let engine = ChurnRiskEngine::rules_only();
    let report = engine.assess_batch(vec![record(None), record(Some("KEEP")), record(None)]);

    let ids: Vec<_> = report
        .assessments
        .iter()
        .map(|a| a.customer_id.clone().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec!["BATCH_1", "KEEP", "BATCH_3"]);
}

#[test]
fn empty_batch_has_zero_average() {
    let report = ChurnRiskEngine::rules_only().assess_batch(Vec::new());

    assert_eq!(report.total_customers, 0);
    assert_eq!(report.summary.avg_probability, 0.0);
}

/// With a model loaded, nothing in the batch is rule-based.
#[test]
fn batch_with_model_reports_no_rule_based_rows() {
    struct Half;
    impl churn_core::ChurnModel for Half {
        fn predict_probability(&self, _: &[f64]) -> churn_core::ScoringResult<f64> {
            Ok(0.5)
        }
    }

    let registry = ModelRegistry::empty().with_model(ModelKind::TreeEnsembleB, Arc::new(Half));
    let engine = ChurnRiskEngine::new(registry, Preprocessor::default());
    let report = engine.assess_batch(vec![record(None), critical(None)]);

    assert_eq!(report.summary.rule_based, 0);
    assert_eq!(report.summary.high, 2);
}

// ── Alerts ───────────────────────────────────────────────────────────────────

/// LOW customers never alert; the rest come out most likely first.
#[test]
fn alerts_cover_high_and_critical_only() {
    let list = alerts_for(
        &[
            record(Some("low")),
            high(Some("high")),
            critical(Some("critical")),
            complained(Some("low-2")),
        ],
        20,
    );

    let ids: Vec<&str> = list.iter().map(|a| a.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["critical", "high"]);
    assert_eq!(list[0].tier, RiskTier::Critical);
    assert_eq!(list[0].scoring_method, "rule-based");
    assert_eq!(list[0].recommended_actions.len(), 4);
    assert!(!list[0].risk_factors.is_empty());
    assert_ne!(list[0].alert_id, list[1].alert_id);
}

#[test]
fn alerts_respect_limit() {
    let records: Vec<_> = (0..6).map(|i| critical(Some(&format!("C{i}")))).collect();

    assert_eq!(alerts_for(&records, 3).len(), 3);
    assert!(alerts_for(&records, 0).is_empty());
}

#[test]
fn anonymous_alert_uses_placeholder_id() {
    let record = critical(None);
    let assessment = ChurnRiskEngine::rules_only().assess(&record);

    let list = alerts::build_alerts([(&record, &assessment)], 5);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].customer_id, "N/A");
}

/// The alert carries the profile fields an agent acts on, taken from the
/// record that was scored, after sorting.
#[test]
fn alert_carries_customer_profile() {
    let mut older = high(Some("older"));
    older.age = 61;
    older.geography = "Spain".into();
    older.days_since_last_transaction = 9;
    let list = alerts_for(&[older, critical(Some("critical"))], 5);

    assert_eq!(list[0].customer_id, "critical");
    assert_eq!(list[0].profile.num_products, 3);
    assert_eq!(list[0].profile.monthly_logins, 1);

    let p = &list[1].profile;
    assert_eq!(list[1].customer_id, "older");
    assert_eq!(p.geography, "Spain");
    assert_eq!(p.age, 61);
    assert_eq!(p.num_products, 1);
    assert_eq!(p.days_since_last_transaction, 9);
    assert_eq!(p.satisfaction_score, 2);
    assert!(p.complained);
    assert!(!p.is_active_member);
    assert!(list[1].failed_models.is_empty());

    let json = serde_json::to_value(&list[1]).unwrap();
    assert_eq!(json["profile"]["geography"], "Spain");
}

/// The report serializes with tiers in their upper-case wire form.
#[test]
fn report_serializes_tiers_upper_case() {
    let report = ChurnRiskEngine::rules_only().assess_batch(vec![critical(Some("X"))]);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["assessments"][0]["tier"], "CRITICAL");
    assert_eq!(json["assessments"][0]["method"]["method"], "rule_based");
    assert_eq!(json["summary"]["critical"], 1);
}
