use churn_core::{
    customer::{CustomerInput, FlagInput},
    explain::{self, MAX_FACTORS},
    rules::{self, RuleId, Severity},
    CustomerRecord,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn base() -> CustomerRecord {
    CustomerRecord::from_input(CustomerInput {
        credit_score: Some(650),
        geography: Some("Spain".into()),
        gender: Some("Male".into()),
        age: Some(42),
        balance: Some(0.0),
        num_products: Some(2),
        has_credit_card: Some(FlagInput::Bool(true)),
        is_active_member: Some(FlagInput::Bool(true)),
        estimated_salary: Some(55_000.0),
        complained: Some(FlagInput::Bool(false)),
        satisfaction_score: Some(3),
        card_type: Some("SILVER".into()),
        monthly_transactions: Some(45),
        days_since_last_transaction: Some(10),
        monthly_logins: Some(8),
        support_interactions: Some(2),
        ..Default::default()
    })
    .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Factors are sorted by contribution, largest first, and capped at five.
#[test]
fn factors_are_descending_and_capped() {
    let mut r = base();
    r.complained = true;
    r.is_active_member = false;
    r.num_products = 4;
    r.days_since_last_transaction = 40;
    r.monthly_logins = 1;
    r.satisfaction_score = 2;
    r.geography = "Germany".into();

    let all = explain::all_factors(&r);
    assert_eq!(all.len(), 7);

    let top = explain::explain(&r);
    assert_eq!(top.len(), MAX_FACTORS);
    for pair in top.windows(2) {
        assert!(
            pair[0].contribution >= pair[1].contribution,
            "{:?} ({}) before {:?} ({})",
            pair[0].rule, pair[0].contribution, pair[1].rule, pair[1].contribution
        );
    }
    assert_eq!(top[0].rule, RuleId::Complaint);
    assert_eq!(top[0].severity, Severity::Critical);
    assert_eq!(top[0].contribution, 40);
}

/// Equal contributions keep the rule table's declaration order.
#[test]
fn ties_keep_declaration_order() {
    let mut r = base();
    r.is_active_member = false; // 25
    r.satisfaction_score = 1;   // 25
    r.age = 70;                 // 15
    r.geography = "Germany".into(); // 15
    r.monthly_logins = 3;       // 15

    let ids: Vec<RuleId> = explain::explain(&r).iter().map(|f| f.rule).collect();
    assert_eq!(
        ids,
        vec![
            RuleId::InactiveMember,
            RuleId::LowSatisfaction,
            RuleId::LowEngagement,
            RuleId::HighRiskMarket,
            RuleId::SeniorCustomer,
        ]
    );
}

/// Fewer than five triggered rules: all of them, nothing invented.
#[test]
fn short_list_is_not_padded() {
    let mut r = base();
    r.support_interactions = 8;

    let factors = explain::explain(&r);
    assert_eq!(factors.len(), 1);
    assert_eq!(factors[0].rule, RuleId::HeavySupportContact);
    assert_eq!(factors[0].contribution, 10);
}

/// Thresholds are strict where the rule says "more than" / "fewer than".
#[test]
fn rule_thresholds_are_exclusive() {
    let mut r = base();
    r.days_since_last_transaction = 25;
    r.monthly_logins = 5;
    r.age = 50;
    r.monthly_transactions = 40;
    r.support_interactions = 5;
    assert!(rules::evaluate(&r).triggered.is_empty(), "{:?}", rules::evaluate(&r).triggered);

    r.days_since_last_transaction = 26;
    r.monthly_logins = 4;
    r.age = 51;
    r.monthly_transactions = 39;
    r.support_interactions = 6;
    assert_eq!(
        rules::evaluate(&r).triggered,
        vec![
            RuleId::StaleTransactions,
            RuleId::LowEngagement,
            RuleId::SeniorCustomer,
            RuleId::LowTransactionVolume,
            RuleId::HeavySupportContact,
        ]
    );
}

/// Three products already counts as overload; satisfaction 2 is already low.
#[test]
fn inclusive_thresholds() {
    let mut r = base();
    r.num_products = 3;
    r.satisfaction_score = 2;
    assert_eq!(
        rules::evaluate(&r).triggered,
        vec![RuleId::ProductOverload, RuleId::LowSatisfaction]
    );
}

#[test]
fn points_scale_matches_probability_scale() {
    let mut r = base();
    r.complained = true;
    r.is_active_member = false;

    let eval = rules::evaluate(&r);
    assert_eq!(eval.points, 65);
    assert!((eval.probability - rules::points_to_probability(eval.points)).abs() < 1e-12);
}
