//! Customer records: the loose boundary shape and the canonical typed record.
//!
//! Callers hand in a `CustomerInput` (every field optional, accepts the
//! column spellings used by the training data exports). `CustomerRecord`
//! is built from it exactly once; every range check happens there, so the
//! scoring path never sees an out-of-domain value.

use crate::{
    error::{ScoringError, ScoringResult},
    types::CustomerId,
};
use serde::{de, Deserialize, Deserializer, Serialize};

// ── Documented defaults for optional fields ──────────────────────────────────

pub const DEFAULT_POINTS_EARNED: u32 = 500;
pub const DEFAULT_AVG_SESSION_DURATION: f64 = 10.0;
pub const DEFAULT_SESSION_ABANDONMENT_RATE: f64 = 0.15;
pub const DEFAULT_LOCAL_COMPETITION_INDEX: f64 = 0.5;

/// A 0/1 flag as it arrives on the wire: a JSON bool, an integer, or a
/// float such as `1.0` from a spreadsheet export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Int(i64),
    Float(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Int(i64),
    Float(f64),
}

/// Integer fields accept `41` and `41.0`; `41.5` is a deserialization error.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<WholeNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(WholeNumber::Int(i)) => Ok(Some(i)),
        Some(WholeNumber::Float(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e18 => {
            Ok(Some(f as i64))
        }
        Some(WholeNumber::Float(f)) => Err(de::Error::custom(format!("{f} is not a whole number"))),
    }
}

/// Inbound record shape. Nothing is validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInput {
    #[serde(default, alias = "Customer_ID", alias = "CustomerId")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "whole_number", alias = "CreditScore")]
    pub credit_score: Option<i64>,
    #[serde(default, alias = "Geography")]
    pub geography: Option<String>,
    #[serde(default, alias = "Gender")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "whole_number", alias = "Age")]
    pub age: Option<i64>,
    #[serde(default, alias = "Balance")]
    pub balance: Option<f64>,
    #[serde(default, deserialize_with = "whole_number", alias = "NumOfProducts")]
    pub num_products: Option<i64>,
    #[serde(default, alias = "HasCrCard")]
    pub has_credit_card: Option<FlagInput>,
    #[serde(default, alias = "IsActiveMember")]
    pub is_active_member: Option<FlagInput>,
    #[serde(default, alias = "EstimatedSalary")]
    pub estimated_salary: Option<f64>,
    #[serde(default, alias = "Complain")]
    pub complained: Option<FlagInput>,
    #[serde(default, deserialize_with = "whole_number", alias = "Satisfaction Score", alias = "Satisfaction_Score", alias = "SatisfactionScore")]
    pub satisfaction_score: Option<i64>,
    #[serde(default, alias = "Card Type", alias = "Card_Type", alias = "CardType")]
    pub card_type: Option<String>,
    #[serde(default, deserialize_with = "whole_number", alias = "Point Earned", alias = "Point_Earned", alias = "PointEarned")]
    pub points_earned: Option<i64>,
    #[serde(default, deserialize_with = "whole_number", alias = "Monthly Transactions", alias = "Monthly_Transactions", alias = "MonthlyTransactions")]
    pub monthly_transactions: Option<i64>,
    #[serde(default, deserialize_with = "whole_number", alias = "Days_Since_Last_Transaction")]
    pub days_since_last_transaction: Option<i64>,
    #[serde(default, deserialize_with = "whole_number", alias = "Monthly_Logins")]
    pub monthly_logins: Option<i64>,
    #[serde(default, alias = "Avg_Session_Duration")]
    pub avg_session_duration: Option<f64>,
    #[serde(default, deserialize_with = "whole_number", alias = "Support_Interactions")]
    pub support_interactions: Option<i64>,
    #[serde(default, alias = "Session_Abandonment_Rate")]
    pub session_abandonment_rate: Option<f64>,
    #[serde(default, alias = "Local_Competition_Index")]
    pub local_competition_index: Option<f64>,
}

/// The canonical, validated customer record consumed by every scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id:                 Option<CustomerId>,
    pub credit_score:                u32,
    pub geography:                   String,
    pub gender:                      String,
    pub age:                         u32,
    pub balance:                     f64,
    pub num_products:                u32,
    pub has_credit_card:             bool,
    pub is_active_member:            bool,
    pub estimated_salary:            f64,
    pub complained:                  bool,
    pub satisfaction_score:          u8,
    pub card_type:                   String,
    pub points_earned:               u32,
    pub monthly_transactions:        u32,
    pub days_since_last_transaction: u32,
    pub monthly_logins:              u32,
    pub avg_session_duration:        f64,
    pub support_interactions:        u32,
    pub session_abandonment_rate:    f64,
    pub local_competition_index:     f64,
}

impl CustomerRecord {
    /// Validate a boundary input and build the canonical record.
    pub fn from_input(input: CustomerInput) -> ScoringResult<Self> {
        let customer_id = input
            .customer_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(Self {
            customer_id,
            credit_score: int_in("credit_score", input.credit_score, 300, 850)? as u32,
            geography: text("geography", input.geography)?,
            gender: text("gender", input.gender)?,
            age: int_in("age", input.age, 18, 100)? as u32,
            balance: non_negative("balance", required("balance", input.balance)?)?,
            num_products: int_in("num_products", input.num_products, 1, 4)? as u32,
            has_credit_card: flag("has_credit_card", input.has_credit_card)?,
            is_active_member: flag("is_active_member", input.is_active_member)?,
            estimated_salary: non_negative(
                "estimated_salary",
                required("estimated_salary", input.estimated_salary)?,
            )?,
            complained: flag("complained", input.complained)?,
            satisfaction_score: int_in("satisfaction_score", input.satisfaction_score, 1, 5)? as u8,
            card_type: text("card_type", input.card_type)?,
            points_earned: match input.points_earned {
                Some(v) => count("points_earned", v)?,
                None => DEFAULT_POINTS_EARNED,
            },
            monthly_transactions: count(
                "monthly_transactions",
                required("monthly_transactions", input.monthly_transactions)?,
            )?,
            days_since_last_transaction: count(
                "days_since_last_transaction",
                required("days_since_last_transaction", input.days_since_last_transaction)?,
            )?,
            monthly_logins: count(
                "monthly_logins",
                required("monthly_logins", input.monthly_logins)?,
            )?,
            avg_session_duration: non_negative(
                "avg_session_duration",
                input.avg_session_duration.unwrap_or(DEFAULT_AVG_SESSION_DURATION),
            )?,
            support_interactions: count(
                "support_interactions",
                required("support_interactions", input.support_interactions)?,
            )?,
            session_abandonment_rate: unit_interval(
                "session_abandonment_rate",
                input.session_abandonment_rate.unwrap_or(DEFAULT_SESSION_ABANDONMENT_RATE),
            )?,
            local_competition_index: non_negative(
                "local_competition_index",
                input.local_competition_index.unwrap_or(DEFAULT_LOCAL_COMPETITION_INDEX),
            )?,
        })
    }

    /// Same record under a new identifier.
    pub fn with_customer_id(mut self, id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(id.into());
        self
    }
}

impl TryFrom<CustomerInput> for CustomerRecord {
    type Error = ScoringError;

    fn try_from(input: CustomerInput) -> ScoringResult<Self> {
        Self::from_input(input)
    }
}

// ── Field checks ─────────────────────────────────────────────────────────────

fn required<T>(field: &'static str, value: Option<T>) -> ScoringResult<T> {
    value.ok_or(ScoringError::MissingField { field })
}

fn int_in(field: &'static str, value: Option<i64>, min: i64, max: i64) -> ScoringResult<i64> {
    let v = required(field, value)?;
    if v < min || v > max {
        return Err(ScoringError::invalid(field, format!("{v} is outside {min}..={max}")));
    }
    Ok(v)
}

fn count(field: &'static str, value: i64) -> ScoringResult<u32> {
    u32::try_from(value)
        .map_err(|_| ScoringError::invalid(field, format!("{value} must be a non-negative count")))
}

fn non_negative(field: &'static str, value: f64) -> ScoringResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScoringError::invalid(field, format!("{value} must be finite and >= 0")));
    }
    Ok(value)
}

fn unit_interval(field: &'static str, value: f64) -> ScoringResult<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ScoringError::invalid(field, format!("{value} is outside 0..=1")));
    }
    Ok(value)
}

fn flag(field: &'static str, value: Option<FlagInput>) -> ScoringResult<bool> {
    match required(field, value)? {
        FlagInput::Bool(b) => Ok(b),
        FlagInput::Int(0) => Ok(false),
        FlagInput::Int(1) => Ok(true),
        FlagInput::Int(other) => Err(ScoringError::invalid(field, format!("{other} is not 0 or 1"))),
        FlagInput::Float(f) if f == 0.0 => Ok(false),
        FlagInput::Float(f) if f == 1.0 => Ok(true),
        FlagInput::Float(other) => Err(ScoringError::invalid(field, format!("{other} is not 0 or 1"))),
    }
}

fn text(field: &'static str, value: Option<String>) -> ScoringResult<String> {
    let v = required(field, value)?;
    let trimmed = v.trim();
    if trimmed.is_empty() {
        return Err(ScoringError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
