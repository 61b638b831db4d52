//! Shared primitive types used across the engine.

/// A churn probability in [0.0, 1.0].
pub type Probability = f64;

/// A stable customer identifier as supplied by the caller.
pub type CustomerId = String;

/// An ordered numeric feature vector, laid out per `features::FEATURE_ORDER`.
pub type FeatureVector = Vec<f64>;
