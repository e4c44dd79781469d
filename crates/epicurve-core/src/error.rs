// =============================================================================
// Error Types
// =============================================================================
//
// One error enum for the whole engine. Fatal conditions carry enough context
// to diagnose a failed model run from a log line alone: row counts, knot
// counts, iteration budgets, family names.
//
// Nothing in here is retryable. Too little data stays too little data, and a
// solver that did not converge will not converge on a second call with the
// same input.
//
// =============================================================================

use thiserror::Error;

/// Errors produced by the trend-estimation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpiCurveError {
    /// Matrix/vector dimensions don't line up.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An input was empty where data is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// An input value is outside its valid domain.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Too few observations to support the requested spline knot count.
    #[error("insufficient data: {n_obs} observations cannot support {n_knots} interior knots")]
    InsufficientData { n_obs: usize, n_knots: usize },

    /// The IRLS solver exhausted its iteration budget without converging.
    #[error("{family} fit did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize, family: String },

    /// A factorization or solve failed, usually from a singular X'WX.
    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EpiCurveError>;
