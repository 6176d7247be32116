use thiserror::Error;

/// Errors raised by the numeric tower.
///
/// Only genuinely exceptional situations are errors. Indeterminate results
/// of total operations (division by zero, `∞ − ∞`) are values: `Real::Nan`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumError {
    #[error("rational with zero denominator")]
    ZeroDenominator,

    #[error("non-finite value has no rational form")]
    NonFiniteRational,

    #[error("cannot cast {value} to {target}")]
    Cast { value: String, target: &'static str },

    #[error("unsupported numeric operation: {0}")]
    Unsupported(&'static str),
}
