use thiserror::Error;

/// Failures raised while estimating or forecasting a model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("insufficient observations: need at least {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid input data: {0}")]
    InvalidData(String),

    #[error("estimation failed: design matrix is singular (series may be constant for this order)")]
    SingularSystem,

    #[error("estimation produced non-finite {what}")]
    NonFiniteEstimate { what: &'static str },

    #[error("model returned {actual} forecast steps, expected {expected}")]
    StepMismatch { expected: usize, actual: usize },

    #[error("model must be fitted before forecasting")]
    NotFitted,
}
