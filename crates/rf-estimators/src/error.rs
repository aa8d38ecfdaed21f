use thiserror::Error;

/// Errors surfaced by the estimator library (C3).
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("block too short for this estimator: need at least {min} samples, got {got}")]
    BlockTooShort { min: usize, got: usize },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
