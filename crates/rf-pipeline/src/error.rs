use thiserror::Error;

/// Errors surfaced by the demodulation pipeline (C4).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Kernel(#[from] rf_kernels::KernelError),

    #[error(transparent)]
    Estimator(#[from] rf_estimators::EstimatorError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
