use thiserror::Error;

/// Errors surfaced while dispatching a single request. All variants are
/// collapsed to a `{"error": "..."}` JSON body at the dispatch boundary
/// (SPEC_FULL.md §4.5); this enum exists so each layer keeps its own
/// typed error until that boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing IQ data")]
    MissingIq,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Backend(#[from] rf_backend::BackendError),

    #[error(transparent)]
    Kernel(#[from] rf_kernels::KernelError),

    #[error(transparent)]
    Estimator(#[from] rf_estimators::EstimatorError),

    #[error(transparent)]
    Pipeline(#[from] rf_pipeline::PipelineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
