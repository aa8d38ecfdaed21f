use thiserror::Error;

/// Errors surfaced by the kernel library (C2).
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("block too short for this kernel: need at least {min} samples, got {got}")]
    BlockTooShort { min: usize, got: usize },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Backend(#[from] rf_backend::BackendError),
}

pub type Result<T> = std::result::Result<T, KernelError>;
