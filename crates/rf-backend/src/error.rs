use thiserror::Error;

/// Errors surfaced by the numeric backend (C1).
///
/// `UsageError`/`DataError`/`BackendUnavailable` from the engine-wide
/// taxonomy live here; `Degenerate` and `TransportError` are produced
/// higher up the stack where they apply.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("block too short: need at least {min} samples, got {got}")]
    BlockTooShort { min: usize, got: usize },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("GPU backend requested but unavailable")]
    BackendUnavailable,

    #[error("unknown window '{0}'")]
    UnknownWindow(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;
