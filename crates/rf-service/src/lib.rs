//! Processing service (C5+C6+C7): request/response transport, command
//! dispatch, configuration, and statistics for the RF signal processing
//! engine, wrapping `rf-backend`/`rf-kernels`/`rf-estimators`/`rf-pipeline`
//! behind a length-prefixed TCP/JSON protocol.

#[cfg(feature = "arrow-transport")]
pub mod arrow_transport;
pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod stats;
pub mod transport;

pub use config::{ConfigError, ServiceConfig};
pub use dispatch::{handle_message, DispatchContext};
pub use error::{Result, ServiceError};
pub use stats::ServiceStats;
