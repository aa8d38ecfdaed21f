//! DSP kernels (C2): PSD, cyclostationary SCF, time-frequency
//! distributions, higher-order cumulants, RF-DNA fingerprinting, and
//! matched filtering. Every kernel is written against the [`rf_backend::Backend`]
//! trait, never against a concrete backend.

pub mod cumulants;
pub mod error;
pub mod fam;
pub mod matched_filter;
pub mod psd;
pub mod rf_dna;
pub mod tfd;

pub use cumulants::{higher_order_cumulants, CumulantResult};
pub use error::{KernelError, Result};
pub use fam::{fam_scf, FamResult};
pub use matched_filter::{apply_matched_filter, MatchedFilterCache, PulseShape};
pub use psd::psd_welch;
pub use rf_dna::rf_dna_features;
pub use tfd::{choi_williams, wigner_ville, TfdResult};
