//! Estimator set (C3): CFO (power/Kay/Fitz), blind M2M4 SNR, a Costas
//! carrier-tracking loop, and Gardner/Mueller-Müller symbol-timing
//! recovery with cubic Farrow interpolation.

pub mod cfo;
pub mod costas;
pub mod error;
pub mod snr;
pub mod timing;

pub use cfo::{cfo_fitz, cfo_kay, cfo_power, CfoEstimate};
pub use costas::{run_costas_loop, CostasMode, CostasResult};
pub use error::{EstimatorError, Result};
pub use snr::{m2m4_snr, m2m4_snr_segmented, M2m4Result, ModulationKind, SegmentedSnrResult};
pub use timing::{recover_timing, TimingDetector, TimingResult};
