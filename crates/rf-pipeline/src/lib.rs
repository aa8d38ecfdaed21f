//! Fixed demodulation pipeline (C4): CFO estimate and correction, RRC
//! matched filtering, blind SNR, Costas carrier tracking, Gardner timing
//! recovery, nearest-point decision, and EVM reporting. The stage order
//! is fixed (SPEC_FULL.md §4.4); callers choose modulation and sample
//! rate, nothing else.

pub mod constellation;
pub mod error;

use num_complex::Complex32;
use rf_backend::Backend;
use rf_estimators::{cfo_fitz, m2m4_snr, recover_timing, run_costas_loop, CostasResult, TimingDetector};
use rf_kernels::matched_filter::{apply_matched_filter, MatchedFilterCache, PulseShape};

pub use constellation::Modulation;
pub use error::{PipelineError, Result};

const DEFAULT_RRC_ROLLOFF: f64 = 0.35;
const DEFAULT_FITZ_MAX_LAG: usize = 32;
const DEFAULT_COSTAS_BANDWIDTH: f64 = 0.01;
const DEFAULT_COSTAS_DAMPING: f64 = 0.707;
const DEFAULT_TIMING_ALPHA: f64 = 0.05;
const DEFAULT_TIMING_BETA: f64 = 0.01;

/// End-to-end result of [`run_pipeline`] (SPEC_FULL.md §4.4: "The pipeline
/// result carries CFO, SNR, Costas end-state, symbol count, mean timing
/// error, EVM, and the full symbol, decision, and index sequences").
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub cfo_hz: f64,
    pub snr_db: f64,
    pub costas: CostasResult,
    pub symbol_count: usize,
    pub mean_timing_error: f64,
    pub evm_rms: f64,
    pub evm_percent: f64,
    pub symbols: Vec<Complex32>,
    pub decisions: Vec<Complex32>,
    pub indices: Vec<usize>,
}

fn derotate(samples: &[Complex32], normalized_freq: f64) -> Vec<Complex32> {
    samples
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            let phase = -2.0 * std::f64::consts::PI * normalized_freq * n as f64;
            x * Complex32::new(phase.cos() as f32, phase.sin() as f32)
        })
        .collect()
}

/// Run the fixed eight-step demodulation sequence against a block of
/// complex baseband samples.
pub fn run_pipeline(
    backend: &dyn Backend,
    filter_cache: &MatchedFilterCache,
    samples: &[Complex32],
    fs: f64,
    sps: f64,
    modulation: &str,
) -> Result<PipelineResult> {
    if samples.is_empty() {
        return Err(PipelineError::InvalidParameter {
            name: "samples",
            reason: "must be nonempty".into(),
        });
    }

    // (1) Fitz CFO estimate on raw I/Q.
    let cfo = cfo_fitz(samples, fs, DEFAULT_FITZ_MAX_LAG)?;

    // (2) complex de-rotation by that CFO.
    let derotated = derotate(samples, cfo.normalized);

    // (3) RRC matched filtering.
    let num_taps = ((8.0 * sps).round() as usize) | 1;
    let taps = filter_cache.get(
        PulseShape::Rrc {
            rolloff: DEFAULT_RRC_ROLLOFF,
            sps,
        },
        num_taps,
    )?;
    let filtered = apply_matched_filter(backend, &derotated, &taps);

    // (4) M2M4 SNR on the filtered stream.
    let modulation_order = Modulation::parse(modulation);
    let snr = m2m4_snr(&filtered, modulation_order.kappa_kind())?;

    // (5) Costas tracking.
    let costas_mode = if Modulation::is_bpsk_name(modulation) {
        rf_estimators::CostasMode::Bpsk
    } else {
        rf_estimators::CostasMode::Qpsk
    };
    let costas = run_costas_loop(
        &filtered,
        fs,
        costas_mode,
        DEFAULT_COSTAS_BANDWIDTH,
        DEFAULT_COSTAS_DAMPING,
    )?;

    // (6) Gardner timing recovery, (7) nearest-point decision.
    let constellation = modulation_order.points();
    let timing = recover_timing(
        &costas.corrected,
        sps,
        TimingDetector::Gardner,
        DEFAULT_TIMING_ALPHA,
        DEFAULT_TIMING_BETA,
        &constellation,
    )?;

    // (8) EVM, RMS and as a percentage of the constellation's RMS power.
    let n = timing.symbols.len() as f64;
    let evm_mean_sq = if timing.symbols.is_empty() {
        0.0
    } else {
        timing
            .symbols
            .iter()
            .zip(timing.decisions.iter())
            .map(|(y, d)| (y - d).norm_sqr() as f64)
            .sum::<f64>()
            / n
    };
    let evm_rms = evm_mean_sq.sqrt();
    let constellation_rms = {
        let mean_sq: f64 = constellation.iter().map(|p| p.norm_sqr() as f64).sum::<f64>()
            / constellation.len() as f64;
        mean_sq.sqrt()
    };
    let evm_percent = if constellation_rms > 0.0 {
        100.0 * evm_rms / constellation_rms
    } else {
        0.0
    };

    Ok(PipelineResult {
        cfo_hz: cfo.hz,
        snr_db: snr.snr_db,
        symbol_count: timing.symbols.len(),
        mean_timing_error: timing.mean_timing_error,
        evm_rms,
        evm_percent,
        symbols: timing.symbols,
        decisions: timing.decisions,
        indices: timing.indices,
        costas,
    })
}
