use num_complex::Complex32;

use crate::error::{EstimatorError, Result};

/// Symbol-timing error detector (SPEC_FULL.md §4.3.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingDetector {
    Gardner,
    MuellerMuller,
}

/// Output of [`recover_timing`].
#[derive(Debug, Clone)]
pub struct TimingResult {
    pub symbols: Vec<Complex32>,
    pub decisions: Vec<Complex32>,
    pub indices: Vec<usize>,
    pub timing_errors: Vec<f64>,
    pub mean_timing_error: f64,
}

/// Cubic Farrow interpolation around the two samples bracketing `pos`
/// (SPEC_FULL.md §4.3.4). Returns `None` when the four-tap support window
/// falls outside `samples`.
fn farrow_interpolate(samples: &[Complex32], pos: f64) -> Option<Complex32> {
    let base = pos.floor();
    let mu = (pos - base) as f32;
    let base_idx = base as isize;
    if base_idx < 1 || base_idx + 2 >= samples.len() as isize {
        return None;
    }
    let x0 = samples[(base_idx - 1) as usize];
    let x1 = samples[base_idx as usize];
    let x2 = samples[(base_idx + 1) as usize];
    let x3 = samples[(base_idx + 2) as usize];

    let a0 = x1;
    let a1 = (x2 - x0) * 0.5;
    let a2 = x0 - x1 * 2.5 + x2 * 2.0 - x3 * 0.5;
    let a3 = (x3 - x0) * (1.0 / 6.0) + (x1 - x2) * 0.5;

    Some(a0 + a1 * mu + a2 * mu * mu + a3 * mu * mu * mu)
}

fn nearest_constellation_point(y: Complex32, constellation: &[Complex32]) -> Complex32 {
    constellation
        .iter()
        .copied()
        .min_by(|a, b| (y - a).norm_sqr().total_cmp(&(y - b).norm_sqr()))
        .unwrap_or(y)
}

/// Gardner or Mueller-Müller timing recovery with cubic Farrow
/// interpolation (SPEC_FULL.md §4.3.4).
pub fn recover_timing(
    samples: &[Complex32],
    sps: f64,
    detector: TimingDetector,
    alpha: f64,
    beta: f64,
    constellation: &[Complex32],
) -> Result<TimingResult> {
    if sps < 2.0 {
        return Err(EstimatorError::InvalidParameter {
            name: "sps",
            reason: "must be at least 2".into(),
        });
    }
    if constellation.is_empty() {
        return Err(EstimatorError::InvalidParameter {
            name: "constellation",
            reason: "must be nonempty".into(),
        });
    }
    let min_len = (3.0 * sps).ceil() as usize + 2;
    if samples.len() < min_len {
        return Err(EstimatorError::BlockTooShort {
            min: min_len,
            got: samples.len(),
        });
    }

    let mut cursor = sps / 2.0;
    let mut tau = 0.0_f64;

    let mut symbols = Vec::new();
    let mut decisions = Vec::new();
    let mut indices = Vec::new();
    let mut timing_errors = Vec::new();

    let mut prev_y: Option<Complex32> = None;
    let mut prev_d: Option<Complex32> = None;

    while let Some(y) = farrow_interpolate(samples, cursor) {
        let decision = nearest_constellation_point(y, constellation);

        let e = match detector {
            TimingDetector::Gardner => {
                let half_pos = cursor - sps / 2.0;
                match (farrow_interpolate(samples, half_pos), prev_y) {
                    (Some(y_half), Some(prev)) => ((y - prev) * y_half.conj()).re as f64,
                    _ => 0.0,
                }
            }
            TimingDetector::MuellerMuller => match (prev_y, prev_d) {
                (Some(py), Some(pd)) => (pd * y.conj() - decision * py.conj()).re as f64,
                _ => 0.0,
            },
        };

        symbols.push(y);
        decisions.push(decision);
        indices.push(cursor as usize);
        timing_errors.push(e);

        tau += beta * e;
        let step = (sps + alpha * e + tau).clamp(sps / 2.0, 1.5 * sps);
        cursor += step;

        prev_y = Some(y);
        prev_d = Some(decision);

        if cursor + 2.0 >= samples.len() as f64 {
            break;
        }
    }

    let mean_timing_error = if timing_errors.is_empty() {
        0.0
    } else {
        timing_errors.iter().sum::<f64>() / timing_errors.len() as f64
    };

    Ok(TimingResult {
        symbols,
        decisions,
        indices,
        timing_errors,
        mean_timing_error,
    })
}
