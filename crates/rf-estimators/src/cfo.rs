use num_complex::Complex32;

use crate::error::{EstimatorError, Result};

/// Carrier frequency offset estimate (SPEC_FULL.md §4.3.1). `normalized` is
/// cycles/sample in `[-0.5, 0.5]`; `hz = normalized * fs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfoEstimate {
    pub hz: f64,
    pub normalized: f64,
    pub confidence: f64,
    pub method: &'static str,
}

/// Lag-L autocorrelation ("power") CFO estimator. `lag` defaults to 1.
pub fn cfo_power(samples: &[Complex32], fs: f64, lag: usize) -> Result<CfoEstimate> {
    if lag == 0 {
        return Err(EstimatorError::InvalidParameter {
            name: "lag",
            reason: "must be nonzero".into(),
        });
    }
    if samples.len() <= lag {
        return Err(EstimatorError::BlockTooShort {
            min: lag + 1,
            got: samples.len(),
        });
    }

    let mut acc = Complex32::default();
    let mut count = 0usize;
    for n in lag..samples.len() {
        acc += samples[n] * samples[n - lag].conj();
        count += 1;
    }
    let r = acc / count as f32;
    let normalized = (r.arg() as f64) / (2.0 * std::f64::consts::PI * lag as f64);
    let confidence = (r.norm() as f64).clamp(0.0, 1.0);

    Ok(CfoEstimate {
        hz: normalized * fs,
        normalized,
        confidence,
        method: "power",
    })
}

/// Kay's weighted lag-1 phase-difference estimator.
pub fn cfo_kay(samples: &[Complex32], fs: f64) -> Result<CfoEstimate> {
    let n = samples.len();
    if n < 2 {
        return Err(EstimatorError::BlockTooShort { min: 2, got: n });
    }
    let nf = n as f64;

    let mut weighted_sum = 0.0_f64;
    for k in 1..n {
        let delta = (samples[k] * samples[k - 1].conj()).arg() as f64;
        let w = 1.5 * nf / (nf * nf - 1.0) * ((nf - k as f64) * k as f64) / (nf - 1.0);
        weighted_sum += w * delta;
    }
    let normalized = weighted_sum / (2.0 * std::f64::consts::PI);

    Ok(CfoEstimate {
        hz: normalized * fs,
        normalized,
        confidence: 0.9,
        method: "kay",
    })
}

/// Fitz's multi-lag weighted phase estimator.
pub fn cfo_fitz(samples: &[Complex32], fs: f64, max_lag: usize) -> Result<CfoEstimate> {
    let n = samples.len();
    let l_max = max_lag.min(n / 4);
    if l_max == 0 {
        return Err(EstimatorError::BlockTooShort { min: 4, got: n });
    }

    let mut phases = Vec::with_capacity(l_max);
    let mut raw_weights = Vec::with_capacity(l_max);
    for m in 1..=l_max {
        let mut acc = Complex32::default();
        let mut count = 0usize;
        for k in m..n {
            acc += samples[k] * samples[k - m].conj();
            count += 1;
        }
        let r = acc / count as f32;
        phases.push(r.arg() as f64);
        raw_weights.push((m * (n - m)) as f64);
    }

    let weight_sum: f64 = raw_weights.iter().sum();
    let mut acc = 0.0_f64;
    for (m, (&phi, &w)) in phases.iter().zip(raw_weights.iter()).enumerate() {
        let m = (m + 1) as f64;
        acc += (w / weight_sum) * (phi / m);
    }
    let normalized = acc / (2.0 * std::f64::consts::PI);

    Ok(CfoEstimate {
        hz: normalized * fs,
        normalized,
        confidence: 0.85,
        method: "fitz",
    })
}
