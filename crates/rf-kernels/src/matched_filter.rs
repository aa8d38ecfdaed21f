use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_complex::Complex32;
use rf_backend::Backend;

use crate::error::{KernelError, Result};

/// Parametric pulse-shape filter kinds (SPEC_FULL.md §3 "Pulse-shape
/// filter", §4.2.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseShape {
    /// Root-raised-cosine, keyed by rolloff and samples-per-symbol.
    Rrc { rolloff: f64, sps: f64 },
    /// Gaussian, keyed by bandwidth-time product and samples-per-symbol.
    Gaussian { bt: f64, sps: f64 },
}

impl PulseShape {
    fn cache_key(&self, num_taps: usize) -> (u8, usize, u64, u64) {
        match *self {
            PulseShape::Rrc { rolloff, sps } => {
                (0, num_taps, rolloff.to_bits(), sps.to_bits())
            }
            PulseShape::Gaussian { bt, sps } => (1, num_taps, bt.to_bits(), sps.to_bits()),
        }
    }
}

/// Centered sample offsets `n/sps` for an odd-length tap sequence of
/// `num_taps` taps, index 0 at the center.
fn centered_offsets(num_taps: usize, sps: f64) -> Vec<f64> {
    let half = (num_taps / 2) as isize;
    (0..num_taps)
        .map(|i| (i as isize - half) as f64 / sps)
        .collect()
}

fn rrc_taps(num_taps: usize, rolloff: f64, sps: f64) -> Vec<f32> {
    let times = centered_offsets(num_taps, sps);
    let mut taps: Vec<f64> = times
        .iter()
        .map(|&t| {
            if t.abs() < 1e-9 {
                1.0 - rolloff + 4.0 * rolloff / std::f64::consts::PI
            } else if rolloff > 0.0 && (t.abs() - 1.0 / (4.0 * rolloff)).abs() < 1e-9 {
                let x = std::f64::consts::FRAC_PI_4 / rolloff;
                (rolloff / std::f64::consts::SQRT_2)
                    * ((1.0 + 2.0 / std::f64::consts::PI) * x.sin()
                        + (1.0 - 2.0 / std::f64::consts::PI) * x.cos())
            } else {
                let pit = std::f64::consts::PI * t;
                let numerator = (pit * (1.0 - rolloff)).sin()
                    + 4.0 * rolloff * t * (pit * (1.0 + rolloff)).cos();
                let denominator = pit * (1.0 - (4.0 * rolloff * t).powi(2));
                numerator / denominator
            }
        })
        .collect();

    let energy: f64 = taps.iter().map(|v| v * v).sum::<f64>().sqrt();
    if energy > 0.0 {
        for v in taps.iter_mut() {
            *v /= energy;
        }
    }
    taps.into_iter().map(|v| v as f32).collect()
}

fn gaussian_taps(num_taps: usize, bt: f64, sps: f64) -> Vec<f32> {
    let alpha = (2.0_f64.ln() / 2.0).sqrt() / bt;
    let times = centered_offsets(num_taps, sps);
    let mut taps: Vec<f64> = times
        .iter()
        .map(|&t| {
            let x = std::f64::consts::PI * t / alpha;
            (std::f64::consts::PI.sqrt() / alpha) * (-x * x).exp()
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 0.0 {
        for v in taps.iter_mut() {
            *v /= sum;
        }
    }
    taps.into_iter().map(|v| v as f32).collect()
}

/// Cache of generated tap sequences keyed by `(shape, parameter, taps)`
/// (SPEC_FULL.md §3 "Pulse-shape filter").
#[derive(Default)]
pub struct MatchedFilterCache {
    cache: Mutex<HashMap<(u8, usize, u64, u64), Arc<Vec<f32>>>>,
}

impl MatchedFilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shape: PulseShape, num_taps: usize) -> Result<Arc<Vec<f32>>> {
        if num_taps == 0 || num_taps % 2 == 0 {
            return Err(KernelError::InvalidParameter {
                name: "num_taps",
                reason: "must be odd and nonzero".into(),
            });
        }
        let key = shape.cache_key(num_taps);
        let mut cache = self.cache.lock().unwrap();
        if let Some(existing) = cache.get(&key) {
            return Ok(existing.clone());
        }
        let taps = match shape {
            PulseShape::Rrc { rolloff, sps } => rrc_taps(num_taps, rolloff, sps),
            PulseShape::Gaussian { bt, sps } => gaussian_taps(num_taps, bt, sps),
        };
        let taps = Arc::new(taps);
        cache.insert(key, taps.clone());
        Ok(taps)
    }
}

/// Apply `taps` to a complex signal with `same` padding
/// (SPEC_FULL.md §4.2.7).
pub fn apply_matched_filter(
    backend: &dyn Backend,
    samples: &[Complex32],
    taps: &[f32],
) -> Vec<Complex32> {
    backend.convolve_same(samples, taps)
}
