use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{BackendError, Result};

/// Named spectral-weighting windows (SPEC_FULL.md §3 "Window").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Hann,
    Hamming,
    Blackman,
    Kaiser,
}

impl WindowKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hann" => Ok(WindowKind::Hann),
            "hamming" => Ok(WindowKind::Hamming),
            "blackman" => Ok(WindowKind::Blackman),
            "kaiser" => Ok(WindowKind::Kaiser),
            other => Err(BackendError::UnknownWindow(other.to_string())),
        }
    }
}

/// Zeroth-order modified Bessel function of the first kind, used by the
/// Kaiser window. Series expansion truncated once terms stop contributing
/// at `f64` precision; 24 terms is comfortably enough for β up to a few
/// hundred.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let half_x = x / 2.0;
    for k in 1..32 {
        term *= (half_x / k as f64).powi(2);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

/// Build the tap sequence for `kind` at length `len`. Internal math is
/// `f64`; taps are stored `f32`, matching the teacher's
/// compute-wide-store-narrow convention (`build_kernel` in `kernel.rs`).
fn generate(kind: WindowKind, len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    if len == 1 {
        return vec![1.0];
    }
    let n = len as f64;
    (0..len)
        .map(|i| {
            let x = i as f64;
            let v = match kind {
                WindowKind::Hann => 0.5 - 0.5 * (2.0 * std::f64::consts::PI * x / (n - 1.0)).cos(),
                WindowKind::Hamming => {
                    0.54 - 0.46 * (2.0 * std::f64::consts::PI * x / (n - 1.0)).cos()
                }
                WindowKind::Blackman => {
                    let a0 = 0.42;
                    let a1 = 0.5;
                    let a2 = 0.08;
                    a0 - a1 * (2.0 * std::f64::consts::PI * x / (n - 1.0)).cos()
                        + a2 * (4.0 * std::f64::consts::PI * x / (n - 1.0)).cos()
                }
                WindowKind::Kaiser => {
                    const BETA: f64 = 14.0;
                    let ratio = (2.0 * x / (n - 1.0)) - 1.0;
                    let arg = BETA * (1.0 - ratio * ratio).max(0.0).sqrt();
                    bessel_i0(arg) / bessel_i0(BETA)
                }
            };
            v as f32
        })
        .collect()
}

/// Cache of window taps keyed by `(kind, length)`, populated on first
/// demand and held for the life of the backend (SPEC_FULL.md §3).
#[derive(Default)]
pub struct WindowCache {
    cache: Mutex<HashMap<(WindowKind, usize), Arc<Vec<f32>>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: WindowKind, len: usize) -> Arc<Vec<f32>> {
        let mut cache = self.cache.lock().unwrap();
        cache
            .entry((kind, len))
            .or_insert_with(|| Arc::new(generate(kind, len)))
            .clone()
    }

    /// Drop every cached window. Invoked by [`crate::backend::Backend::cleanup`].
    pub fn clear(&self) {
        self.cache.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coherent power of a window, `Σw²`, used to normalize Welch PSD segments.
pub fn window_power(taps: &[f32]) -> f32 {
    taps.iter().map(|w| w * w).sum()
}
