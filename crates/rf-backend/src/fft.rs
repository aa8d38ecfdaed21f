use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

/// Cached complex-to-complex FFT planner.
///
/// Every kernel in this engine operates on complex baseband I/Q, so unlike
/// the teacher's real-valued `RealFftPlanner`, plans here come from
/// [`FftPlanner<f32>`] directly. Forward and inverse plans are cached by
/// transform length the same way the teacher caches
/// `Arc<dyn RealToComplex<f32>>`/`Arc<dyn ComplexToReal<f32>>`: once built,
/// a plan for a given length is never rebuilt. Scratch buffers follow the
/// same grow-but-never-shrink discipline — resized up to the required
/// length and never reallocated smaller, so repeated calls at a stable
/// block size settle into zero allocations.
pub struct FftEngine {
    planner: Mutex<FftPlanner<f32>>,
    forward: Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>,
    inverse: Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>,
    scratch: Mutex<HashMap<usize, Vec<Complex32>>>,
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FftEngine {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
            forward: Mutex::new(HashMap::new()),
            inverse: Mutex::new(HashMap::new()),
            scratch: Mutex::new(HashMap::new()),
        }
    }

    fn forward_plan(&self, len: usize) -> Arc<dyn Fft<f32>> {
        let mut cache = self.forward.lock().unwrap();
        cache
            .entry(len)
            .or_insert_with(|| self.planner.lock().unwrap().plan_fft_forward(len))
            .clone()
    }

    fn inverse_plan(&self, len: usize) -> Arc<dyn Fft<f32>> {
        let mut cache = self.inverse.lock().unwrap();
        cache
            .entry(len)
            .or_insert_with(|| self.planner.lock().unwrap().plan_fft_inverse(len))
            .clone()
    }

    fn with_scratch(&self, len: usize, required: usize, f: impl FnOnce(&mut [Complex32])) {
        let mut scratch_cache = self.scratch.lock().unwrap();
        let scratch = scratch_cache.entry(len).or_insert_with(Vec::new);
        if scratch.len() < required {
            scratch.resize(required, Complex32::default());
        }
        f(&mut scratch[..required]);
    }

    /// In-place forward FFT. `buf.len()` is the transform length.
    pub fn forward(&self, buf: &mut [Complex32]) {
        let plan = self.forward_plan(buf.len());
        let required = plan.get_inplace_scratch_len();
        self.with_scratch(buf.len(), required, |scratch| {
            plan.process_with_scratch(buf, scratch);
        });
    }

    /// In-place inverse FFT, normalized by `1/len` so it is a true inverse
    /// of [`FftEngine::forward`].
    pub fn inverse_normalized(&self, buf: &mut [Complex32]) {
        let plan = self.inverse_plan(buf.len());
        let required = plan.get_inplace_scratch_len();
        self.with_scratch(buf.len(), required, |scratch| {
            plan.process_with_scratch(buf, scratch);
        });
        let norm = 1.0 / buf.len() as f32;
        for v in buf.iter_mut() {
            *v *= norm;
        }
    }

    /// FFT-based `same`-length convolution of a complex signal against a
    /// real-valued tap sequence (grounded on `FftConvolver::convolve_forward`
    /// in the teacher: zero-pad to a power of two, forward-transform both
    /// operands, multiply pointwise, inverse-transform, then crop back to
    /// the input length, centered the way `scipy`'s `same` mode centers it).
    pub fn convolve_same(&self, signal: &[Complex32], taps: &[f32]) -> Vec<Complex32> {
        if signal.is_empty() || taps.is_empty() {
            return vec![Complex32::default(); signal.len()];
        }
        let full_len = signal.len() + taps.len() - 1;
        let padded_len = full_len.next_power_of_two();

        let mut sig_buf = vec![Complex32::default(); padded_len];
        sig_buf[..signal.len()].copy_from_slice(signal);
        self.forward(&mut sig_buf);

        let mut tap_buf = vec![Complex32::default(); padded_len];
        for (dst, &t) in tap_buf.iter_mut().zip(taps.iter()) {
            *dst = Complex32::new(t, 0.0);
        }
        self.forward(&mut tap_buf);

        for (s, t) in sig_buf.iter_mut().zip(tap_buf.iter()) {
            *s *= *t;
        }
        self.inverse_normalized(&mut sig_buf);

        let start = (taps.len() - 1) / 2;
        sig_buf[start..start + signal.len()].to_vec()
    }
}

/// Swap the two halves of a spectrum so DC sits at `len/2` (even length)
/// or the natural center bin (odd length), matching `numpy.fft.fftshift`.
pub fn fft_shift<T: Copy>(buf: &[T]) -> Vec<T> {
    let n = buf.len();
    let mid = n - n / 2;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&buf[mid..]);
    out.extend_from_slice(&buf[..mid]);
    out
}

/// `numpy.fft.fftfreq(n, d)`: bin `k` maps to frequency `k/(n*d)` for
/// `k` in `0..n/2` and `(k-n)/(n*d)` for the remainder, unshifted.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    let mut out = vec![0.0; n];
    let scale = 1.0 / (n as f64 * d);
    let half = n.div_ceil(2);
    for k in 0..half {
        out[k] = k as f64 * scale;
    }
    for k in half..n {
        out[k] = (k as f64 - n as f64) * scale;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_inverse_round_trip_recovers_signal() {
        let engine = FftEngine::new();
        let original: Vec<Complex32> = (0..64)
            .map(|i| Complex32::new((i as f32 * 0.1).sin(), (i as f32 * 0.2).cos()))
            .collect();
        let mut buf = original.clone();
        engine.forward(&mut buf);
        engine.inverse_normalized(&mut buf);
        for (a, b) in original.iter().zip(buf.iter()) {
            assert!(
                (a - b).norm() < 1e-4,
                "round trip mismatch: {a:?} vs {b:?}"
            );
        }
    }

    #[test]
    fn forward_of_pure_tone_peaks_at_expected_bin() {
        let engine = FftEngine::new();
        let n = 128;
        let k0 = 10usize;
        let mut buf: Vec<Complex32> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * k0 as f32 * i as f32 / n as f32;
                Complex32::new(phase.cos(), phase.sin())
            })
            .collect();
        engine.forward(&mut buf);
        let (peak_idx, _) = buf
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .unwrap();
        assert_eq!(peak_idx, k0, "expected spectral peak at bin {k0}");
    }

    #[test]
    fn fft_shift_centers_dc_for_even_length() {
        let buf: Vec<i32> = (0..8).collect();
        let shifted = fft_shift(&buf);
        assert_eq!(shifted, vec![4, 5, 6, 7, 0, 1, 2, 3]);
    }

    #[test]
    fn convolve_same_impulse_recovers_taps_centered() {
        let engine = FftEngine::new();
        let taps = vec![1.0_f32, 2.0, 3.0];
        let mut signal = vec![Complex32::default(); 9];
        signal[4] = Complex32::new(1.0, 0.0);
        let out = engine.convolve_same(&signal, &taps);
        assert_eq!(out.len(), signal.len());
        assert!((out[3].re - 1.0).abs() < 1e-4, "got {:?}", out[3]);
        assert!((out[4].re - 2.0).abs() < 1e-4, "got {:?}", out[4]);
        assert!((out[5].re - 3.0).abs() < 1e-4, "got {:?}", out[5]);
    }

    #[test]
    fn fftfreq_matches_numpy_convention() {
        let freqs = fftfreq(8, 1.0);
        assert_eq!(freqs, vec![0.0, 0.125, 0.25, 0.375, -0.5, -0.375, -0.25, -0.125]);
    }
}
