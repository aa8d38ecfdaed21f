use num_complex::Complex32;
use rf_backend::{fft_shift, window_power, Backend, WindowKind};

use crate::error::{KernelError, Result};

const DB_FLOOR: f32 = -120.0;

/// Welch power spectral density (SPEC_FULL.md §4.2.1).
///
/// `fft_size` must be a power of two no smaller than 64; `overlap` is the
/// fractional overlap between consecutive segments, in `[0, 1)`. Output
/// length equals `fft_size`; values are in dB, floored at -120, FFT-shifted
/// so DC sits at index `fft_size / 2`.
pub fn psd_welch(
    backend: &dyn Backend,
    samples: &[Complex32],
    fft_size: usize,
    overlap: f32,
    window: WindowKind,
    detrend: bool,
) -> Result<Vec<f32>> {
    if fft_size < 64 || !fft_size.is_power_of_two() {
        return Err(KernelError::InvalidParameter {
            name: "fft_size",
            reason: "must be a power of two >= 64".into(),
        });
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(KernelError::InvalidParameter {
            name: "overlap",
            reason: "must be in [0, 1)".into(),
        });
    }
    if samples.len() < fft_size {
        return Err(KernelError::BlockTooShort {
            min: fft_size,
            got: samples.len(),
        });
    }

    let hop = (((fft_size as f32) * (1.0 - overlap)).round() as usize).max(1);
    let num_segments = (samples.len() - fft_size) / hop + 1;

    let mean = if detrend {
        let sum: Complex32 = samples.iter().sum();
        sum / samples.len() as f32
    } else {
        Complex32::default()
    };

    let taps = backend.window(window, fft_size);
    let win_power = window_power(&taps).max(f32::EPSILON);

    let mut accum = vec![0.0_f32; fft_size];
    let mut scratch = vec![Complex32::default(); fft_size];
    for seg in 0..num_segments {
        let start = seg * hop;
        for (i, s) in scratch.iter_mut().enumerate() {
            *s = (samples[start + i] - mean) * taps[i];
        }
        backend.fft_forward(&mut scratch);
        for (acc, v) in accum.iter_mut().zip(scratch.iter()) {
            *acc += v.norm_sqr();
        }
    }

    let norm = 1.0 / (num_segments as f32 * win_power);
    let psd: Vec<f32> = accum
        .iter()
        .map(|&p| (10.0 * (p * norm + 1e-12).log10()).max(DB_FLOOR))
        .collect();

    Ok(fft_shift(&psd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_backend::CpuBackend;

    fn complex_exponential(n: usize, freq_hz: f64, fs: f64) -> Vec<Complex32> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * freq_hz * i as f64 / fs;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect()
    }

    #[test]
    fn output_length_equals_fft_size() {
        let backend = CpuBackend::default();
        let samples = complex_exponential(4096, 1000.0, 1_000_000.0);
        let psd = psd_welch(&backend, &samples, 1024, 0.5, WindowKind::Hann, true).unwrap();
        assert_eq!(psd.len(), 1024);
    }

    #[test]
    fn db_floor_is_never_exceeded_downward() {
        let backend = CpuBackend::default();
        let samples = vec![Complex32::default(); 4096];
        let psd = psd_welch(&backend, &samples, 1024, 0.0, WindowKind::Hann, false).unwrap();
        assert!(psd.iter().all(|&v| v >= DB_FLOOR - 1e-3));
    }

    #[test]
    fn peak_bin_matches_known_tone_after_shift() {
        // scenario 3: x[n] = exp(j*2*pi*250000*n/1e6), N=16384, fft_size=1024, Hann -> peak at bin 768.
        let backend = CpuBackend::default();
        let samples = complex_exponential(16384, 250_000.0, 1_000_000.0);
        let psd = psd_welch(&backend, &samples, 1024, 0.5, WindowKind::Hann, true).unwrap();
        let (peak_idx, _) = psd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(peak_idx, 768, "expected peak at bin 768, psd: {:?}", psd);
    }

    #[test]
    fn rejects_non_power_of_two_fft_size() {
        let backend = CpuBackend::default();
        let samples = vec![Complex32::default(); 4096];
        assert!(psd_welch(&backend, &samples, 1000, 0.5, WindowKind::Hann, false).is_err());
    }

    #[test]
    fn rejects_block_shorter_than_fft_size() {
        let backend = CpuBackend::default();
        let samples = vec![Complex32::default(); 100];
        assert!(psd_welch(&backend, &samples, 1024, 0.5, WindowKind::Hann, false).is_err());
    }

    #[test]
    fn deterministic_across_runs() {
        let backend = CpuBackend::default();
        let samples = complex_exponential(4096, 1000.0, 1_000_000.0);
        let a = psd_welch(&backend, &samples, 1024, 0.5, WindowKind::Hann, true).unwrap();
        let b = psd_welch(&backend, &samples, 1024, 0.5, WindowKind::Hann, true).unwrap();
        assert_eq!(a, b);
    }
}
