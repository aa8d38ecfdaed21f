use num_complex::Complex32;
use rf_backend::{fft_shift, fftfreq, Backend, WindowKind};

use crate::error::{KernelError, Result};

/// Result of [`fam_scf`] (SPEC_FULL.md §3 "Spectral Correlation Function").
pub struct FamResult {
    /// Rows indexed by cyclic frequency (after the `alpha_max` crop),
    /// columns by spectral frequency. Normalized so the global maximum
    /// (computed before the crop) is 1.
    pub scf_magnitude: Vec<Vec<f32>>,
    pub spectral_freqs: Vec<f64>,
    pub cyclic_freqs: Vec<f64>,
    /// Max-hold over the spectral axis, one value per retained cyclic row.
    pub cyclic_profile: Vec<f32>,
    pub shape: [usize; 2],
}

/// FFT Accumulation Method spectral correlation function estimate
/// (SPEC_FULL.md §4.2.2).
pub fn fam_scf(
    backend: &dyn Backend,
    samples: &[Complex32],
    sample_rate: f64,
    nfft: usize,
    overlap: f32,
    alpha_max: f64,
    window: WindowKind,
) -> Result<FamResult> {
    if nfft == 0 {
        return Err(KernelError::InvalidParameter {
            name: "nfft",
            reason: "must be nonzero".into(),
        });
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(KernelError::InvalidParameter {
            name: "overlap",
            reason: "must be in [0, 1)".into(),
        });
    }
    if samples.len() < nfft {
        return Err(KernelError::BlockTooShort {
            min: nfft,
            got: samples.len(),
        });
    }
    if !(0.0..=1.0).contains(&alpha_max) {
        return Err(KernelError::InvalidParameter {
            name: "alpha_max",
            reason: "must be in (0, 1]".into(),
        });
    }

    let hop = (((nfft as f32) * (1.0 - overlap)).round() as usize).max(1);
    let m = (samples.len() - nfft) / hop + 1;
    let taps = backend.window(window, nfft);

    // Step (ii): channelize and FFT each block along the sample axis.
    let mut channel_matrix: Vec<Vec<Complex32>> = Vec::with_capacity(m);
    for block in 0..m {
        let start = block * hop;
        let mut row: Vec<Complex32> = (0..nfft)
            .map(|i| samples[start + i] * taps[i])
            .collect();
        backend.fft_forward(&mut row);
        channel_matrix.push(row);
    }

    // Step (iii): FFT along the block axis, one column at a time.
    let mut joint = vec![vec![Complex32::default(); nfft]; m];
    let mut column = vec![Complex32::default(); m];
    for k in 0..nfft {
        for (row_idx, col_val) in column.iter_mut().enumerate() {
            *col_val = channel_matrix[row_idx][k];
        }
        backend.fft_forward(&mut column);
        for (row_idx, &v) in column.iter().enumerate() {
            joint[row_idx][k] = v;
        }
    }

    // Step (iv): magnitude, normalized by the global max.
    let mut global_max = 0.0_f32;
    let mut magnitude = vec![vec![0.0_f32; nfft]; m];
    for (row_idx, row) in joint.iter().enumerate() {
        for (col_idx, v) in row.iter().enumerate() {
            let mag = v.norm();
            magnitude[row_idx][col_idx] = mag;
            if mag > global_max {
                global_max = mag;
            }
        }
    }
    if global_max > 0.0 {
        for row in magnitude.iter_mut() {
            for v in row.iter_mut() {
                *v /= global_max;
            }
        }
    }

    // Shift both axes so DC / alpha=0 sit at the center. `Vec<f32>` rows
    // aren't `Copy`, so the row axis is shifted by hand rather than via
    // `fft_shift`, which the column axis still uses directly.
    let row_mid = m - m / 2;
    let mut shifted_rows = Vec::with_capacity(m);
    shifted_rows.extend(magnitude[row_mid..].iter().cloned());
    shifted_rows.extend(magnitude[..row_mid].iter().cloned());
    let magnitude = shifted_rows
        .into_iter()
        .map(|row| fft_shift(&row))
        .collect::<Vec<_>>();
    let spectral_freqs = fft_shift(&fftfreq(nfft, 1.0 / sample_rate));
    let cyclic_freqs_full = fft_shift(&fftfreq(m, hop as f64 / sample_rate));

    let alpha_limit = alpha_max * sample_rate;
    let kept: Vec<usize> = (0..m)
        .filter(|&l| cyclic_freqs_full[l].abs() <= alpha_limit)
        .collect();

    let scf_magnitude: Vec<Vec<f32>> = kept.iter().map(|&l| magnitude[l].clone()).collect();
    let cyclic_freqs: Vec<f64> = kept.iter().map(|&l| cyclic_freqs_full[l]).collect();
    let cyclic_profile: Vec<f32> = scf_magnitude
        .iter()
        .map(|row| row.iter().cloned().fold(0.0_f32, f32::max))
        .collect();
    let shape = [scf_magnitude.len(), nfft];

    Ok(FamResult {
        scf_magnitude,
        spectral_freqs,
        cyclic_freqs,
        cyclic_profile,
        shape,
    })
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
    fn shape_matches_reported_dimensions() {
        let backend = CpuBackend::default();
        let samples = complex_exponential(4096, 1000.0, 1_000_000.0);
        let result = fam_scf(&backend, &samples, 1_000_000.0, 256, 0.5, 1.0, WindowKind::Hann)
            .unwrap();
        assert_eq!(result.shape[1], 256);
        assert_eq!(result.scf_magnitude.len(), result.shape[0]);
        assert_eq!(result.cyclic_freqs.len(), result.shape[0]);
        assert_eq!(result.cyclic_profile.len(), result.shape[0]);
        assert_eq!(result.spectral_freqs.len(), 256);
    }

    #[test]
    fn stationary_tone_peaks_at_zero_cyclic_frequency() {
        // A pure tone is wide-sense stationary: its SCF energy should
        // concentrate at alpha = 0.
        let backend = CpuBackend::default();
        let samples = complex_exponential(8192, 50_000.0, 1_000_000.0);
        let result = fam_scf(&backend, &samples, 1_000_000.0, 256, 0.5, 1.0, WindowKind::Hann)
            .unwrap();
        let zero_row = result
            .cyclic_freqs
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let peak_row = result
            .cyclic_profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_row, zero_row, "cyclic peak should sit at alpha=0");
    }

    #[test]
    fn alpha_max_crops_output_rows() {
        let backend = CpuBackend::default();
        let samples = complex_exponential(4096, 1000.0, 1_000_000.0);
        let full = fam_scf(&backend, &samples, 1_000_000.0, 256, 0.5, 1.0, WindowKind::Hann)
            .unwrap();
        let cropped = fam_scf(&backend, &samples, 1_000_000.0, 256, 0.5, 0.1, WindowKind::Hann)
            .unwrap();
        assert!(cropped.shape[0] <= full.shape[0]);
    }

    #[test]
    fn rejects_block_shorter_than_nfft() {
        let backend = CpuBackend::default();
        let samples = vec![Complex32::default(); 10];
        assert!(fam_scf(&backend, &samples, 1_000_000.0, 256, 0.5, 1.0, WindowKind::Hann).is_err());
    }
}
