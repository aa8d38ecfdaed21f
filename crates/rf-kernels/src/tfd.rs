use num_complex::Complex32;
use rf_backend::{fft_shift, fftfreq, Backend, WindowKind};

use crate::error::{KernelError, Result};

/// Result of a time-frequency distribution kernel (SPEC_FULL.md §3
/// "Time–Frequency Distribution"). Applies to WVD, PWVD, and CWD alike.
pub struct TfdResult {
    /// Rows indexed by time slice, columns by normalized frequency bin.
    pub magnitude: Vec<Vec<f32>>,
    pub time_axis: Vec<f64>,
    pub freq_axis: Vec<f64>,
    pub shape: [usize; 2],
}

fn validate_nfft(nfft: usize) -> Result<()> {
    if nfft == 0 || nfft % 2 != 0 {
        return Err(KernelError::InvalidParameter {
            name: "nfft",
            reason: "must be even and nonzero".into(),
        });
    }
    Ok(())
}

/// Shared engine behind WVD/PWVD (`cwd_sigma = None`) and Choi-Williams
/// (`cwd_sigma = Some(sigma)`), per SPEC_FULL.md §4.2.3/§4.2.4: the two
/// distributions differ only in whether the instantaneous autocorrelation
/// is weighted by the Choi-Williams exponential kernel before the
/// (optional) smoothing window and row FFT.
fn time_frequency_distribution(
    backend: &dyn Backend,
    samples: &[Complex32],
    nfft: usize,
    num_time_points: Option<usize>,
    smoothing: bool,
    smooth_window_len: usize,
    cwd_sigma: Option<f64>,
) -> Result<TfdResult> {
    validate_nfft(nfft)?;
    let n = samples.len();
    if n < nfft {
        return Err(KernelError::BlockTooShort { min: nfft, got: n });
    }

    let half = nfft / 2;
    let t_count = num_time_points.unwrap_or(n / 4).max(1);
    let time_indices: Vec<usize> = (0..t_count)
        .map(|i| i * (n / t_count) + half)
        .filter(|&t| t >= half && t < n - half)
        .collect();

    let smooth_taps = if smoothing {
        Some(build_centered_hamming(smooth_window_len, nfft))
    } else {
        None
    };

    let mut magnitude = Vec::with_capacity(time_indices.len());
    let mut row_buf = vec![Complex32::default(); nfft];
    for &t in &time_indices {
        for tau in 0..nfft as isize {
            let shifted = tau - half as isize;
            let lag = shifted.div_euclid(2);
            let a = samples[(t as isize + lag) as usize];
            let b = samples[(t as isize - lag) as usize];
            let mut r = a * b.conj();
            if let Some(sigma) = cwd_sigma {
                let t2 = (t as f64) * (t as f64) + 1e-12;
                let weight = (-sigma * (shifted as f64).powi(2) / t2).exp();
                r *= weight as f32;
            }
            row_buf[tau as usize] = r;
        }
        if let Some(ref taps) = smooth_taps {
            for (v, w) in row_buf.iter_mut().zip(taps.iter()) {
                *v *= *w;
            }
        }
        backend.fft_forward(&mut row_buf);
        let row_mag: Vec<f32> = row_buf.iter().map(|c| c.norm()).collect();
        magnitude.push(fft_shift(&row_mag));
    }

    let time_axis: Vec<f64> = time_indices.iter().map(|&t| t as f64).collect();
    let freq_axis = fft_shift(&fftfreq(nfft, 1.0));
    let shape = [magnitude.len(), nfft];

    Ok(TfdResult {
        magnitude,
        time_axis,
        freq_axis,
        shape,
    })
}

/// Build a length-`nfft` tap sequence that is a centered, zero-padded
/// Hamming window of length `smooth_len` (SPEC_FULL.md §4.2.3).
fn build_centered_hamming(smooth_len: usize, nfft: usize) -> Vec<f32> {
    let mut taps = vec![0.0_f32; nfft];
    if smooth_len == 0 {
        return taps;
    }
    let start = (nfft.saturating_sub(smooth_len)) / 2;
    let denom = if smooth_len > 1 {
        (smooth_len - 1) as f64
    } else {
        1.0
    };
    for i in 0..smooth_len {
        if start + i >= nfft {
            break;
        }
        let w = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos();
        taps[start + i] = w as f32;
    }
    taps
}

/// Wigner-Ville / Pseudo-WVD (SPEC_FULL.md §4.2.3).
pub fn wigner_ville(
    backend: &dyn Backend,
    samples: &[Complex32],
    nfft: usize,
    num_time_points: Option<usize>,
    smoothing: bool,
    smooth_window_len: usize,
) -> Result<TfdResult> {
    time_frequency_distribution(
        backend,
        samples,
        nfft,
        num_time_points,
        smoothing,
        smooth_window_len,
        None,
    )
}

/// Choi-Williams distribution (SPEC_FULL.md §4.2.4).
pub fn choi_williams(
    backend: &dyn Backend,
    samples: &[Complex32],
    nfft: usize,
    sigma: f64,
    num_time_points: Option<usize>,
) -> Result<TfdResult> {
    time_frequency_distribution(backend, samples, nfft, num_time_points, false, 0, Some(sigma))
}
