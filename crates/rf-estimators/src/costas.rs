use num_complex::Complex32;

use crate::error::{EstimatorError, Result};

const LOCK_WINDOW: usize = 100;
const LOCK_VARIANCE_THRESHOLD: f64 = 0.1;

/// Modulation order selects the Costas phase detector (SPEC_FULL.md §4.3.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostasMode {
    Bpsk,
    Qpsk,
    Psk8,
}

fn phase_error(y: Complex32, mode: CostasMode) -> f64 {
    match mode {
        CostasMode::Bpsk => (y.re * y.im) as f64,
        CostasMode::Qpsk => (y.re * y.im.signum() - y.im * y.re.signum()) as f64,
        CostasMode::Psk8 => {
            let angle = y.arg() as f64;
            let step = std::f64::consts::FRAC_PI_4;
            let mut e = angle - (angle / step).round() * step;
            while e > std::f64::consts::PI {
                e -= 2.0 * std::f64::consts::PI;
            }
            while e <= -std::f64::consts::PI {
                e += 2.0 * std::f64::consts::PI;
            }
            e
        }
    }
}

/// Output of [`run_costas_loop`].
#[derive(Debug, Clone)]
pub struct CostasResult {
    pub corrected: Vec<Complex32>,
    pub phase_trajectory: Vec<f64>,
    pub freq_trajectory: Vec<f64>,
    pub final_freq_hz: f64,
    pub lock_detected: bool,
    pub lock_time: Option<usize>,
}

/// Type-II second-order Costas PLL (SPEC_FULL.md §4.3.3).
pub fn run_costas_loop(
    samples: &[Complex32],
    fs: f64,
    mode: CostasMode,
    loop_bandwidth: f64,
    damping: f64,
) -> Result<CostasResult> {
    if samples.len() < LOCK_WINDOW {
        return Err(EstimatorError::BlockTooShort {
            min: LOCK_WINDOW,
            got: samples.len(),
        });
    }
    if damping <= 0.0 {
        return Err(EstimatorError::InvalidParameter {
            name: "damping",
            reason: "must be positive".into(),
        });
    }

    let theta = loop_bandwidth / (damping + 1.0 / (4.0 * damping));
    let d = 1.0 + 2.0 * damping * theta + theta * theta;
    let alpha = 4.0 * damping * theta / d;
    let beta = 4.0 * theta * theta / d;

    let n = samples.len();
    let mut phi = 0.0_f64;
    let mut nu = 0.0_f64;

    let mut corrected = Vec::with_capacity(n);
    let mut phase_trajectory = Vec::with_capacity(n);
    let mut freq_trajectory = Vec::with_capacity(n);
    let mut errors = Vec::with_capacity(n);

    for &x in samples {
        let rotation = Complex32::new(phi.cos() as f32, -(phi.sin() as f32));
        let y = x * rotation;
        let e = phase_error(y, mode);

        nu = (nu + beta * e).clamp(-0.5, 0.5);
        phi = (phi + alpha * e + nu + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI)
            - std::f64::consts::PI;

        corrected.push(y);
        phase_trajectory.push(phi);
        freq_trajectory.push(nu);
        errors.push(e);
    }

    // Window *start* index, matching the original's `_detect_lock` (it
    // returns `i - window_size`, not the window's end).
    let lock_time = (LOCK_WINDOW - 1..n).find_map(|i| {
        let window = &errors[i + 1 - LOCK_WINDOW..=i];
        let mean = window.iter().sum::<f64>() / LOCK_WINDOW as f64;
        let variance = window.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / LOCK_WINDOW as f64;
        (variance < LOCK_VARIANCE_THRESHOLD).then_some(i + 1 - LOCK_WINDOW)
    });

    let final_normalized = match lock_time {
        Some(t) => freq_trajectory[t..].iter().sum::<f64>() / (n - t) as f64,
        None => {
            let tail_start = n - (n / 5).max(1);
            freq_trajectory[tail_start..].iter().sum::<f64>() / (n - tail_start) as f64
        }
    };

    // `nu` is a per-sample phase increment in radians; convert to Hz via
    // the sample rate and 2π, matching `costas_loop.py`'s
    // `final_frequency_normalized * sample_rate / (2*np.pi)`.
    Ok(CostasResult {
        corrected,
        phase_trajectory,
        freq_trajectory,
        final_freq_hz: final_normalized / (2.0 * std::f64::consts::PI) * fs,
        lock_detected: lock_time.is_some(),
        lock_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qpsk_with_cfo(n: usize, cfo_hz: f64, fs: f64, sps: usize) -> Vec<Complex32> {
        let symbols = [
            Complex32::new(1.0, 1.0),
            Complex32::new(-1.0, 1.0),
            Complex32::new(-1.0, -1.0),
            Complex32::new(1.0, -1.0),
        ];
        (0..n)
            .map(|i| {
                let sym = symbols[(i / sps) % 4];
                let phase = 2.0 * std::f64::consts::PI * cfo_hz * i as f64 / fs;
                let rot = Complex32::new(phase.cos() as f32, phase.sin() as f32);
                sym * rot
            })
            .collect()
    }

    #[test]
    fn converges_to_known_cfo_within_tolerance() {
        // Costas convergence scenario: 1kHz CFO, SpS=10, 1000 symbols, fs=1MHz.
        let fs = 1_000_000.0;
        let samples = qpsk_with_cfo(10_000, 1_000.0, fs, 10);
        let result = run_costas_loop(&samples, fs, CostasMode::Qpsk, 0.01, 0.707).unwrap();
        assert!(result.lock_detected, "expected lock to be detected");
        assert!(
            result.lock_time.unwrap() < 3000,
            "lock_time {:?} too late",
            result.lock_time
        );
        assert!(
            (result.final_freq_hz - 1_000.0).abs() < 50.0,
            "got {}",
            result.final_freq_hz
        );
    }

    #[test]
    fn corrected_stream_matches_input_length() {
        let fs = 1_000_000.0;
        let samples = qpsk_with_cfo(2000, 500.0, fs, 10);
        let result = run_costas_loop(&samples, fs, CostasMode::Qpsk, 0.01, 0.707).unwrap();
        assert_eq!(result.corrected.len(), samples.len());
        assert_eq!(result.phase_trajectory.len(), samples.len());
        assert_eq!(result.freq_trajectory.len(), samples.len());
    }

    #[test]
    fn rejects_block_shorter_than_lock_window() {
        let samples = vec![Complex32::new(1.0, 0.0); 10];
        assert!(run_costas_loop(&samples, 1_000_000.0, CostasMode::Bpsk, 0.01, 0.707).is_err());
    }

    #[test]
    fn rejects_nonpositive_damping() {
        let samples = vec![Complex32::new(1.0, 0.0); 200];
        assert!(run_costas_loop(&samples, 1_000_000.0, CostasMode::Bpsk, 0.01, 0.0).is_err());
    }
}
