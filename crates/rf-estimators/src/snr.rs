use num_complex::Complex32;

use crate::error::{EstimatorError, Result};

/// Kurtosis correction factor used by the M2M4 estimator
/// (SPEC_FULL.md §4.3.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModulationKind {
    Psk,
    Fsk,
    Ofdm,
    Qam16,
    Qam64,
}

impl ModulationKind {
    fn kappa(self) -> f64 {
        match self {
            ModulationKind::Psk | ModulationKind::Fsk | ModulationKind::Ofdm => 1.0,
            ModulationKind::Qam16 => 1.32,
            ModulationKind::Qam64 => 1.38,
        }
    }
}

/// Result of [`m2m4_snr`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct M2m4Result {
    pub snr_db: f64,
    pub snr_linear: f64,
    pub signal_power: f64,
    pub noise_power: f64,
}

const SATURATION_SNR_LINEAR: f64 = 100.0;

fn m2m4(samples: &[Complex32], kappa: f64) -> M2m4Result {
    let n = samples.len() as f64;
    let mut m2 = 0.0_f64;
    let mut m4 = 0.0_f64;
    for &s in samples {
        let p = s.norm_sqr() as f64;
        m2 += p;
        m4 += p * p;
    }
    m2 /= n;
    m4 /= n;

    let denom = kappa * m4 - m2 * m2;
    let snr_linear = if denom <= 0.0 {
        SATURATION_SNR_LINEAR
    } else {
        (2.0 * m2 * m2 / denom).sqrt()
    };
    let snr_db = 10.0 * snr_linear.log10();
    let signal_power = m2 * snr_linear / (1.0 + snr_linear);
    let noise_power = m2 / (1.0 + snr_linear);

    M2m4Result {
        snr_db,
        snr_linear,
        signal_power,
        noise_power,
    }
}

/// Blind M2M4 SNR estimator (SPEC_FULL.md §4.3.2).
pub fn m2m4_snr(samples: &[Complex32], modulation: ModulationKind) -> Result<M2m4Result> {
    if samples.is_empty() {
        return Err(EstimatorError::BlockTooShort { min: 1, got: 0 });
    }
    Ok(m2m4(samples, modulation.kappa()))
}

/// Result of [`m2m4_snr_segmented`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedSnrResult {
    pub mean_db: f64,
    pub segments_db: Vec<f64>,
}

/// M2M4 SNR estimated independently over `segments` equal-sized blocks.
pub fn m2m4_snr_segmented(
    samples: &[Complex32],
    modulation: ModulationKind,
    segments: usize,
) -> Result<SegmentedSnrResult> {
    if segments == 0 {
        return Err(EstimatorError::InvalidParameter {
            name: "segments",
            reason: "must be nonzero".into(),
        });
    }
    let per_segment = samples.len() / segments;
    if per_segment == 0 {
        return Err(EstimatorError::BlockTooShort {
            min: segments,
            got: samples.len(),
        });
    }

    let kappa = modulation.kappa();
    let segments_db: Vec<f64> = (0..segments)
        .map(|i| {
            let start = i * per_segment;
            m2m4(&samples[start..start + per_segment], kappa).snr_db
        })
        .collect();
    let mean_db = segments_db.iter().sum::<f64>() / segments_db.len() as f64;

    Ok(SegmentedSnrResult {
        mean_db,
        segments_db,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lcg(u64);
    impl Lcg {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
            (self.0 >> 33) as u32
        }
        fn next_unit(&mut self) -> f32 {
            (self.next_u32() as f32 / u32::MAX as f32) * 2.0 - 1.0
        }
    }

    fn gaussian_pair(rng: &mut Lcg) -> (f64, f64) {
        let u1 = (rng.next_unit() * 0.5 + 0.5).clamp(1e-6, 1.0 - 1e-6) as f64;
        let u2 = rng.next_unit() as f64 * 0.5 + 0.5;
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        (r * theta.cos(), r * theta.sin())
    }

    /// Synthetic QPSK symbols plus AWGN at a target SNR in dB.
    fn qpsk_with_snr(n: usize, snr_db: f64, seed: u64) -> Vec<Complex32> {
        let snr_lin = 10f64.powf(snr_db / 10.0);
        let noise_std = (1.0 / (2.0 * snr_lin)).sqrt();
        let mut rng = Lcg(seed);
        let symbols = [
            Complex32::new(std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
            Complex32::new(-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
            Complex32::new(-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
            Complex32::new(std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
        ];
        (0..n)
            .map(|i| {
                let sym = symbols[i % 4];
                let (ni, nq) = gaussian_pair(&mut rng);
                sym + Complex32::new((ni * noise_std) as f32, (nq * noise_std) as f32)
            })
            .collect()
    }

    #[test]
    fn estimate_is_within_tolerance_across_snr_range() {
        for &target_db in &[0.0, 5.0, 10.0, 20.0] {
            let samples = qpsk_with_snr(65536, target_db, 11);
            let result = m2m4_snr(&samples, ModulationKind::Psk).unwrap();
            assert!(
                (result.snr_db - target_db).abs() <= 1.5,
                "target {target_db} got {}",
                result.snr_db
            );
        }
    }

    #[test]
    fn degenerate_case_saturates_at_twenty_db() {
        let samples = vec![Complex32::new(1.0, 0.0); 1024];
        let result = m2m4_snr(&samples, ModulationKind::Psk).unwrap();
        assert!((result.snr_db - 20.0).abs() < 1e-6);
        assert_eq!(result.snr_linear, SATURATION_SNR_LINEAR);
    }

    #[test]
    fn segmented_mean_matches_manual_average() {
        let samples = qpsk_with_snr(4096, 10.0, 5);
        let segmented = m2m4_snr_segmented(&samples, ModulationKind::Psk, 4).unwrap();
        assert_eq!(segmented.segments_db.len(), 4);
        let manual_mean: f64 =
            segmented.segments_db.iter().sum::<f64>() / segmented.segments_db.len() as f64;
        assert!((segmented.mean_db - manual_mean).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_block() {
        assert!(m2m4_snr(&[], ModulationKind::Psk).is_err());
    }

    #[test]
    fn segmented_rejects_too_few_samples_for_segment_count() {
        let samples = vec![Complex32::new(1.0, 0.0); 3];
        assert!(m2m4_snr_segmented(&samples, ModulationKind::Psk, 10).is_err());
    }
}
