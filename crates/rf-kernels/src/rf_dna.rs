use num_complex::Complex32;

use crate::error::{KernelError, Result};

/// RF-DNA transmitter fingerprint (SPEC_FULL.md §4.2.5). Always has length
/// `9 * regions`; ordering is domain (amplitude, phase, instantaneous
/// frequency) outermost, region index in the middle, statistic (variance,
/// skewness, excess kurtosis) innermost.
pub fn rf_dna_features(samples: &[Complex32], regions: usize) -> Result<Vec<f64>> {
    if regions == 0 {
        return Err(KernelError::InvalidParameter {
            name: "regions",
            reason: "must be nonzero".into(),
        });
    }
    let per_region = samples.len() / regions;
    if per_region == 0 {
        return Err(KernelError::BlockTooShort {
            min: regions,
            got: samples.len(),
        });
    }

    let amplitude: Vec<f64> = samples.iter().map(|s| s.norm() as f64).collect();
    let phase: Vec<f64> = samples.iter().map(|s| s.arg() as f64).collect();
    let inst_freq = instantaneous_frequency(&phase);

    let domains = [&amplitude, &phase, &inst_freq];
    let truncated_len = regions * per_region;

    let mut features = Vec::with_capacity(9 * regions);
    for domain in domains {
        let truncated = &domain[..truncated_len];
        for region in 0..regions {
            let start = region * per_region;
            let slice = &truncated[start..start + per_region];
            let (variance, skewness, kurtosis) = region_statistics(slice);
            features.push(variance);
            features.push(skewness);
            features.push(kurtosis);
        }
    }

    Ok(features)
}

/// First difference of the unwrapped phase, with the last sample repeated
/// so the result has the same length as the input.
fn instantaneous_frequency(phase: &[f64]) -> Vec<f64> {
    if phase.is_empty() {
        return Vec::new();
    }
    let mut unwrapped = Vec::with_capacity(phase.len());
    unwrapped.push(phase[0]);
    for i in 1..phase.len() {
        let mut delta = phase[i] - phase[i - 1];
        while delta > std::f64::consts::PI {
            delta -= 2.0 * std::f64::consts::PI;
        }
        while delta < -std::f64::consts::PI {
            delta += 2.0 * std::f64::consts::PI;
        }
        unwrapped.push(unwrapped[i - 1] + delta);
    }
    let mut freq: Vec<f64> = unwrapped.windows(2).map(|w| w[1] - w[0]).collect();
    freq.push(*freq.last().unwrap_or(&0.0));
    freq
}

/// Population variance, standardized skewness, and excess kurtosis of a
/// single region. Constant regions (`variance` ~ 0) report zero for the
/// higher moments rather than dividing by zero.
fn region_statistics(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 < 1e-18 {
        return (m2, 0.0, 0.0);
    }
    let std_dev = m2.sqrt();
    let skewness = m3 / std_dev.powi(3);
    let kurtosis = m4 / (m2 * m2) - 3.0;
    (m2, skewness, kurtosis)
}
