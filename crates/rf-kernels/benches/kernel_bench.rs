use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_complex::Complex32;
use rf_backend::{CpuBackend, WindowKind};
use rf_kernels::{apply_matched_filter, fam_scf, psd_welch, MatchedFilterCache, PulseShape};

fn complex_tone(n: usize, freq_hz: f64, fs: f64) -> Vec<Complex32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * freq_hz * i as f64 / fs;
            Complex32::new(phase.cos() as f32, phase.sin() as f32)
        })
        .collect()
}

fn bench_psd_welch(c: &mut Criterion) {
    let backend = CpuBackend::default();
    let samples = complex_tone(16384, 250_000.0, 1_000_000.0);
    c.bench_function("psd_welch_16384x1024", |b| {
        b.iter(|| {
            psd_welch(
                &backend,
                black_box(&samples),
                1024,
                0.5,
                WindowKind::Hann,
                true,
            )
            .unwrap()
        })
    });
}

fn bench_fam_scf(c: &mut Criterion) {
    let backend = CpuBackend::default();
    let samples = complex_tone(8192, 50_000.0, 1_000_000.0);
    c.bench_function("fam_scf_8192x256", |b| {
        b.iter(|| {
            fam_scf(
                &backend,
                black_box(&samples),
                1_000_000.0,
                256,
                0.5,
                1.0,
                WindowKind::Hann,
            )
            .unwrap()
        })
    });
}

fn bench_matched_filter(c: &mut Criterion) {
    let backend = CpuBackend::default();
    let cache = MatchedFilterCache::new();
    let taps = cache
        .get(PulseShape::Rrc { rolloff: 0.35, sps: 8.0 }, 101)
        .unwrap();
    let samples = complex_tone(4096, 1000.0, 1_000_000.0);
    c.bench_function("matched_filter_4096x101", |b| {
        b.iter(|| apply_matched_filter(&backend, black_box(&samples), black_box(&taps)))
    });
}

criterion_group!(benches, bench_psd_welch, bench_fam_scf, bench_matched_filter);
criterion_main!(benches);
