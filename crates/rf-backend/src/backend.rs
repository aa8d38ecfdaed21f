use std::sync::Arc;

use num_complex::Complex32;

use crate::error::Result;
use crate::fft::FftEngine;
use crate::memory::{MemoryPool, DEFAULT_CAPACITY_BYTES};
use crate::stream::{StreamHandle, StreamPool};
use crate::window::{WindowCache, WindowKind};

/// Uniform numeric surface over GPU (preferred) and CPU execution
/// (SPEC_FULL.md §4.1). Kernels in `rf-kernels`/`rf-estimators` are written
/// against this trait and never branch on which implementation is active.
///
/// Only [`CpuBackend`] exists today (see DESIGN.md, "GPU backend" open
/// question); the trait boundary is what lets a future accelerator-backed
/// implementation slot in without touching kernel code.
pub trait Backend: Send + Sync {
    /// `true` if this backend executes on an accelerator.
    fn is_gpu(&self) -> bool;

    /// Cached window taps for `(kind, len)`.
    fn window(&self, kind: WindowKind, len: usize) -> Arc<Vec<f32>>;

    /// In-place forward FFT.
    fn fft_forward(&self, buf: &mut [Complex32]);

    /// In-place inverse FFT, normalized.
    fn fft_inverse(&self, buf: &mut [Complex32]);

    /// `same`-padding convolution of a complex signal against real taps.
    fn convolve_same(&self, signal: &[Complex32], taps: &[f32]) -> Vec<Complex32>;

    /// Borrow the next stream, round-robin.
    fn acquire_stream(&self) -> StreamHandle;

    /// Wait for all outstanding stream work.
    fn synchronize_all(&self);

    /// Fraction of the memory pool's capacity currently in use.
    fn memory_utilization(&self) -> f64;

    /// Bytes currently tracked as allocated.
    fn memory_used_bytes(&self) -> usize;

    /// Total simulated pool capacity in bytes.
    fn memory_capacity_bytes(&self) -> usize;

    /// Release all pooled memory and drop the window cache
    /// (SPEC_FULL.md §4.1 "Memory pool").
    fn cleanup(&self);
}

/// CPU implementation of [`Backend`]. Owns the FFT engine, window cache,
/// stream pool, and memory pool for the process lifetime.
pub struct CpuBackend {
    fft: FftEngine,
    windows: WindowCache,
    streams: StreamPool,
    memory: MemoryPool,
}

impl CpuBackend {
    pub fn new(num_streams: usize) -> Self {
        Self {
            fft: FftEngine::new(),
            windows: WindowCache::new(),
            streams: StreamPool::new(num_streams),
            memory: MemoryPool::new(DEFAULT_CAPACITY_BYTES),
        }
    }

    /// Look up a window by its wire-format name (SPEC_FULL.md §4.2.1: the
    /// `psd`/`fam` commands take a `window` string param).
    pub fn window_by_name(&self, name: &str, len: usize) -> Result<Arc<Vec<f32>>> {
        let kind = WindowKind::parse(name)?;
        Ok(self.window(kind, len))
    }

    /// Track `bytes` as allocated for the duration of the returned guard,
    /// used by kernels to make the memory pool's utilization reflect
    /// actual working-set size for the request.
    pub fn track_allocation(&self, bytes: usize) -> crate::memory::PoolGuard<'_> {
        self.memory.track(bytes)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Backend for CpuBackend {
    fn is_gpu(&self) -> bool {
        false
    }

    fn window(&self, kind: WindowKind, len: usize) -> Arc<Vec<f32>> {
        self.windows.get(kind, len)
    }

    fn fft_forward(&self, buf: &mut [Complex32]) {
        self.fft.forward(buf);
    }

    fn fft_inverse(&self, buf: &mut [Complex32]) {
        self.fft.inverse_normalized(buf);
    }

    fn convolve_same(&self, signal: &[Complex32], taps: &[f32]) -> Vec<Complex32> {
        self.fft.convolve_same(signal, taps)
    }

    fn acquire_stream(&self) -> StreamHandle {
        self.streams.next()
    }

    fn synchronize_all(&self) {
        self.streams.synchronize_all();
    }

    fn memory_utilization(&self) -> f64 {
        self.memory.utilization()
    }

    fn memory_used_bytes(&self) -> usize {
        self.memory.used_bytes()
    }

    fn memory_capacity_bytes(&self) -> usize {
        self.memory.capacity_bytes()
    }

    fn cleanup(&self) {
        self.memory.cleanup();
        self.windows.clear();
    }
}
