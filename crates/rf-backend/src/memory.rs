use std::sync::atomic::{AtomicUsize, Ordering};

/// Default simulated pool capacity: 512 MiB. There is no physical device
/// pool on the CPU backend; this bounds the utilization ratio that the
/// service's periodic cleanup task (SPEC_FULL.md §4.5) and the `memory`
/// command check against.
pub const DEFAULT_CAPACITY_BYTES: usize = 512 * 1024 * 1024;

/// Utilization threshold above which the periodic cleanup task invokes
/// [`MemoryPool::cleanup`] (SPEC_FULL.md §4.1, §4.5).
pub const DEFAULT_CLEANUP_THRESHOLD: f64 = 0.8;

/// Tracks simulated device/pinned-host allocation pressure.
///
/// Kernels report their working-set size for the lifetime of a request via
/// [`MemoryPool::track`], which returns an RAII guard that releases the
/// tracked bytes on drop — mirroring "memory-pool allocations live within
/// one request" (SPEC_FULL.md §3).
pub struct MemoryPool {
    capacity_bytes: usize,
    used_bytes: AtomicUsize,
}

impl MemoryPool {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            used_bytes: AtomicUsize::new(0),
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Relaxed)
    }

    pub fn utilization(&self) -> f64 {
        self.used_bytes() as f64 / self.capacity_bytes.max(1) as f64
    }

    /// Record `bytes` as allocated for the duration of the returned guard.
    pub fn track(&self, bytes: usize) -> PoolGuard<'_> {
        self.used_bytes.fetch_add(bytes, Ordering::Relaxed);
        PoolGuard { pool: self, bytes }
    }

    /// Release every tracked allocation. Called directly by the `cleanup`
    /// command and by the periodic background task once utilization
    /// crosses [`DEFAULT_CLEANUP_THRESHOLD`].
    pub fn cleanup(&self) {
        self.used_bytes.store(0, Ordering::Relaxed);
    }
}

pub struct PoolGuard<'a> {
    pool: &'a MemoryPool,
    bytes: usize,
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        // Saturating: an intervening `cleanup()` may have already zeroed
        // the counter, so a plain `fetch_sub` could underflow.
        let _ = self
            .pool
            .used_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_sub(self.bytes))
            });
    }
}
