use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rf_backend::Backend;

const POLL_SLICE: Duration = Duration::from_millis(500);

/// Spawn the periodic memory-pressure cleanup thread (SPEC_FULL.md §4.7,
/// grounded on the original's `_periodic_cleanup`): every
/// `interval_secs`, if the backend's memory utilization exceeds
/// `threshold`, release pooled memory. Polls `shutdown` in small slices so
/// it exits promptly rather than sleeping through a long interval.
pub fn spawn(
    backend: Arc<dyn Backend>,
    interval_secs: u64,
    threshold: f64,
    shutdown: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let interval = Duration::from_secs(interval_secs.max(1));
        let mut elapsed = Duration::ZERO;
        while !shutdown.load(Ordering::Relaxed) {
            std::thread::sleep(POLL_SLICE);
            elapsed += POLL_SLICE;
            if elapsed < interval {
                continue;
            }
            elapsed = Duration::ZERO;
            if backend.memory_utilization() > threshold {
                tracing::info!(
                    utilization = backend.memory_utilization(),
                    threshold,
                    "memory cleanup triggered"
                );
                backend.cleanup();
            }
        }
    })
}
