use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Running counters for the service, grounded on the original's
/// `GPUServiceStats` (examples/original_source/server/python/gpu_service.py)
/// but lock-free on the hot path: every counter is an atomic, only the
/// "last request" timestamp needs a mutex.
pub struct ServiceStats {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_failed: AtomicU64,
    bytes_processed: AtomicU64,
    start_time: Instant,
    last_request_time: Mutex<Option<Instant>>,
}

impl Default for ServiceStats {
    fn default() -> Self {
        ServiceStats {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            start_time: Instant::now(),
            last_request_time: Mutex::new(None),
        }
    }
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one request. `success` reflects whether the
    /// response body carried an `"error"` key, not whether the command was
    /// recognized (see `dispatch::dispatch` for the full contract).
    pub fn record_request(&self, success: bool, bytes: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_processed.fetch_add(bytes as u64, Ordering::Relaxed);
        *self.last_request_time.lock().unwrap() = Some(Instant::now());
    }

    /// Snapshot as a JSON value matching the shape of the original's
    /// `to_dict()`.
    pub fn snapshot(&self) -> serde_json::Value {
        let uptime = self.start_time.elapsed().as_secs_f64();
        let total = self.requests_total.load(Ordering::Relaxed);
        let requests_per_second = if uptime > 0.0 {
            total as f64 / uptime
        } else {
            0.0
        };
        let last_request_ago = self
            .last_request_time
            .lock()
            .unwrap()
            .map(|t| t.elapsed().as_secs_f64());

        serde_json::json!({
            "requests_total": total,
            "requests_success": self.requests_success.load(Ordering::Relaxed),
            "requests_failed": self.requests_failed.load(Ordering::Relaxed),
            "bytes_processed": self.bytes_processed.load(Ordering::Relaxed),
            "uptime_seconds": uptime,
            "requests_per_second": requests_per_second,
            "last_request_ago": last_request_ago,
        })
    }
}
