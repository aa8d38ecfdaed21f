use std::sync::atomic::{AtomicUsize, Ordering};

/// Opaque handle to one of the pool's `N` streams (SPEC_FULL.md §3
/// "Stream handle"). On the CPU backend a stream has no independent
/// execution context; the handle exists so kernel code is written against
/// the same "acquire a stream, do work, let it go" shape a GPU backend
/// would require, and so the round-robin index is exercised identically
/// regardless of which backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle(pub usize);

/// Round-robin pool of `N` stream handles, handed out under a lock
/// (SPEC_FULL.md §4.1 "Stream pool"). `next()` is the only mutable
/// operation; synchronization is a no-op on the CPU backend since there is
/// no asynchronous device queue to wait on, but the method exists so
/// callers don't need to special-case the backend kind.
pub struct StreamPool {
    count: usize,
    cursor: AtomicUsize,
}

impl StreamPool {
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "stream pool must have at least one stream");
        Self {
            count,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Borrow the next stream in round-robin order.
    pub fn next(&self) -> StreamHandle {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.count;
        StreamHandle(idx)
    }

    /// Wait for every stream to finish outstanding work. A no-op on the
    /// CPU backend, kept so kernel code reads the same way a GPU backend
    /// would require it.
    pub fn synchronize_all(&self) {}
}
