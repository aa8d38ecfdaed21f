//! Numeric backend abstraction (C1): one `Backend` trait, uploaded/downloaded
//! host arrays, an FFT engine, a window cache, a stream pool, and a memory
//! pool. Kernels in `rf-kernels` and `rf-estimators` are written once
//! against [`Backend`] and never special-case the concrete implementation.

pub mod backend;
pub mod error;
pub mod fft;
pub mod memory;
pub mod stream;
pub mod window;

pub use backend::{Backend, CpuBackend};
pub use error::{BackendError, Result};
pub use fft::{fft_shift, fftfreq, FftEngine};
pub use memory::MemoryPool;
pub use stream::{StreamHandle, StreamPool};
pub use window::{window_power, WindowCache, WindowKind};
