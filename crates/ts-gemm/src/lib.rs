//! `ts-gemm` - Offload `C = alpha*A*B + beta*C` onto a streaming tile accelerator.
//!
//! A `Session` owns the accelerator and the scratch buffers sized at open
//! time. Each `multiply` packs A and B into tile streams, queues them in the
//! order the engine consumes them, and drains the result tiles through a
//! two-slot ping/pong pipeline into the caller's C.

pub mod backend;
pub mod error;
pub mod estimate;
pub mod plan;
pub mod scheduler;
pub mod session;
pub mod slots;
pub mod verify;

pub use backend::{CpuBackend, GemmBackend};
pub use error::{GemmError, Result};
pub use estimate::Estimate;
pub use session::{Limits, Session};
pub use verify::{compare, Mismatch};

pub use ts_device::{Accelerator, DeviceConfig, SimAccelerator};
pub use ts_tile::{MatrixMut, MatrixRef};
