use thiserror::Error;

use ts_device::{DeviceError, Stream};
use ts_tile::TileError;

#[derive(Error, Debug)]
pub enum GemmError {
    #[error("{dim}={requested} exceeds the session limit of {limit}")]
    ExceedsLimits {
        dim: &'static str,
        requested: usize,
        limit: usize,
    },
    #[error("scratch buffers for limits m={m_max} n={n_max} k={k_max} overflow usize")]
    ScratchTooLarge {
        m_max: usize,
        n_max: usize,
        k_max: usize,
    },
    #[error("session is unusable after an aborted multiplication; reopen it")]
    Poisoned,
    #[error("matrix error: {0}")]
    Tile(#[from] TileError),
    #[error("accelerator error: {0}")]
    Device(#[from] DeviceError),
    #[error("output slot {0} already has a run in flight")]
    SlotBusy(usize),
    #[error("output slot {0} has no run to wait on")]
    SlotIdle(usize),
    #[error("run completed without data on stream {0}")]
    MissingOutput(Stream),
}

impl GemmError {
    /// True for errors raised by the accelerator during dispatch or wait.
    pub fn is_device(&self) -> bool {
        matches!(self, GemmError::Device(_))
    }
}

pub type Result<T> = std::result::Result<T, GemmError>;
