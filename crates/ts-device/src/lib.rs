//! `ts-device` - Streaming accelerator interface for tilestream.
//!
//! This crate provides:
//! - `ActionSet`, the queued run length and stream transfers for one dispatch
//! - `RunHandle` and `Completion` for non-blocking runs
//! - The `Accelerator` trait the host scheduler drives
//! - `BuildDescription` / `DeviceConfig` read from the accelerator build header
//! - `SimAccelerator`, a software model of the tile-multiply device

pub mod accelerator;
pub mod actions;
pub mod config;
pub mod description;
pub mod error;
pub mod sim;
pub mod stream;

pub use accelerator::Accelerator;
pub use actions::{ActionSet, Completion, RunHandle};
pub use config::DeviceConfig;
pub use description::BuildDescription;
pub use error::{DeviceError, Result};
pub use sim::SimAccelerator;
pub use stream::Stream;
