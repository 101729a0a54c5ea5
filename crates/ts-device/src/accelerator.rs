use std::fmt::Debug;

use crate::actions::{ActionSet, Completion, RunHandle};
use crate::config::DeviceConfig;
use crate::error::Result;

/// A streaming tile-multiply engine the host scheduler can drive.
///
/// Work is described by an `ActionSet` (run length plus queued stream
/// transfers) and started with one of the dispatch calls. The engine has no
/// back-pressure or progress query: the only completion signal is `wait`.
pub trait Accelerator: Debug {
    /// Returns the name of this device (e.g., "sim").
    fn name(&self) -> &str;

    /// Static properties of the loaded engine build.
    fn config(&self) -> &DeviceConfig;

    /// Start the queued work and block until the device has accepted it.
    ///
    /// For a run with synchronized streams this also blocks until those
    /// streams have drained. Output buffers queued on the set are returned
    /// filled.
    fn dispatch_blocking(&mut self, actions: ActionSet<'_>) -> Result<Completion>;

    /// Start the queued work and return immediately.
    ///
    /// The returned handle must be passed to `wait` exactly once.
    fn dispatch_nonblocking(&mut self, actions: ActionSet<'static>) -> Result<RunHandle>;

    /// Block until the run behind `handle` has completed, release it, and
    /// hand back its output buffers.
    ///
    /// The handle is consumed even on error. Passing a handle issued by a
    /// different device fails with `ForeignHandle`, and the run it named
    /// can no longer be waited on the device that issued it.
    fn wait(&mut self, handle: RunHandle) -> Result<Completion>;
}
