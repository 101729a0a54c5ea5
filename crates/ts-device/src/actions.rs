use crate::error::{DeviceError, Result};
use crate::stream::Stream;

/// Work queued for one dispatch: an optional kernel run length plus ordered
/// stream transfers.
///
/// Input transfers borrow host memory for the lifetime `'a`, so a blocking
/// dispatch can stream straight out of the caller's buffers. Output buffers
/// are moved in and handed back by the device once the run completes, which
/// keeps them out of reach while a transfer may still be landing.
///
/// Input streams are synchronized by default and output streams are not,
/// matching the engine runtime.
#[derive(Debug, Default)]
pub struct ActionSet<'a> {
    run_length: Option<u64>,
    inputs: Vec<(Stream, &'a [f64])>,
    outputs: Vec<(Stream, Vec<f64>)>,
    sync_overrides: Vec<(Stream, bool)>,
}

impl<'a> ActionSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the number of compute cycles the kernel runs for.
    pub fn declare_run_length(&mut self, cycles: u64) {
        self.run_length = Some(cycles);
    }

    /// Append a block to an input stream. Call order is delivery order.
    pub fn enqueue_input(&mut self, stream: Stream, data: &'a [f64]) -> Result<()> {
        if !stream.is_input() {
            return Err(DeviceError::WrongDirection {
                stream,
                expected: "input",
            });
        }
        self.inputs.push((stream, data));
        Ok(())
    }

    /// Register `buffer` to receive the next `buffer.len()` elements emitted
    /// on an output stream.
    pub fn enqueue_output(&mut self, stream: Stream, buffer: Vec<f64>) -> Result<()> {
        if stream.is_input() {
            return Err(DeviceError::WrongDirection {
                stream,
                expected: "output",
            });
        }
        self.outputs.push((stream, buffer));
        Ok(())
    }

    /// Let the run report completion without waiting for `stream` to drain.
    pub fn disable_stream_sync(&mut self, stream: Stream) {
        self.set_sync(stream, false);
    }

    /// Make the run wait for `stream` to drain before it completes.
    pub fn sync_stream(&mut self, stream: Stream) {
        self.set_sync(stream, true);
    }

    fn set_sync(&mut self, stream: Stream, synced: bool) {
        self.sync_overrides.retain(|(s, _)| *s != stream);
        self.sync_overrides.push((stream, synced));
    }

    /// Whether completion of the run waits on `stream`.
    pub fn is_synced(&self, stream: Stream) -> bool {
        self.sync_overrides
            .iter()
            .find(|(s, _)| *s == stream)
            .map(|(_, synced)| *synced)
            .unwrap_or(stream.is_input())
    }

    pub fn run_length(&self) -> Option<u64> {
        self.run_length
    }

    pub fn inputs(&self) -> &[(Stream, &'a [f64])] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[(Stream, Vec<f64>)] {
        &self.outputs
    }

    /// Split off the queued output buffers, leaving none behind.
    pub fn take_outputs(&mut self) -> Vec<(Stream, Vec<f64>)> {
        std::mem::take(&mut self.outputs)
    }

    /// Drop everything queued so far.
    pub fn clear(&mut self) {
        self.run_length = None;
        self.inputs.clear();
        self.outputs.clear();
        self.sync_overrides.clear();
    }
}

/// Token for one non-blocking run.
///
/// A handle is consumed by `Accelerator::wait`; it cannot be cloned, so it
/// can be waited on at most once. Dropping a handle without waiting leaks
/// the device-side run and is logged.
#[derive(Debug)]
#[must_use = "every run handle must be waited on exactly once"]
pub struct RunHandle {
    device: u64,
    run: u64,
}

impl RunHandle {
    /// Create a handle. Called by `Accelerator` implementations at dispatch.
    pub fn new(device: u64, run: u64) -> Self {
        RunHandle { device, run }
    }

    /// Identifier of the device that issued this handle.
    pub fn device(&self) -> u64 {
        self.device
    }

    /// Run identifier, unique per device.
    pub fn run(&self) -> u64 {
        self.run
    }

    /// Consume the handle, returning `(device, run)`. Called by
    /// `Accelerator` implementations at wait.
    pub fn release(self) -> (u64, u64) {
        let ids = (self.device, self.run);
        std::mem::forget(self);
        ids
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        log::warn!(
            "run {} on device {} dropped without a wait; its resources leak",
            self.run,
            self.device
        );
    }
}

/// Output buffers handed back by a finished run.
#[derive(Debug, Default)]
pub struct Completion {
    outputs: Vec<(Stream, Vec<f64>)>,
}

impl Completion {
    pub fn new(outputs: Vec<(Stream, Vec<f64>)>) -> Self {
        Completion { outputs }
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Take the first buffer filled from `stream`.
    pub fn take_output(&mut self, stream: Stream) -> Option<Vec<f64>> {
        let idx = self.outputs.iter().position(|(s, _)| *s == stream)?;
        Some(self.outputs.remove(idx).1)
    }
}
