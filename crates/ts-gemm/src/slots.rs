use ts_device::{Accelerator, ActionSet, RunHandle, Stream};

use crate::error::{GemmError, Result};

/// Number of output runs kept in flight.
pub const PIPELINE_DEPTH: usize = 2;

#[derive(Debug, Default)]
struct Slot {
    /// Result buffer. Empty while moved into an in-flight run.
    buffer: Vec<f64>,
    run: Option<RunHandle>,
}

/// The ping/pong output buffers, each paired with at most one in-flight run.
///
/// A slot's buffer is moved into the run at dispatch and only comes back
/// from the paired wait, so it cannot be read or refilled in between.
#[derive(Debug, Default)]
pub struct OutputSlots {
    slots: [Slot; PIPELINE_DEPTH],
}

impl OutputSlots {
    /// Create slots whose buffers can hold `len` elements without reallocating.
    pub fn with_capacity(len: usize) -> Self {
        let mut slots = OutputSlots::default();
        for slot in &mut slots.slots {
            slot.buffer = Vec::with_capacity(len);
        }
        slots
    }

    /// Start a non-blocking run that fills slot `sel` with the next `len`
    /// elements of stream C.
    pub fn dispatch<D: Accelerator>(&mut self, sel: usize, device: &mut D, len: usize) -> Result<()> {
        let slot = &mut self.slots[sel];
        if slot.run.is_some() {
            return Err(GemmError::SlotBusy(sel));
        }

        let mut buffer = std::mem::take(&mut slot.buffer);
        buffer.clear();
        buffer.resize(len, 0.0);

        let mut actions = ActionSet::new();
        actions.enqueue_output(Stream::C, buffer)?;
        actions.sync_stream(Stream::C);

        let run = device.dispatch_nonblocking(actions)?;
        log::trace!("slot {}: dispatched run {}", sel, run.run());
        slot.run = Some(run);
        Ok(())
    }

    /// Wait on slot `sel`'s run and return its filled buffer.
    pub fn wait<D: Accelerator>(&mut self, sel: usize, device: &mut D) -> Result<&[f64]> {
        let slot = &mut self.slots[sel];
        let run = slot.run.take().ok_or(GemmError::SlotIdle(sel))?;
        log::trace!("slot {}: waiting on run {}", sel, run.run());

        let mut done = device.wait(run)?;
        slot.buffer = done
            .take_output(Stream::C)
            .ok_or(GemmError::MissingOutput(Stream::C))?;
        Ok(&slot.buffer)
    }

    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.run.is_some()).count()
    }

    /// Wait on every run still in flight, discarding the results.
    ///
    /// Used after an aborted multiplication so no handle is left unwaited.
    pub fn drain<D: Accelerator>(&mut self, device: &mut D) {
        for (sel, slot) in self.slots.iter_mut().enumerate() {
            if let Some(run) = slot.run.take() {
                match device.wait(run) {
                    Ok(mut done) => {
                        if let Some(buffer) = done.take_output(Stream::C) {
                            slot.buffer = buffer;
                        }
                    }
                    Err(e) => log::warn!("slot {}: draining in-flight run failed: {}", sel, e),
                }
            }
        }
    }
}
