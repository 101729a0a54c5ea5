// Software model of the tile-multiply engine.
//
// The kernel runs for a declared number of ticks. Every `T*T` ticks it pops
// one T x T tile from stream A and one from stream B and emits their
// product on stream C. It knows nothing about the shape of the original
// matrices. Conditions that would hang or corrupt a real engine are reported
// as errors instead.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::accelerator::Accelerator;
use crate::actions::{ActionSet, Completion, RunHandle};
use crate::config::DeviceConfig;
use crate::description::BuildDescription;
use crate::error::{DeviceError, Result};
use crate::stream::Stream;

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Counters kept by the simulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimStats {
    /// Dispatch calls of either kind, including failed ones.
    pub dispatches: u64,
    /// Wait calls, including failed ones.
    pub waits: u64,
    /// Kernel ticks executed.
    pub ticks: u64,
    /// Tile products computed.
    pub tiles: u64,
}

#[derive(Debug)]
struct PendingRun {
    run: u64,
    outputs: Vec<(Stream, Vec<f64>)>,
}

impl PendingRun {
    fn demand(&self) -> usize {
        self.outputs.iter().map(|(_, buf)| buf.len()).sum()
    }
}

/// In-process simulator implementing `Accelerator`.
#[derive(Debug)]
pub struct SimAccelerator {
    id: u64,
    config: DeviceConfig,
    /// Stream C elements produced by the kernel and not yet claimed.
    produced: VecDeque<f64>,
    /// Non-blocking runs in dispatch order, waiting for output data.
    pending: VecDeque<PendingRun>,
    /// Runs whose outputs are filled but which have not been waited on.
    completed: HashMap<u64, Completion>,
    next_run: u64,
    fail_dispatch_at: Option<u64>,
    fail_wait_at: Option<u64>,
    stats: SimStats,
}

impl SimAccelerator {
    /// Create a simulator of the default engine build.
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    pub fn with_config(config: DeviceConfig) -> Self {
        SimAccelerator {
            id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            produced: VecDeque::new(),
            pending: VecDeque::new(),
            completed: HashMap::new(),
            next_run: 0,
            fail_dispatch_at: None,
            fail_wait_at: None,
            stats: SimStats::default(),
        }
    }

    /// Create a simulator from build constants named `<prefix>_<key>`.
    pub fn from_build(desc: &BuildDescription, prefix: &str) -> Result<Self> {
        Ok(Self::with_config(DeviceConfig::from_build(desc, prefix)?))
    }

    /// Make the `n`-th dispatch (1-based, counting from now) fail.
    pub fn fail_dispatch_at(&mut self, n: u64) {
        self.fail_dispatch_at = Some(self.stats.dispatches + n);
    }

    /// Make the `n`-th wait (1-based, counting from now) fail.
    pub fn fail_wait_at(&mut self, n: u64) {
        self.fail_wait_at = Some(self.stats.waits + n);
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// Runs dispatched but not yet waited on.
    pub fn outstanding_runs(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    /// Stream C elements produced but not yet delivered to any run.
    pub fn buffered_output(&self) -> usize {
        self.produced.len()
    }

    fn count_dispatch(&mut self) -> Result<()> {
        self.stats.dispatches += 1;
        if self.fail_dispatch_at == Some(self.stats.dispatches) {
            return Err(DeviceError::Fault(format!(
                "injected failure on dispatch {}",
                self.stats.dispatches
            )));
        }
        Ok(())
    }

    fn check_alignment(&self, actions: &ActionSet<'_>) -> Result<()> {
        let alignment = self.config.stream_alignment;
        let inputs = actions.inputs().iter().map(|(s, data)| (*s, data.len()));
        let outputs = actions.outputs().iter().map(|(s, buf)| (*s, buf.len()));
        for (stream, len) in inputs.chain(outputs) {
            let bytes = len * std::mem::size_of::<f64>();
            if bytes % alignment != 0 {
                return Err(DeviceError::MisalignedTransfer {
                    stream,
                    bytes,
                    alignment,
                });
            }
        }
        Ok(())
    }

    /// Number of stream C elements the kernel will emit for `actions`.
    fn planned_output(&self, actions: &ActionSet<'_>) -> Result<usize> {
        let Some(ticks) = actions.run_length() else {
            if actions.inputs().is_empty() {
                return Ok(0);
            }
            return Err(DeviceError::MissingRunLength);
        };
        let tile_len = self.config.tile_len();
        if ticks % tile_len as u64 != 0 {
            return Err(DeviceError::RaggedRunLength { ticks, tile_len });
        }
        usize::try_from(ticks).map_err(|_| DeviceError::Fault(format!("run length {ticks} too large")))
    }

    /// Run the kernel over the queued inputs, appending products to stream C.
    fn execute(&mut self, actions: &ActionSet<'_>, output_len: usize) -> Result<()> {
        let tile_len = self.config.tile_len();
        let a = gather(actions, Stream::A);
        let b = gather(actions, Stream::B);

        for (stream, data) in [(Stream::A, &a), (Stream::B, &b)] {
            if data.len() < output_len {
                return Err(DeviceError::StreamStarved {
                    stream,
                    needed: output_len,
                    available: data.len(),
                });
            }
            if data.len() > output_len {
                return Err(DeviceError::UnconsumedInput {
                    stream,
                    remaining: data.len() - output_len,
                });
            }
        }

        let t = self.config.tile_size;
        let mut product = vec![0.0; tile_len];
        for (a_tile, b_tile) in a.chunks_exact(tile_len).zip(b.chunks_exact(tile_len)) {
            multiply_tile(a_tile, b_tile, t, &mut product);
            self.produced.extend(product.iter().copied());
            self.stats.tiles += 1;
        }
        self.stats.ticks += output_len as u64;
        Ok(())
    }

    /// Deliver produced data to the oldest pending run.
    fn fulfil_front(&mut self) -> Result<()> {
        let Some(mut front) = self.pending.pop_front() else {
            return Ok(());
        };
        let available = self.produced.len();
        if front.demand() > available {
            let stream = front.outputs.first().map(|(s, _)| *s).unwrap_or(Stream::C);
            return Err(DeviceError::OutputUnderflow {
                stream,
                requested: front.demand(),
                available,
            });
        }
        for (_, buf) in front.outputs.iter_mut() {
            fill_from(&mut self.produced, buf);
        }
        log::trace!("sim {}: run {} filled", self.id, front.run);
        self.completed.insert(front.run, Completion::new(front.outputs));
        Ok(())
    }

    /// Drop every trace of `run` after a failure.
    fn forget_run(&mut self, run: u64) {
        self.pending.retain(|p| p.run != run);
        self.completed.remove(&run);
    }
}

impl Default for SimAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerator for SimAccelerator {
    fn name(&self) -> &str {
        "sim"
    }

    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn dispatch_blocking(&mut self, mut actions: ActionSet<'_>) -> Result<Completion> {
        self.count_dispatch()?;
        self.check_alignment(&actions)?;
        let output_len = self.planned_output(&actions)?;

        // A synchronized input keeps the call blocked until the kernel has
        // finished, which needs somewhere for every produced tile to go.
        let own_demand: usize = actions.outputs().iter().map(|(_, buf)| buf.len()).sum();
        let pending_demand: usize = self.pending.iter().map(PendingRun::demand).sum();
        let capacity = (own_demand + pending_demand).saturating_sub(self.produced.len());
        if output_len > capacity {
            for stream in [Stream::A, Stream::B] {
                let queued = actions.inputs().iter().any(|(s, _)| *s == stream);
                if queued && actions.is_synced(stream) {
                    return Err(DeviceError::Stalled { stream });
                }
            }
        }

        self.execute(&actions, output_len)?;

        while let Some(front) = self.pending.front() {
            if front.demand() > self.produced.len() {
                break;
            }
            self.fulfil_front()?;
        }

        let mut outputs = actions.take_outputs();
        for (stream, buf) in outputs.iter_mut() {
            if buf.len() > self.produced.len() {
                return Err(DeviceError::OutputUnderflow {
                    stream: *stream,
                    requested: buf.len(),
                    available: self.produced.len(),
                });
            }
            fill_from(&mut self.produced, buf);
        }

        log::trace!("sim {}: blocking run of {} ticks done", self.id, output_len);
        Ok(Completion::new(outputs))
    }

    fn dispatch_nonblocking(&mut self, mut actions: ActionSet<'static>) -> Result<RunHandle> {
        self.count_dispatch()?;
        self.check_alignment(&actions)?;
        for (stream, _) in actions.outputs() {
            if !actions.is_synced(*stream) {
                return Err(DeviceError::UnsyncedOutput { stream: *stream });
            }
        }
        let output_len = self.planned_output(&actions)?;
        self.execute(&actions, output_len)?;

        let run = self.next_run;
        self.next_run += 1;
        self.pending.push_back(PendingRun {
            run,
            outputs: actions.take_outputs(),
        });
        log::trace!("sim {}: run {} dispatched", self.id, run);
        Ok(RunHandle::new(self.id, run))
    }

    fn wait(&mut self, handle: RunHandle) -> Result<Completion> {
        if handle.device() != self.id {
            // The handle is dropped here, so its run on the issuing device
            // can no longer be waited. The drop is logged.
            return Err(DeviceError::ForeignHandle { run: handle.run() });
        }
        let (_, run) = handle.release();

        self.stats.waits += 1;
        if self.fail_wait_at == Some(self.stats.waits) {
            self.forget_run(run);
            return Err(DeviceError::Fault(format!("injected failure waiting on run {run}")));
        }

        if !self.completed.contains_key(&run) && !self.pending.iter().any(|p| p.run == run) {
            return Err(DeviceError::UnknownRun(run));
        }

        // Output runs complete strictly in dispatch order.
        while !self.completed.contains_key(&run) {
            if let Err(e) = self.fulfil_front() {
                self.forget_run(run);
                return Err(e);
            }
        }

        self.completed.remove(&run).ok_or(DeviceError::UnknownRun(run))
    }
}

/// Concatenate every block queued on `stream`, in queue order.
fn gather(actions: &ActionSet<'_>, stream: Stream) -> Vec<f64> {
    actions
        .inputs()
        .iter()
        .filter(|(s, _)| *s == stream)
        .flat_map(|(_, data)| data.iter().copied())
        .collect()
}

fn fill_from(source: &mut VecDeque<f64>, buf: &mut [f64]) {
    let n = buf.len();
    for (dst, src) in buf.iter_mut().zip(source.drain(..n)) {
        *dst = src;
    }
}

/// `out = a @ b` for row-major `t x t` tiles.
fn multiply_tile(a: &[f64], b: &[f64], t: usize, out: &mut [f64]) {
    for x in 0..t {
        for y in 0..t {
            let mut sum = 0.0;
            for z in 0..t {
                sum += a[x * t + z] * b[z * t + y];
            }
            out[x * t + y] = sum;
        }
    }
}
