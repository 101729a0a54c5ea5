use ts_device::Accelerator;
use ts_tile::{pack_a, pack_b, scale_region, size_in_tiles, MatrixMut, MatrixRef, TileGeometry};

use crate::error::{GemmError, Result};
use crate::estimate::Estimate;
use crate::scheduler;
use crate::slots::OutputSlots;

/// Largest problem a session accepts. Scratch buffers are sized from these
/// at open time and never grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub m_max: usize,
    pub n_max: usize,
    pub k_max: usize,
}

impl Limits {
    pub fn new(m_max: usize, n_max: usize, k_max: usize) -> Self {
        Limits { m_max, n_max, k_max }
    }

    /// Reject a problem that does not fit.
    pub fn check(&self, m: usize, n: usize, k: usize) -> Result<()> {
        for (dim, requested, limit) in [("m", m, self.m_max), ("n", n, self.n_max), ("k", k, self.k_max)] {
            if requested > limit {
                return Err(GemmError::ExceedsLimits {
                    dim,
                    requested,
                    limit,
                });
            }
        }
        Ok(())
    }
}

/// An open accelerator plus the scratch buffers one multiplication needs.
///
/// Lifecycle: `Session::open`, any number of `multiply` calls, `close`.
#[derive(Debug)]
pub struct Session<D: Accelerator> {
    device: D,
    limits: Limits,
    a_tiles: Vec<f64>,
    b_tiles: Vec<f64>,
    slots: OutputSlots,
    /// Set once a multiplication aborts mid-pipeline. The device may still
    /// hold result tiles nobody claimed, so later calls would read them.
    poisoned: bool,
}

impl<D: Accelerator> Session<D> {
    /// Open a session on `device` for problems up to `limits`.
    pub fn open(device: D, limits: Limits) -> Result<Self> {
        let tile = device.config().tile_size;
        let tile_len = device.config().tile_len();
        let m_tiles = size_in_tiles(limits.m_max, tile);
        let n_tiles = size_in_tiles(limits.n_max, tile);
        let k_tiles = size_in_tiles(limits.k_max, tile);

        let too_large = GemmError::ScratchTooLarge {
            m_max: limits.m_max,
            n_max: limits.n_max,
            k_max: limits.k_max,
        };
        let Some(block_len) = k_tiles.checked_mul(tile_len) else {
            return Err(too_large);
        };
        let a_len = m_tiles.checked_mul(block_len);
        let b_len = n_tiles.checked_mul(block_len);
        let (Some(a_len), Some(b_len)) = (a_len, b_len) else {
            return Err(too_large);
        };
        if a_len.max(b_len) > isize::MAX as usize / std::mem::size_of::<f64>() {
            return Err(too_large);
        }

        log::debug!(
            "opening session on '{}': T={}, limits m={} n={} k={}",
            device.name(),
            tile,
            limits.m_max,
            limits.n_max,
            limits.k_max
        );

        Ok(Session {
            device,
            limits,
            a_tiles: vec![0.0; a_len],
            b_tiles: vec![0.0; b_len],
            slots: OutputSlots::with_capacity(block_len),
            poisoned: false,
        })
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn tile_size(&self) -> usize {
        self.device.config().tile_size
    }

    /// True once a multiplication has failed after reaching the device.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// `C = alpha * A @ B + beta * C` on the accelerator.
    ///
    /// A is `[m x k]`, B is `[k x n]`, C is `[m x n]`, each with its own
    /// leading dimension. Only the in-bounds elements of C are written.
    ///
    /// # Errors
    /// Shape and limit errors are reported before any buffer is touched and
    /// leave the session usable. An accelerator failure aborts the call; C
    /// may then hold a mix of finished and untouched tiles, and every later
    /// call fails with `GemmError::Poisoned` until the session is reopened.
    pub fn multiply(
        &mut self,
        alpha: f64,
        a: MatrixRef<'_>,
        b: MatrixRef<'_>,
        beta: f64,
        mut c: MatrixMut<'_>,
    ) -> Result<()> {
        if self.poisoned {
            return Err(GemmError::Poisoned);
        }
        let (m, n, k) = ts_tile::gemm_dims(&a, &b, &c.view())?;
        self.limits.check(m, n, k)?;
        let geom = TileGeometry::new(self.tile_size(), m, n, k)?;

        if m == 0 || n == 0 {
            return Ok(());
        }
        if k == 0 {
            // Nothing to stream: C = beta * C.
            for (mm, nn) in geom.output_order() {
                scale_region(&mut c, &geom, mm, nn, beta);
            }
            return Ok(());
        }

        log::debug!(
            "multiply m={} n={} k={}: {}x{}x{} tiles, {} ticks",
            m,
            n,
            k,
            geom.m_tiles(),
            geom.n_tiles(),
            geom.k_tiles(),
            geom.ticks()
        );

        let a_tiles = &mut self.a_tiles[..geom.a_len()];
        let b_tiles = &mut self.b_tiles[..geom.b_len()];
        pack_a(&a, &geom, a_tiles)?;
        pack_b(&b, &geom, b_tiles)?;

        let result = scheduler::execute(
            &mut self.device,
            &geom,
            a_tiles,
            b_tiles,
            &mut self.slots,
            alpha,
            beta,
            &mut c,
        );
        if let Err(e) = &result {
            log::warn!("multiply aborted, session poisoned: {}", e);
            self.slots.drain(&mut self.device);
            self.poisoned = true;
        }
        result
    }

    /// Throughput estimate for an `(m, n, k)` problem on this device.
    pub fn estimate(&self, m: usize, n: usize, k: usize) -> Result<Estimate> {
        let geom = TileGeometry::new(self.tile_size(), m, n, k)?;
        Ok(Estimate::new(&geom, self.device.config()))
    }

    /// Close the session and hand back the device.
    pub fn close(mut self) -> D {
        self.slots.drain(&mut self.device);
        log::debug!("closing session on '{}'", self.device.name());
        self.device
    }
}
