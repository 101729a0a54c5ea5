use crate::error::{Result, TileError};

/// Number of `tile`-sized blocks needed to cover a dimension of `n` elements.
pub fn size_in_tiles(n: usize, tile: usize) -> usize {
    n.div_ceil(tile)
}

/// Tile counts and buffer sizes for one `C[m x n] = A[m x k] * B[k x n]` problem.
///
/// Every buffer length is in `f64` elements. A tile is `tile x tile`; the
/// last tile along each dimension is zero-padded past the true extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    tile: usize,
    m: usize,
    n: usize,
    k: usize,
}

impl TileGeometry {
    pub fn new(tile: usize, m: usize, n: usize, k: usize) -> Result<Self> {
        if tile == 0 {
            return Err(TileError::ZeroTileSize);
        }
        Ok(TileGeometry { tile, m, n, k })
    }

    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn m_tiles(&self) -> usize {
        size_in_tiles(self.m, self.tile)
    }

    pub fn n_tiles(&self) -> usize {
        size_in_tiles(self.n, self.tile)
    }

    pub fn k_tiles(&self) -> usize {
        size_in_tiles(self.k, self.tile)
    }

    /// Elements in one tile.
    pub fn tile_len(&self) -> usize {
        self.tile * self.tile
    }

    /// Number of output tiles in C.
    pub fn output_tiles(&self) -> usize {
        self.m_tiles() * self.n_tiles()
    }

    /// Compute cycles the accelerator runs for this problem: one cycle per
    /// element of every `(mm, nn, kk)` partial product tile.
    pub fn ticks(&self) -> u64 {
        (self.m_tiles() * self.n_tiles() * self.k_tiles() * self.tile_len()) as u64
    }

    /// Length of one contraction row of tiles: an A row-block, a B
    /// column-block, or the partials for one output tile.
    pub fn block_len(&self) -> usize {
        self.k_tiles() * self.tile_len()
    }

    /// Length of the packed A buffer.
    pub fn a_len(&self) -> usize {
        self.m_tiles() * self.block_len()
    }

    /// Length of the packed B buffer.
    pub fn b_len(&self) -> usize {
        self.n_tiles() * self.block_len()
    }

    /// Rows of C covered by row-tile `mm` (the last one may be short).
    pub fn rows_in(&self, mm: usize) -> usize {
        self.tile.min(self.m - mm * self.tile)
    }

    /// Columns of C covered by column-tile `nn` (the last one may be short).
    pub fn cols_in(&self, nn: usize) -> usize {
        self.tile.min(self.n - nn * self.tile)
    }

    /// Padded compute dimensions `(m, n, k)` as seen by the accelerator.
    pub fn padded_dims(&self) -> (usize, usize, usize) {
        (
            self.m_tiles() * self.tile,
            self.n_tiles() * self.tile,
            self.k_tiles() * self.tile,
        )
    }

    /// Output tiles `(mm, nn)` in row-major order over the C tile grid.
    pub fn output_order(&self) -> impl Iterator<Item = (usize, usize)> {
        let n_tiles = self.n_tiles();
        (0..self.m_tiles()).flat_map(move |mm| (0..n_tiles).map(move |nn| (mm, nn)))
    }
}
