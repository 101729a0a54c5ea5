use crate::error::{Result, TileError};
use crate::geometry::TileGeometry;
use crate::view::MatrixMut;

/// Scale the in-bounds part of output tile `(mm, nn)` of C by `beta`.
///
/// Called once per output tile, before its partials are folded in.
pub fn scale_region(c: &mut MatrixMut<'_>, geom: &TileGeometry, mm: usize, nn: usize, beta: f64) {
    let tile = geom.tile();
    let (rows, cols) = (geom.rows_in(mm), geom.cols_in(nn));
    let col0 = nn * tile;

    for x in 0..rows {
        for v in &mut c.row_mut(mm * tile + x)[col0..col0 + cols] {
            *v *= beta;
        }
    }
}

/// Fold the `k_tiles` partial product tiles returned for output tile
/// `(mm, nn)` into C as `C += alpha * partial`, in increasing `kk` order.
///
/// Padded rows and columns of each partial tile are never written back.
pub fn accumulate_partials(
    c: &mut MatrixMut<'_>,
    geom: &TileGeometry,
    mm: usize,
    nn: usize,
    alpha: f64,
    partials: &[f64],
) -> Result<()> {
    if partials.len() < geom.block_len() {
        return Err(TileError::BufferTooSmall {
            needed: geom.block_len(),
            got: partials.len(),
        });
    }

    let tile = geom.tile();
    let (rows, cols) = (geom.rows_in(mm), geom.cols_in(nn));
    let col0 = nn * tile;

    for partial in partials[..geom.block_len()].chunks_exact(geom.tile_len()) {
        for x in 0..rows {
            let src = &partial[x * tile..x * tile + cols];
            let dst = &mut c.row_mut(mm * tile + x)[col0..col0 + cols];
            for (d, &p) in dst.iter_mut().zip(src) {
                *d += alpha * p;
            }
        }
    }
    Ok(())
}
