// Packing of row-major operands into the accelerator's tile streams.
//
// A is laid out row-tile major: tile (mm, kk) for kk in 0..k_tiles, then the
// next mm. B is laid out column-tile major: tile (kk, nn) for kk in
// 0..k_tiles, then the next nn. Inside a tile, elements are row-major.
// Anything past the true extent of the operand is written as zero.

use crate::error::{Result, TileError};
use crate::geometry::TileGeometry;
use crate::view::MatrixRef;

/// Copy tile `(tile_row, tile_col)` of `src` into `dst`, zero-padding rows
/// and columns that fall outside `src`.
fn write_tile(src: &MatrixRef<'_>, tile_row: usize, tile_col: usize, tile: usize, dst: &mut [f64]) {
    let col0 = tile_col * tile;
    let width = src.cols().saturating_sub(col0).min(tile);

    for (x, dst_row) in dst.chunks_exact_mut(tile).enumerate() {
        let row = tile_row * tile + x;
        if row < src.rows() && width > 0 {
            dst_row[..width].copy_from_slice(&src.row(row)[col0..col0 + width]);
            dst_row[width..].fill(0.0);
        } else {
            dst_row.fill(0.0);
        }
    }
}

fn check_operand(src: &MatrixRef<'_>, rows: usize, cols: usize) -> Result<()> {
    if src.rows() != rows || src.cols() != cols {
        return Err(TileError::ShapeMismatch {
            expected: (rows, cols),
            got: (src.rows(), src.cols()),
        });
    }
    Ok(())
}

fn check_buffer(out: &[f64], needed: usize) -> Result<()> {
    if out.len() < needed {
        return Err(TileError::BufferTooSmall {
            needed,
            got: out.len(),
        });
    }
    Ok(())
}

/// Pack the left operand A (`[m x k]`) into `out[..geom.a_len()]`.
///
/// Tiles are ordered by row-tile, then contraction-tile.
pub fn pack_a(a: &MatrixRef<'_>, geom: &TileGeometry, out: &mut [f64]) -> Result<()> {
    check_operand(a, geom.m(), geom.k())?;
    check_buffer(out, geom.a_len())?;

    let k_tiles = geom.k_tiles();
    let tiles = out[..geom.a_len()].chunks_exact_mut(geom.tile_len());
    for (i, dst) in tiles.enumerate() {
        let (mm, kk) = (i / k_tiles, i % k_tiles);
        write_tile(a, mm, kk, geom.tile(), dst);
    }
    Ok(())
}

/// Pack the right operand B (`[k x n]`) into `out[..geom.b_len()]`.
///
/// Tiles are ordered by column-tile, then contraction-tile, so each
/// column-block of B is contiguous.
pub fn pack_b(b: &MatrixRef<'_>, geom: &TileGeometry, out: &mut [f64]) -> Result<()> {
    check_operand(b, geom.k(), geom.n())?;
    check_buffer(out, geom.b_len())?;

    let k_tiles = geom.k_tiles();
    let tiles = out[..geom.b_len()].chunks_exact_mut(geom.tile_len());
    for (i, dst) in tiles.enumerate() {
        let (nn, kk) = (i / k_tiles, i % k_tiles);
        write_tile(b, kk, nn, geom.tile(), dst);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(n: usize) -> Vec<f64> {
        (1..=n).map(|v| v as f64).collect()
    }

    #[test]
    fn test_pack_a_pads_and_orders() {
        // 3x3 A with T=2: 2x2 tiles, order (0,0) (0,1) (1,0) (1,1)
        let data = iota(9);
        let a = MatrixRef::contiguous(&data, 3, 3).unwrap();
        let g = TileGeometry::new(2, 3, 1, 3).unwrap();
        let mut out = vec![-1.0; g.a_len()];
        pack_a(&a, &g, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                1.0, 2.0, 4.0, 5.0, // (0,0)
                3.0, 0.0, 6.0, 0.0, // (0,1)
                7.0, 8.0, 0.0, 0.0, // (1,0)
                9.0, 0.0, 0.0, 0.0, // (1,1)
            ]
        );
    }

    #[test]
    fn test_pack_b_is_column_block_major() {
        // 2x4 B with T=2: tiles (kk=0,nn=0) then (kk=0,nn=1)
        let data = iota(8);
        let b = MatrixRef::contiguous(&data, 2, 4).unwrap();
        let g = TileGeometry::new(2, 1, 4, 2).unwrap();
        let mut out = vec![0.0; g.b_len()];
        pack_b(&b, &g, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 5.0, 6.0, 3.0, 4.0, 7.0, 8.0]);
    }

    #[test]
    fn test_pack_b_k_tiles_inner() {
        // 3x1 B with T=2: column-tile 0 holds kk=0 then kk=1
        let data = vec![1.0, 2.0, 3.0];
        let b = MatrixRef::contiguous(&data, 3, 1).unwrap();
        let g = TileGeometry::new(2, 1, 1, 3).unwrap();
        let mut out = vec![9.0; g.b_len()];
        pack_b(&b, &g, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pack_respects_leading_dimension() {
        let data = vec![1.0, 2.0, 99.0, 3.0, 4.0];
        let a = MatrixRef::new(&data, 2, 2, 3).unwrap();
        let g = TileGeometry::new(2, 2, 1, 2).unwrap();
        let mut out = vec![0.0; g.a_len()];
        pack_a(&a, &g, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_pack_overwrites_stale_contents() {
        let data = vec![5.0];
        let a = MatrixRef::contiguous(&data, 1, 1).unwrap();
        let g = TileGeometry::new(4, 1, 1, 1).unwrap();
        let mut out = vec![7.0; 32];
        pack_a(&a, &g, &mut out).unwrap();
        assert_eq!(out[0], 5.0);
        assert!(out[1..16].iter().all(|&v| v == 0.0));
        // beyond the used prefix is left alone
        assert!(out[16..].iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_pack_a_random_shapes() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let tile = rng.gen_range(1..=5);
            let (m, k) = (rng.gen_range(1..=13), rng.gen_range(1..=13));
            let data: Vec<f64> = (0..m * k).map(|_| rng.gen_range(1..100) as f64).collect();
            let a = MatrixRef::contiguous(&data, m, k).unwrap();
            let g = TileGeometry::new(tile, m, 1, k).unwrap();
            let mut out = vec![f64::NAN; g.a_len()];
            pack_a(&a, &g, &mut out).unwrap();

            let (pm, _, pk) = g.padded_dims();
            for i in 0..pm {
                for p in 0..pk {
                    let t = (i / tile) * g.k_tiles() + p / tile;
                    let got = out[t * g.tile_len() + (i % tile) * tile + p % tile];
                    let want = if i < m && p < k { a.get(i, p) } else { 0.0 };
                    assert_eq!(got, want, "T={tile} m={m} k={k} at ({i}, {p})");
                }
            }
        }
    }

    #[test]
    fn test_pack_rejects_short_buffer() {
        let data = iota(4);
        let a = MatrixRef::contiguous(&data, 2, 2).unwrap();
        let g = TileGeometry::new(4, 2, 1, 2).unwrap();
        let mut out = vec![0.0; 8];
        assert!(matches!(
            pack_a(&a, &g, &mut out),
            Err(TileError::BufferTooSmall { needed: 16, got: 8 })
        ));
    }

    #[test]
    fn test_pack_rejects_wrong_operand_shape() {
        let data = iota(6);
        let a = MatrixRef::contiguous(&data, 2, 3).unwrap();
        let g = TileGeometry::new(2, 3, 1, 2).unwrap();
        let mut out = vec![0.0; g.a_len()];
        assert!(pack_a(&a, &g, &mut out).is_err());
    }
}
