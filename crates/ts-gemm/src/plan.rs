// Input side of the engine's streaming contract.
//
// For each output tile (mm, nn) the kernel consumes A row-block mm and B
// column-block nn, one contraction tile at a time. The host must therefore
// present A row-block mm once per output tile of that row, and the whole of
// B once per row of output tiles. Any other order desynchronizes the kernel
// with no error from the device.

use std::ops::Range;

use ts_device::{ActionSet, Stream};
use ts_tile::TileGeometry;

use crate::error::Result;

/// Ranges of the packed A buffer in the order stream A must receive them:
/// row-block `mm`, repeated `n_tiles` times, for each `mm`.
pub fn a_stream_blocks(geom: &TileGeometry) -> impl Iterator<Item = Range<usize>> {
    let block = geom.block_len();
    let n_tiles = geom.n_tiles();
    (0..geom.m_tiles())
        .flat_map(move |mm| std::iter::repeat(mm * block..(mm + 1) * block).take(n_tiles))
}

/// Ranges of the packed B buffer in the order stream B must receive them:
/// all of B, once per row-tile of A.
pub fn b_stream_blocks(geom: &TileGeometry) -> impl Iterator<Item = Range<usize>> {
    std::iter::repeat(0..geom.b_len()).take(geom.m_tiles())
}

/// Queue the input/compute run for one multiplication.
///
/// Declares the run length, then queues A and B from the packed buffers.
/// Transfer-completion sync is disabled on both inputs: the result tiles
/// are collected by separate output runs, so the call must return once the
/// inputs are accepted.
pub fn queue_inputs<'a>(
    actions: &mut ActionSet<'a>,
    geom: &TileGeometry,
    a_tiles: &'a [f64],
    b_tiles: &'a [f64],
) -> Result<()> {
    actions.declare_run_length(geom.ticks());

    for range in a_stream_blocks(geom) {
        actions.enqueue_input(Stream::A, &a_tiles[range])?;
    }
    for range in b_stream_blocks(geom) {
        actions.enqueue_input(Stream::B, &b_tiles[range])?;
    }

    actions.disable_stream_sync(Stream::A);
    actions.disable_stream_sync(Stream::B);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a_blocks_replicated_per_output_column() {
        // 2 row-tiles, 3 column-tiles, 1 contraction tile of 4 elements
        let g = TileGeometry::new(2, 4, 6, 2).unwrap();
        let blocks: Vec<_> = a_stream_blocks(&g).collect();
        assert_eq!(blocks, vec![0..4, 0..4, 0..4, 4..8, 4..8, 4..8]);
    }

    #[test]
    fn test_b_streamed_whole_per_row() {
        let g = TileGeometry::new(2, 4, 6, 2).unwrap();
        let blocks: Vec<_> = b_stream_blocks(&g).collect();
        assert_eq!(blocks, vec![0..12, 0..12]);
    }

    #[test]
    fn test_queue_inputs() {
        let g = TileGeometry::new(2, 3, 3, 3).unwrap();
        let a = vec![1.0; g.a_len()];
        let b = vec![2.0; g.b_len()];
        let mut actions = ActionSet::new();
        queue_inputs(&mut actions, &g, &a, &b).unwrap();

        assert_eq!(actions.run_length(), Some(g.ticks()));
        assert!(!actions.is_synced(Stream::A));
        assert!(!actions.is_synced(Stream::B));

        let count = |s: Stream| actions.inputs().iter().filter(|(x, _)| *x == s).count();
        assert_eq!(count(Stream::A), g.m_tiles() * g.n_tiles());
        assert_eq!(count(Stream::B), g.m_tiles());

        // both streams carry exactly one tile per tick
        let total = |s: Stream| -> usize {
            actions
                .inputs()
                .iter()
                .filter(|(x, _)| *x == s)
                .map(|(_, d)| d.len())
                .sum()
        };
        assert_eq!(total(Stream::A) as u64, g.ticks());
        assert_eq!(total(Stream::B) as u64, g.ticks());
    }
}
