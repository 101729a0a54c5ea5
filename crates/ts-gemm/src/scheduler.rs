use ts_device::{Accelerator, ActionSet};
use ts_tile::{accumulate_partials, scale_region, MatrixMut, TileGeometry};

use crate::error::Result;
use crate::plan::queue_inputs;
use crate::slots::{OutputSlots, PIPELINE_DEPTH};

/// Drive the accelerator through one multiplication.
///
/// `a_tiles` and `b_tiles` hold the packed operands. Result tiles are
/// collected two at a time through `slots`: while the host folds one output
/// tile into C, the next one is already being transferred.
///
/// Any error aborts the tile loop immediately. Runs that are still in
/// flight at that point are left in `slots` for the caller to drain.
#[allow(clippy::too_many_arguments)]
pub fn execute<D: Accelerator>(
    device: &mut D,
    geom: &TileGeometry,
    a_tiles: &[f64],
    b_tiles: &[f64],
    slots: &mut OutputSlots,
    alpha: f64,
    beta: f64,
    c: &mut MatrixMut<'_>,
) -> Result<()> {
    let mut actions = ActionSet::new();
    queue_inputs(&mut actions, geom, a_tiles, b_tiles)?;
    device.dispatch_blocking(actions)?;

    let total = geom.output_tiles();
    let len = geom.block_len();
    for sel in 0..PIPELINE_DEPTH.min(total) {
        slots.dispatch(sel, device, len)?;
    }

    // Tile counter: PIPELINE_DEPTH runs are already in flight.
    let mut tile = PIPELINE_DEPTH;
    for (mm, nn) in geom.output_order() {
        let sel = tile & 1;

        scale_region(c, geom, mm, nn, beta);
        let partials = slots.wait(sel, device)?;
        accumulate_partials(c, geom, mm, nn, alpha, partials)?;

        if tile < total {
            slots.dispatch(sel, device, len)?;
        }
        tile += 1;
    }
    Ok(())
}
