// Caller-side check of accelerator output against a reference result.

use thiserror::Error;

use ts_tile::{MatrixRef, TileError};

use crate::error::Result;

/// First element where two results disagree.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{count} mismatching elements, first at ({row}, {col}): expected {expected}, got {actual}")]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub expected: f64,
    pub actual: f64,
    /// Total number of mismatching elements.
    pub count: usize,
}

/// Compare two results element by element for exact equality.
///
/// Returns `Ok(None)` when every in-bounds element matches.
///
/// # Errors
/// Returns an error if the two views differ in shape.
pub fn compare(expected: &MatrixRef<'_>, actual: &MatrixRef<'_>) -> Result<Option<Mismatch>> {
    let shape = (expected.rows(), expected.cols());
    let got = (actual.rows(), actual.cols());
    if shape != got {
        return Err(TileError::ShapeMismatch { expected: shape, got }.into());
    }

    let mut first: Option<Mismatch> = None;
    let mut count = 0;
    for row in 0..expected.rows() {
        let pairs = expected.row(row).iter().zip(actual.row(row));
        for (col, (&e, &a)) in pairs.enumerate() {
            if e != a {
                count += 1;
                first.get_or_insert(Mismatch {
                    row,
                    col,
                    expected: e,
                    actual: a,
                    count: 0,
                });
            }
        }
    }

    Ok(first.map(|m| Mismatch { count, ..m }))
}
