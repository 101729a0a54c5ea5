use crate::error::{Result, TileError};

/// Number of elements a row-major `[rows x cols]` view with leading
/// dimension `ld` touches.
fn required_len(rows: usize, cols: usize, ld: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * ld + cols
    }
}

fn check_layout(len: usize, rows: usize, cols: usize, ld: usize) -> Result<()> {
    if ld < cols {
        return Err(TileError::LeadingDimension { ld, cols });
    }
    let needed = required_len(rows, cols, ld);
    if len < needed {
        return Err(TileError::StorageTooSmall {
            rows,
            cols,
            ld,
            needed,
            got: len,
        });
    }
    Ok(())
}

/// Read-only view over caller-owned row-major storage.
///
/// Element `(row, col)` lives at `data[row * ld + col]`. The view never
/// owns the memory.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a> MatrixRef<'a> {
    /// Create a view with an explicit leading dimension.
    ///
    /// # Errors
    /// Returns an error if `ld < cols` or `data` is too short for the view.
    pub fn new(data: &'a [f64], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, ld)?;
        Ok(MatrixRef {
            data,
            rows,
            cols,
            ld,
        })
    }

    /// Create a view over densely packed rows (`ld == cols`).
    pub fn contiguous(data: &'a [f64], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Leading dimension (distance between the starts of consecutive rows).
    pub fn ld(&self) -> usize {
        self.ld
    }

    /// Returns element `(row, col)`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the view.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of bounds");
        self.data[row * self.ld + col]
    }

    /// Returns the `cols` in-bounds elements of `row`.
    pub fn row(&self, row: usize) -> &'a [f64] {
        if self.cols == 0 {
            return &[];
        }
        let start = row * self.ld;
        &self.data[start..start + self.cols]
    }
}

/// Mutable view over caller-owned row-major storage.
#[derive(Debug)]
pub struct MatrixMut<'a> {
    data: &'a mut [f64],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a> MatrixMut<'a> {
    /// Create a mutable view with an explicit leading dimension.
    ///
    /// # Errors
    /// Returns an error if `ld < cols` or `data` is too short for the view.
    pub fn new(data: &'a mut [f64], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, ld)?;
        Ok(MatrixMut {
            data,
            rows,
            cols,
            ld,
        })
    }

    /// Create a mutable view over densely packed rows (`ld == cols`).
    pub fn contiguous(data: &'a mut [f64], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn ld(&self) -> usize {
        self.ld
    }

    /// Returns element `(row, col)`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the view.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of bounds");
        self.data[row * self.ld + col]
    }

    /// Returns the `cols` in-bounds elements of `row`, mutably.
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        if self.cols == 0 {
            return &mut [];
        }
        let start = row * self.ld;
        &mut self.data[start..start + self.cols]
    }

    /// Borrow this view as a read-only view.
    pub fn view(&self) -> MatrixRef<'_> {
        MatrixRef {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
        }
    }

    /// Reborrow with a shorter lifetime so the view can be passed on by value.
    pub fn reborrow(&mut self) -> MatrixMut<'_> {
        MatrixMut {
            data: &mut *self.data,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
        }
    }
}

/// Validate the operand shapes of `C = alpha*A*B + beta*C` and return `(m, n, k)`.
///
/// A is `[m x k]`, B is `[k x n]`, C is `[m x n]`.
pub fn gemm_dims(a: &MatrixRef<'_>, b: &MatrixRef<'_>, c: &MatrixRef<'_>) -> Result<(usize, usize, usize)> {
    let (m, k) = (a.rows(), a.cols());
    let (k2, n) = (b.rows(), b.cols());
    if k != k2 || c.rows() != m || c.cols() != n {
        return Err(TileError::GemmMismatch {
            m,
            k,
            k2,
            n,
            c_rows: c.rows(),
            c_cols: c.cols(),
        });
    }
    Ok((m, n, k))
}
