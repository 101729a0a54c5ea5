use crate::error::Result;
use crate::view::{gemm_dims, MatrixMut, MatrixRef};

/// Reference `C = alpha * A @ B + beta * C` with straightforward loops.
///
/// Optimized for being obviously correct rather than fast. Each element of C
/// is scaled by `beta` first, then receives `alpha * a * b` for every term of
/// the contraction in increasing order.
pub fn reference_gemm(
    alpha: f64,
    a: &MatrixRef<'_>,
    b: &MatrixRef<'_>,
    beta: f64,
    c: &mut MatrixMut<'_>,
) -> Result<()> {
    let (m, n, k) = gemm_dims(a, b, &c.view())?;

    for i in 0..m {
        let a_row = a.row(i);
        let c_row = c.row_mut(i);
        for (j, out) in c_row.iter_mut().enumerate().take(n) {
            *out *= beta;
            for (p, &a_ip) in a_row.iter().enumerate().take(k) {
                *out += alpha * a_ip * b.get(p, j);
            }
        }
    }
    Ok(())
}
