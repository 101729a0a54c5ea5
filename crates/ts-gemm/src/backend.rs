use std::fmt::Debug;

use ts_device::Accelerator;
use ts_tile::{reference_gemm, MatrixMut, MatrixRef};

use crate::error::Result;
use crate::session::Session;

/// Anything that can evaluate `C = alpha * A @ B + beta * C`.
///
/// Lets a caller run the same problem on the accelerator and on the CPU
/// reference and compare the results.
pub trait GemmBackend: Debug {
    /// Returns the name of this backend (e.g., "cpu", "sim").
    fn name(&self) -> &str;

    /// A is `[m x k]`, B is `[k x n]`, C is `[m x n]`.
    fn gemm(
        &mut self,
        alpha: f64,
        a: MatrixRef<'_>,
        b: MatrixRef<'_>,
        beta: f64,
        c: MatrixMut<'_>,
    ) -> Result<()>;
}

/// Reference backend: plain loops on the host.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GemmBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn gemm(
        &mut self,
        alpha: f64,
        a: MatrixRef<'_>,
        b: MatrixRef<'_>,
        beta: f64,
        mut c: MatrixMut<'_>,
    ) -> Result<()> {
        reference_gemm(alpha, &a, &b, beta, &mut c)?;
        Ok(())
    }
}

impl<D: Accelerator> GemmBackend for Session<D> {
    fn name(&self) -> &str {
        self.device().name()
    }

    fn gemm(
        &mut self,
        alpha: f64,
        a: MatrixRef<'_>,
        b: MatrixRef<'_>,
        beta: f64,
        c: MatrixMut<'_>,
    ) -> Result<()> {
        self.multiply(alpha, a, b, beta, c)
    }
}
