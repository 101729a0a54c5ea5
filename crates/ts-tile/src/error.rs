use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("leading dimension {ld} is smaller than column count {cols}")]
    LeadingDimension { ld: usize, cols: usize },
    #[error("storage holds {got} elements but a [{rows}x{cols}] view with ld={ld} needs {needed}")]
    StorageTooSmall {
        rows: usize,
        cols: usize,
        ld: usize,
        needed: usize,
        got: usize,
    },
    #[error("gemm dimension mismatch: [{m}x{k}] @ [{k2}x{n}] -> [{c_rows}x{c_cols}]")]
    GemmMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
        c_rows: usize,
        c_cols: usize,
    },
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("buffer holds {got} elements, {needed} required")]
    BufferTooSmall { needed: usize, got: usize },
    #[error("tile size must be greater than zero")]
    ZeroTileSize,
}

pub type Result<T> = std::result::Result<T, TileError>;
