//! `ts-tile` - Host-side tile layout for tilestream.
//!
//! This crate provides:
//! - `MatrixRef` / `MatrixMut` views over caller-owned row-major storage
//! - `TileGeometry`, the tile counts and buffer sizes for one `(m, n, k)` problem
//! - The tile transform that packs operands into zero-padded tile streams
//! - The accumulator that folds returned tiles back into the destination
//! - A reference triple-loop GEMM used for verification

pub mod accumulate;
pub mod error;
pub mod geometry;
pub mod reference;
pub mod transform;
pub mod view;

// Re-export primary types at the crate root for convenience.
pub use accumulate::{accumulate_partials, scale_region};
pub use error::{Result, TileError};
pub use geometry::{size_in_tiles, TileGeometry};
pub use reference::reference_gemm;
pub use transform::{pack_a, pack_b};
pub use view::{gemm_dims, MatrixMut, MatrixRef};
