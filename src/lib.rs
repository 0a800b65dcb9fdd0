//! This file is the root of the `fpzk` Rust crate.
//!
//! `fpzk` is a lossless and bounded-precision lossy codec for 4-D floating point
//! voxel volumes, with a "kempressed" specialized mode for probability-like data
//! such as affinity and segmentation maps.
//!
//! Its responsibilities are strictly limited to declaring the top-level modules
//! and re-exporting the public API.
//!
//! ```ignore
//! use fpzk::{compress, Dims, Fpzk, FpzkConfig};
//!
//! let values = vec![1.0f32, 2.0, 3.0, 4.0];
//! let bytes = compress(&values, Dims::new(2, 2, 1, 1), &FpzkConfig::lossless())?;
//!
//! let handle = Fpzk::open(&bytes)?;
//! let mut out = vec![0.0f32; handle.nvoxels() as usize];
//! handle.decompress(&mut out)?;
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod kernels;

mod error;
mod traits;
mod types;
mod utils;
mod volume_pipeline;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{
    analyze_stream, compress, compress_array, compress_buffer, compress_bytes, decompress_vec,
    kompress, CompressionStats, Fpzk, Header,
};
pub use config::FpzkConfig;
pub use error::FpzkError;
pub use observability::enable_logging;
pub use traits::FloatBits;
pub use types::{Dims, FloatType, VoxelArray, VoxelBuffer, VoxelBufferMut, VoxelVec};
