//! This module defines the core, strongly-typed data representations used
//! throughout the fpzk codec.
//!
//! It includes the canonical `FloatType` tag, the `Dims` of a volume, and the
//! checked tagged unions that stand in for "a buffer of either f32 or f64".

pub mod float_type;
pub mod volume;

// Re-export the main type(s) for easier access.
pub use float_type::FloatType;
pub use volume::{Dims, VoxelArray, VoxelBuffer, VoxelBufferMut, VoxelVec};
