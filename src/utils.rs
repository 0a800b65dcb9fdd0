//! This module provides the shared, low-level byte-casting helpers used at the
//! boundary between raw byte buffers and typed voxel slices.
//!
//! Every cast goes through `bytemuck`, which checks length and alignment, so no
//! part of the crate ever aliases a byte buffer through a raw pointer.

use crate::error::FpzkError;

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Reinterprets a byte slice as a slice of a plain-old-data type.
///
/// # Errors
/// Returns `FpzkError::PodCast` if the length is not a whole number of `T`s or
/// the slice is not aligned for `T`.
pub fn safe_bytes_to_typed_slice<T: bytemuck::Pod>(bytes: &[u8]) -> Result<&[T], FpzkError> {
    bytemuck::try_cast_slice(bytes).map_err(FpzkError::from)
}

/// Mutable counterpart of [`safe_bytes_to_typed_slice`].
pub fn safe_bytes_to_typed_slice_mut<T: bytemuck::Pod>(
    bytes: &mut [u8],
) -> Result<&mut [T], FpzkError> {
    bytemuck::try_cast_slice_mut(bytes).map_err(FpzkError::from)
}

/// Copies a typed slice into an owned byte vector in native byte order.
pub fn typed_slice_to_bytes<T: bytemuck::Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}
