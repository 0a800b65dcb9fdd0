//! This module defines the shared trait that binds a Rust float type to its
//! bit width, header tag and tagged-buffer variant.

use std::fmt::Debug;

use bytemuck::Pod;
use num_traits::Float;

use crate::types::{FloatType, VoxelBufferMut};

/// A voxel element type the codec can carry: `f32` or `f64`.
///
/// Raw bits are exchanged as `u64` so that the kernels can share one integer
/// path for both widths.
pub trait FloatBits: Float + Pod + Default + Debug + Send + Sync + 'static {
    /// The header tag for this type.
    const FLOAT_TYPE: FloatType;
    /// Width in bits; also the lossless precision.
    const BITS: u32;

    /// The IEEE bit pattern, zero-extended to 64 bits.
    fn to_raw(self) -> u64;

    /// Rebuilds a value from its bit pattern. Bits above `BITS` are ignored.
    fn from_raw(raw: u64) -> Self;

    /// Extracts a slice of this type, or `None` if the variant differs.
    fn unwrap_mut<'a>(buffer: VoxelBufferMut<'a>) -> Option<&'a mut [Self]>;
}

// Implement the trait for both float widths.
macro_rules! impl_float_bits {
    ($F:ty, $U:ty, $variant:ident) => {
        impl FloatBits for $F {
            const FLOAT_TYPE: FloatType = FloatType::$variant;
            const BITS: u32 = <$U>::BITS;

            #[inline]
            fn to_raw(self) -> u64 {
                self.to_bits() as u64
            }

            #[inline]
            fn from_raw(raw: u64) -> Self {
                <$F>::from_bits(raw as $U)
            }

            fn unwrap_mut<'a>(buffer: VoxelBufferMut<'a>) -> Option<&'a mut [Self]> {
                match buffer {
                    VoxelBufferMut::$variant(slice) => Some(slice),
                    _ => None,
                }
            }
        }
    };
}

impl_float_bits!(f32, u32, Float32);
impl_float_bits!(f64, u64, Float64);
