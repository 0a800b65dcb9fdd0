//! This module contains the "kempressed" domain transform and the channel-plane
//! axis permutation used by the specialized codec mode.
//!
//! The transform works on full-width ordered keys. It rotates the finite key
//! range `[key(-MAX), key(+MAX)]` by the distance between `+0.0` and `1.0`.
//! Zero lands on `1.0`, and probability-like data in `[0, 1]` keeps its order
//! while moving clear of the sign boundary. Only values at or above `2.0` wrap
//! around to the bottom of the finite range.
//!
//! Non-finite keys are never touched, finite keys always stay finite, and the
//! rotation is a bijection, so the inverse recovers every bit pattern exactly.
//!
//! Lossy streams keep that guarantee only while truncation cannot move a key
//! across the bottom of the finite range or the wrap point. Both sit on a
//! multiple of the exponent's lowest bit, so the precision must keep the whole
//! exponent field: 9 bits for `f32`, 12 for `f64`.

use num_traits::Float;

use crate::error::FpzkError;
use crate::kernels::bitcast::{from_ordered_key, to_ordered_key};
use crate::traits::FloatBits;

//==================================================================================
// 1. Value Transform
//==================================================================================

/// The fixed rotation for one float width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KempressTransform {
    /// Key of `-MAX`, the bottom of the finite range.
    lo: u64,
    /// Number of finite keys.
    span: u64,
    /// `key(1.0) - key(+0.0)`.
    bias: u64,
}

impl KempressTransform {
    pub fn for_type<T: FloatBits>() -> Self {
        let lo = to_ordered_key(-<T as Float>::max_value());
        let hi = to_ordered_key(<T as Float>::max_value());
        let bias = to_ordered_key(T::one()) - to_ordered_key(T::zero());
        Self {
            lo,
            span: hi - lo + 1,
            bias,
        }
    }

    /// Smallest precision whose truncation grid lines up with the bottom of the
    /// finite range, the wrap point and the top of the finite range.
    pub fn min_precision<T: FloatBits>() -> u32 {
        let t = Self::for_type::<T>();
        let alignment = [t.lo, t.lo + t.bias, t.lo + t.span]
            .iter()
            .map(|edge| edge.trailing_zeros())
            .min()
            .unwrap_or(0);
        T::BITS - alignment
    }

    /// Rejects precisions below [`min_precision`](Self::min_precision).
    pub fn check_precision<T: FloatBits>(precision: u32) -> Result<(), FpzkError> {
        let minimum = Self::min_precision::<T>();
        if precision < minimum {
            return Err(FpzkError::UnsupportedPrecision {
                precision,
                float_type: T::FLOAT_TYPE,
                minimum,
            });
        }
        Ok(())
    }

    #[inline]
    fn finite_offset(&self, key: u64) -> Option<u64> {
        key.checked_sub(self.lo).filter(|offset| *offset < self.span)
    }

    /// Applies the transform to a full-width key.
    #[inline]
    pub fn forward_key(&self, key: u64) -> u64 {
        match self.finite_offset(key) {
            Some(offset) if offset >= self.span - self.bias => self.lo + offset - (self.span - self.bias),
            Some(offset) => self.lo + offset + self.bias,
            None => key,
        }
    }

    /// Undoes [`forward_key`](Self::forward_key).
    #[inline]
    pub fn inverse_key(&self, key: u64) -> u64 {
        match self.finite_offset(key) {
            Some(offset) if offset >= self.bias => self.lo + offset - self.bias,
            Some(offset) => self.lo + offset + (self.span - self.bias),
            None => key,
        }
    }

    pub fn forward<T: FloatBits>(&self, value: T) -> T {
        from_ordered_key(self.forward_key(to_ordered_key(value)))
    }

    pub fn inverse<T: FloatBits>(&self, value: T) -> T {
        from_ordered_key(self.inverse_key(to_ordered_key(value)))
    }
}

//==================================================================================
// 2. Axis Permutation
//==================================================================================

/// Maps between the caller's XYZC order and the stored XYCZ order, where each
/// `z` slice holds its `nf` channel planes back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPlaneLayout {
    plane: usize,
    nz: usize,
    nf: usize,
}

impl ChannelPlaneLayout {
    /// `extents` is `[nx, ny, nz, nf]`.
    pub fn new(extents: [usize; 4]) -> Self {
        Self {
            plane: extents[0] * extents[1],
            nz: extents[2],
            nf: extents[3],
        }
    }

    /// The XYZC index of the voxel stored at XYCZ position `stored`.
    #[inline]
    pub fn logical_index(&self, stored: usize) -> usize {
        let within = stored % self.plane;
        let rest = stored / self.plane;
        let channel = rest % self.nf;
        let z = rest / self.nf;
        within + self.plane * (z + self.nz * channel)
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
