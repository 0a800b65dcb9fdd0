//! This module contains the pure, stateless kernel for order-preserving
//! bit-casting of floats into the codec's encoded domain.
//!
//! This is the Layer 0 (Normalization) transform. A float's IEEE bit pattern is
//! rearranged into an unsigned *key* whose integer order matches the float's
//! total order: non-negative values get the sign bit set, negative values are
//! bitwise inverted. Nearby floats therefore become nearby integers, which is
//! what the Lorenzo predictor and the bit-plane coder operate on.
//!
//! Lossy precision is applied here too: a `p`-bit key keeps the top `p` bits of
//! the full key, and widening refills the discarded bits with zeros.

use crate::traits::FloatBits;

//==================================================================================
// 1. Full-Width Keys
//==================================================================================

/// Maps a float to its full-width ordered key.
#[inline]
pub fn to_ordered_key<T: FloatBits>(value: T) -> u64 {
    let sign = 1u64 << (T::BITS - 1);
    let raw = value.to_raw();
    if raw & sign != 0 {
        !raw & width_mask(T::BITS)
    } else {
        raw | sign
    }
}

/// Inverse of [`to_ordered_key`]. Exact for every bit pattern, NaNs included.
#[inline]
pub fn from_ordered_key<T: FloatBits>(key: u64) -> T {
    let sign = 1u64 << (T::BITS - 1);
    let raw = if key & sign != 0 {
        key ^ sign
    } else {
        !key & width_mask(T::BITS)
    };
    T::from_raw(raw)
}

//==================================================================================
// 2. Precision Truncation
//==================================================================================

/// All-ones mask covering the low `bits` bits (`bits` in `1..=64`).
#[inline]
pub fn width_mask(bits: u32) -> u64 {
    u64::MAX >> (64 - bits)
}

/// Drops the low `width - precision` bits of a full-width key.
#[inline]
pub fn truncate_key(key: u64, width: u32, precision: u32) -> u64 {
    key >> (width - precision)
}

/// Restores a `precision`-bit key to full width with a zero fill.
#[inline]
pub fn widen_key(key: u64, width: u32, precision: u32) -> u64 {
    key << (width - precision)
}

/// Encoded-domain value of `value` at `precision` bits.
#[inline]
pub fn encode_value<T: FloatBits>(value: T, precision: u32) -> u64 {
    truncate_key(to_ordered_key(value), T::BITS, precision)
}

/// Float reconstructed from a `precision`-bit encoded-domain value.
#[inline]
pub fn decode_value<T: FloatBits>(key: u64, precision: u32) -> T {
    from_ordered_key(widen_key(key, T::BITS, precision))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
