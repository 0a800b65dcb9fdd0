// In: src/error.rs

//! This module defines the single, unified error type for the entire fpzk library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every decode call ends in exactly one of two outcomes: the destination buffer
//! is fully populated, or one of these errors is returned. There is no partial
//! result and no silent recovery.

use thiserror::Error;

use crate::types::FloatType;

#[derive(Error, Debug)]
pub enum FpzkError {
    // =========================================================================
    // === Stream & Buffer Contract Errors
    // =========================================================================
    /// Bad magic/version, truncated header, zero or overflowing dimension, or
    /// an unknown type tag. Raised by `open` before any body byte is read.
    #[error("Invalid stream header: {0}")]
    InvalidHeader(String),

    /// The range coder ran out of body bytes, decoded a symbol its model cannot
    /// produce, or a reconstructed plane value left the encoded domain.
    #[error("Corrupt compressed stream: {0}")]
    CorruptStream(String),

    /// The destination (or source) holds a different number of voxels than the
    /// header declares.
    #[error("Buffer size mismatch: expected {expected} voxels, got {actual}")]
    BufferSizeMismatch { expected: u64, actual: u64 },

    /// The destination element type differs from the stream's element type.
    #[error("Type mismatch: stream holds {expected}, buffer holds {actual}")]
    TypeMismatch { expected: FloatType, actual: FloatType },

    /// Precision outside `minimum..=bit-width` of the element type. `minimum` is
    /// 1 for standard streams and higher for the kempressed mode.
    #[error("Unsupported precision {precision} for {float_type} (valid range is {minimum}..={})", .float_type.bits())]
    UnsupportedPrecision {
        precision: u32,
        float_type: FloatType,
        minimum: u32,
    },

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error from the Serde JSON library, raised while loading a config.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),
}

impl FpzkError {
    pub(crate) fn invalid_header(message: impl Into<String>) -> Self {
        FpzkError::InvalidHeader(message.into())
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        FpzkError::CorruptStream(message.into())
    }

    pub(crate) fn size_mismatch(expected: u64, actual: usize) -> Self {
        FpzkError::BufferSizeMismatch {
            expected,
            actual: actual as u64,
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for FpzkError {
    fn from(err: bytemuck::PodCastError) -> Self {
        FpzkError::PodCast(err.to_string())
    }
}
