//! This module defines the canonical, type-safe representation of the two
//! element types an fpzk stream can carry.

use crate::error::FpzkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The element type of a voxel volume, as recorded by the header type tag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatType {
    Float32,
    Float64,
}

impl FloatType {
    /// Decodes the one-byte header tag. Only `0` and `1` are valid.
    pub fn from_tag(tag: u8) -> Result<Self, FpzkError> {
        match tag {
            0 => Ok(Self::Float32),
            1 => Ok(Self::Float64),
            other => Err(FpzkError::invalid_header(format!(
                "unknown type tag {} (expected 0 = Float32 or 1 = Float64)",
                other
            ))),
        }
    }

    /// The one-byte header tag for this type.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Float32 => 0,
            Self::Float64 => 1,
        }
    }

    /// Width of the type in bits; also the maximum (lossless) precision.
    pub fn bits(&self) -> u32 {
        match self {
            Self::Float32 => 32,
            Self::Float64 => 64,
        }
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Returns `true` if `precision` is a valid number of retained key bits.
    pub fn supports_precision(&self, precision: u32) -> bool {
        (1..=self.bits()).contains(&precision)
    }
}

impl fmt::Display for FloatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
