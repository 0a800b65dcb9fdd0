// In: src/bridge/format.rs

//! Defines the on-wire structures and constants for the fpzk stream format.
//! This is the single source of truth for the header layout; the body layout is
//! owned by `volume_pipeline`.
//!
//! ```text
//! offset 0  magic    4 bytes  b"fpzk"
//! offset 4  version  u8
//! offset 5  type     u8       0 = Float32, 1 = Float64
//! offset 6  prec     u8
//! offset 7  nx       u32 LE
//! offset 11 ny       u32 LE
//! offset 15 nz       u32 LE
//! offset 19 nf       u32 LE
//! offset 23 body
//! ```

use serde::{Deserialize, Serialize};

use crate::error::FpzkError;
use crate::types::{Dims, FloatType};

//==================================================================================
// I. Stream Constants
//==================================================================================

/// The magic number to identify the start of an fpzk stream.
pub const STREAM_MAGIC: &[u8; 4] = b"fpzk";
/// The current version of the fpzk stream format.
pub const STREAM_FORMAT_VERSION: u8 = 1;
/// Fixed size of the header in bytes.
pub const HEADER_LEN: usize = 23;

//==================================================================================
// II. Header Model
//==================================================================================

/// The parsed, validated stream header.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub float_type: FloatType,
    /// Retained key bits, `1..=float_type.bits()`.
    pub precision: u32,
    pub dims: Dims,
}

impl Header {
    /// Builds a header for encoding, validating precision and dimensions.
    pub fn new(float_type: FloatType, precision: u32, dims: Dims) -> Result<Self, FpzkError> {
        let header = Self {
            float_type,
            precision,
            dims,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<(), FpzkError> {
        if !self.float_type.supports_precision(self.precision) {
            return Err(FpzkError::UnsupportedPrecision {
                precision: self.precision,
                float_type: self.float_type,
                minimum: 1,
            });
        }
        self.dims.validated_len()?;
        Ok(())
    }

    /// Parses and validates the header at the start of `bytes`.
    ///
    /// Only the first `HEADER_LEN` bytes are inspected; the body is not touched.
    pub fn parse(bytes: &[u8]) -> Result<Self, FpzkError> {
        let prefix = bytes.get(..HEADER_LEN).ok_or_else(|| {
            FpzkError::invalid_header(format!(
                "stream is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            ))
        })?;

        if &prefix[0..4] != STREAM_MAGIC {
            return Err(FpzkError::invalid_header(format!(
                "bad magic {:02x?}, expected {:02x?}",
                &prefix[0..4],
                STREAM_MAGIC
            )));
        }
        if prefix[4] != STREAM_FORMAT_VERSION {
            return Err(FpzkError::invalid_header(format!(
                "unsupported format version {} (this build reads version {})",
                prefix[4], STREAM_FORMAT_VERSION
            )));
        }
        let float_type = FloatType::from_tag(prefix[5])?;
        let precision = prefix[6] as u32;

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                prefix[offset],
                prefix[offset + 1],
                prefix[offset + 2],
                prefix[offset + 3],
            ])
        };
        let header = Self {
            float_type,
            precision,
            dims: Dims::new(read_u32(7), read_u32(11), read_u32(15), read_u32(19)),
        };
        header.validate()?;
        Ok(header)
    }

    /// Appends the serialized header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(STREAM_MAGIC);
        out.push(STREAM_FORMAT_VERSION);
        out.push(self.float_type.tag());
        // `validate` bounds precision by 64.
        out.push(self.precision as u8);
        for extent in [self.dims.nx, self.dims.ny, self.dims.nz, self.dims.nf] {
            out.extend_from_slice(&extent.to_le_bytes());
        }
    }

    /// `nx * ny * nz * nf`. Cannot overflow for a validated header.
    pub fn nvoxels(&self) -> u64 {
        self.dims.checked_nvoxels().unwrap_or(u64::MAX)
    }
}

//==================================================================================
// III. Analysis
//==================================================================================

/// The public-facing struct for stream analysis results, returned by `analyze_stream`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompressionStats {
    pub header_size: usize,
    pub body_size: usize,
    pub total_size: usize,
    pub nvoxels: u64,
    pub float_type: FloatType,
    pub precision: u32,
    /// Size the voxels occupy once decoded.
    pub decoded_size: u64,
    pub bits_per_voxel: f64,
    pub compression_ratio: f64,
}

impl CompressionStats {
    pub fn from_header(header: &Header, total_size: usize) -> Self {
        let nvoxels = header.nvoxels();
        let decoded_size = nvoxels.saturating_mul(header.float_type.element_size() as u64);
        let body_size = total_size.saturating_sub(HEADER_LEN);
        Self {
            header_size: HEADER_LEN,
            body_size,
            total_size,
            nvoxels,
            float_type: header.float_type,
            precision: header.precision,
            decoded_size,
            bits_per_voxel: (body_size as f64 * 8.0) / nvoxels as f64,
            compression_ratio: decoded_size as f64 / total_size as f64,
        }
    }
}

//==================================================================================
// IV. Unit Tests
//==================================================================================
