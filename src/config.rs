// In: src/config.rs

//! The single source of truth for fpzk encode-side configuration.
//!
//! Decoding needs no configuration at all: everything a decoder must know is in
//! the stream header. `FpzkConfig` only steers how a stream is produced, and is
//! typically built once at the application boundary (in code, or from JSON) and
//! passed by reference into `compress` / `kompress`.

use serde::{Deserialize, Serialize};

use crate::error::FpzkError;
use crate::types::FloatType;

//==================================================================================
// I. The Unified FpzkConfig
//==================================================================================

/// Encode settings for a single compression call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FpzkConfig {
    /// Number of most-significant key bits to keep. `None` keeps the full width
    /// of the element type, i.e. lossless.
    #[serde(default)]
    pub precision: Option<u8>,

    /// If true, the encoder logs per-stream compression statistics at `info`.
    #[serde(default)]
    pub enable_stats_collection: bool,
}

impl FpzkConfig {
    /// Bit-exact compression at the full width of the element type.
    pub fn lossless() -> Self {
        Self::default()
    }

    /// Bounded-error compression keeping `precision` key bits.
    pub fn with_precision(precision: u8) -> Self {
        Self {
            precision: Some(precision),
            ..Self::default()
        }
    }

    /// Parses a config from JSON, e.g. `{"precision": 20}`.
    pub fn from_json(json: &str) -> Result<Self, FpzkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The effective precision for `float_type`.
    ///
    /// # Errors
    /// `UnsupportedPrecision` if the configured value is outside `1..=bits`.
    pub fn resolve_precision(&self, float_type: FloatType) -> Result<u32, FpzkError> {
        let precision = self
            .precision
            .map(u32::from)
            .unwrap_or_else(|| float_type.bits());
        if !float_type.supports_precision(precision) {
            return Err(FpzkError::UnsupportedPrecision {
                precision,
                float_type,
                minimum: 1,
            });
        }
        Ok(precision)
    }
}
