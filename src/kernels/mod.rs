//! This module contains the pure, per-call kernels of the codec.
//!
//! Each kernel owns one step of the pipeline and knows nothing about headers,
//! buffers or the public API. `volume_pipeline` wires them together.

pub mod bitcast;
pub mod bitplane;
pub mod kempress;
pub mod lorenzo;
pub mod range_coder;
