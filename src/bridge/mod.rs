// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the sole public-facing API of the fpzk library. It provides a
// stable interface over the pure `volume_pipeline` engine and is the authoritative
// boundary between caller-owned buffers and the internal codec.
//
// Data Flow (Compression):
//
//   1. [Stateless API (compress / kompress / compress_array)] -> Receives typed voxels
//         |
//         `-> a. Resolves the FpzkConfig into a validated Header
//         |
//         `-> b. Calls `volume_pipeline::encoder` -> Returns `Vec<u8>` (Header || Body)
//
//
// Data Flow (Decompression):
//
//   1. [Handle (Fpzk::open)] -> Receives `&[u8]`, parses the Header only
//         |
//         `-> accessors answer from the Header without touching the body
//
//   2. [Handle (decompress / dekompress_specialized)] -> Receives a caller buffer
//         |
//         `-> Calls `volume_pipeline::decoder`, one fresh session per call
//
// ====================================================================================
pub mod format;
pub mod handle;
pub mod stateless_api;

// --- Handle API ---
pub use handle::Fpzk;

// --- Stateless API ---
pub use stateless_api::{
    analyze_stream, compress, compress_array, compress_buffer, compress_bytes, decompress_vec,
    kompress,
};

// --- Format Constants and Structs ---
pub use format::{CompressionStats, Header, HEADER_LEN, STREAM_FORMAT_VERSION, STREAM_MAGIC};

#[cfg(test)]
mod tests;
