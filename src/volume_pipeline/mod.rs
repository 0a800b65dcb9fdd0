// In: src/volume_pipeline/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Volume Pipeline
// ====================================================================================
//
// The volume pipeline is the pure engine behind the bridge. It knows about headers
// and typed voxel slices, but nothing about handles, configs or byte-buffer casts.
//
// Data Flow (Compression):
//
//   [&[T] + Header] -> encoder::encode_volume
//         |
//         `-> a. (Kempressed only) gather XYZC -> XYCZ, apply the forward transform
//         `-> b. bitcast each value to a p-bit key
//         `-> c. Lorenzo prediction + bit-plane residual coding, voxel by voxel
//         |
//         `-> Header || Body appended to the caller's Vec<u8>
//
// Data Flow (Decompression):
//
//   [&[u8] stream + VoxelBufferMut] -> decoder::decode_volume
//         |
//         `-> a. DecodeSession parses the header       (Unopened -> HeaderParsed)
//         `-> b. VoxelAssembler validates the buffer   (size first, then type)
//         `-> c. residual decode + prediction per voxel (Decoding)
//         `-> d. assembler widens, optionally inverts the transform, and scatters
//         |
//         `-> Complete, or Failed on the first error
//
// ====================================================================================
pub(crate) mod assembler;
pub(crate) mod decoder;
pub(crate) mod encoder;

/// Which value layout a stream body carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecMode {
    /// Values in XYZC order, as given.
    Standard,
    /// Values passed through the kempress transform and stored in XYCZ order.
    Kempressed,
}
