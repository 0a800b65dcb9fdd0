// In: src/bridge/stateless_api.rs

//! Free functions for one-shot use: encode a volume in either mode, decode a whole
//! stream into a new vector, or inspect a stream's header.

use ndarray::ArrayView4;

use crate::bridge::format::{CompressionStats, Header};
use crate::bridge::handle::Fpzk;
use crate::config::FpzkConfig;
use crate::error::FpzkError;
use crate::traits::FloatBits;
use crate::types::{Dims, FloatType, VoxelBuffer, VoxelVec};
use crate::volume_pipeline::encoder::encode_volume;
use crate::volume_pipeline::CodecMode;

/// Compresses a volume given in XYZC order (`nx` fastest, `nf` slowest).
pub fn compress<T: FloatBits>(
    values: &[T],
    dims: Dims,
    config: &FpzkConfig,
) -> Result<Vec<u8>, FpzkError> {
    compress_with_mode(values, dims, config, CodecMode::Standard)
}

/// Compresses a volume for the specialized decode mode.
///
/// Values are passed through the kempress transform and stored channel-plane
/// interleaved (XYCZ). Decode the result with `Fpzk::dekompress_specialized`.
///
/// Every bit pattern round-trips at full precision. The transform keeps order
/// (and so compresses well) for finite values in `[-MAX, 2.0)`, which covers
/// affinities and probabilities in `[0, 1]`. Values from `2.0` up wrap into
/// `[-MAX, -2.0]` before prediction, so they compress worse, but they still
/// decode to themselves.
///
/// # Errors
/// `UnsupportedPrecision` below 9 bits for `f32` or 12 bits for `f64`. Lossy
/// truncation would otherwise cut into the exponent and could turn finite inputs
/// into non-finite outputs.
pub fn kompress<T: FloatBits>(
    values: &[T],
    dims: Dims,
    config: &FpzkConfig,
) -> Result<Vec<u8>, FpzkError> {
    compress_with_mode(values, dims, config, CodecMode::Kempressed)
}

/// Compresses a type-erased buffer.
pub fn compress_buffer(
    values: VoxelBuffer<'_>,
    dims: Dims,
    config: &FpzkConfig,
) -> Result<Vec<u8>, FpzkError> {
    match values {
        VoxelBuffer::Float32(v) => compress(v, dims, config),
        VoxelBuffer::Float64(v) => compress(v, dims, config),
    }
}

/// Compresses raw bytes holding aligned elements of `float_type`.
///
/// A byte length that is not exactly `nvoxels` elements fails with
/// `BufferSizeMismatch`; misaligned bytes fail with `PodCast`.
pub fn compress_bytes(
    bytes: &[u8],
    float_type: FloatType,
    dims: Dims,
    config: &FpzkConfig,
) -> Result<Vec<u8>, FpzkError> {
    let nvoxels = dims.validated_len()?;
    if nvoxels.checked_mul(float_type.element_size()) != Some(bytes.len()) {
        return Err(FpzkError::size_mismatch(
            nvoxels as u64,
            bytes.len() / float_type.element_size(),
        ));
    }
    compress_buffer(VoxelBuffer::from_bytes(bytes, float_type)?, dims, config)
}

/// Compresses an array shaped `(nf, nz, ny, nx)`. Non-standard layouts are
/// copied into row-major order first.
pub fn compress_array<T: FloatBits>(
    array: ArrayView4<'_, T>,
    config: &FpzkConfig,
) -> Result<Vec<u8>, FpzkError> {
    let dims = Dims::from_shape(array.shape())?;
    let contiguous = array.as_standard_layout();
    let values = contiguous.as_slice().ok_or_else(|| {
        FpzkError::InternalError("standard-layout array is not contiguous".to_string())
    })?;
    compress(values, dims, config)
}

/// Decompresses a whole stream into a freshly allocated vector.
pub fn decompress_vec(bytes: &[u8]) -> Result<VoxelVec, FpzkError> {
    Fpzk::open(bytes)?.to_vec()
}

/// Analyzes a compressed stream without decoding its body.
pub fn analyze_stream(bytes: &[u8]) -> Result<CompressionStats, FpzkError> {
    Ok(Fpzk::open(bytes)?.stats())
}

fn compress_with_mode<T: FloatBits>(
    values: &[T],
    dims: Dims,
    config: &FpzkConfig,
    mode: CodecMode,
) -> Result<Vec<u8>, FpzkError> {
    let precision = config.resolve_precision(T::FLOAT_TYPE)?;
    let header = Header::new(T::FLOAT_TYPE, precision, dims)?;

    let mut out = Vec::with_capacity(values.len() * std::mem::size_of::<T>() / 2);
    encode_volume(values, &header, mode, &mut out)?;

    if config.enable_stats_collection {
        let stats = CompressionStats::from_header(&header, out.len());
        log::info!(
            "compressed {} voxels to {} bytes ({:.3} bits/voxel, ratio {:.2})",
            stats.nvoxels,
            stats.total_size,
            stats.bits_per_voxel,
            stats.compression_ratio
        );
        log_metric!(
            "event" = "compress",
            "mode" = format!("{:?}", mode),
            "float_type" = &stats.float_type,
            "precision" = &stats.precision,
            "nvoxels" = &stats.nvoxels,
            "total_size" = &stats.total_size
        );
    }
    Ok(out)
}
