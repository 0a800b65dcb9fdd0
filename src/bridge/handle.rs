// In: src/bridge/handle.rs

//! The `Fpzk` handle: an immutable view over one compressed stream.
//!
//! `open` parses and validates the header and nothing else. Every decode method
//! then runs a complete, independent decode call with its own predictor and
//! range-coder state, so a handle can be decoded any number of times, and
//! handles can be shared freely across threads.

use crate::bridge::format::{CompressionStats, Header};
use crate::error::FpzkError;
use crate::types::{Dims, FloatType, VoxelArray, VoxelBufferMut, VoxelVec};
use crate::volume_pipeline::decoder::decode_volume;
use crate::volume_pipeline::CodecMode;

#[derive(Debug, Clone, Copy)]
pub struct Fpzk<'a> {
    stream: &'a [u8],
    header: Header,
}

impl<'a> Fpzk<'a> {
    /// Parses the header of `stream`. The body is not read until a decode call.
    ///
    /// # Errors
    /// `InvalidHeader` for a short stream, bad magic or version, an unknown type
    /// tag, or a zero or overflowing dimension; `UnsupportedPrecision` for a
    /// precision outside the element type's range.
    pub fn open(stream: &'a [u8]) -> Result<Self, FpzkError> {
        let header = Header::parse(stream).map_err(|err| {
            log::warn!("rejecting {}-byte stream: {}", stream.len(), err);
            err
        })?;
        log::debug!(
            "opened fpzk stream: {} {}x{}x{}x{} at {} bits, {} bytes",
            header.float_type,
            header.dims.nx,
            header.dims.ny,
            header.dims.nz,
            header.dims.nf,
            header.precision,
            stream.len()
        );
        Ok(Self { stream, header })
    }

    //==============================================================================
    // Accessors
    //==============================================================================

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Total length of the compressed stream in bytes.
    pub fn nbytes(&self) -> u64 {
        self.stream.len() as u64
    }

    /// Size of the decoded volume in bytes.
    pub fn decoded_nbytes(&self) -> u64 {
        self.nvoxels()
            .saturating_mul(self.header.float_type.element_size() as u64)
    }

    pub fn nvoxels(&self) -> u64 {
        self.header.nvoxels()
    }

    pub fn float_type(&self) -> FloatType {
        self.header.float_type
    }

    /// The raw header type tag: `0` for Float32, `1` for Float64.
    pub fn type_tag(&self) -> u8 {
        self.header.float_type.tag()
    }

    pub fn precision(&self) -> u32 {
        self.header.precision
    }

    pub fn dims(&self) -> Dims {
        self.header.dims
    }

    pub fn nx(&self) -> u32 {
        self.header.dims.nx
    }

    pub fn ny(&self) -> u32 {
        self.header.dims.ny
    }

    pub fn nz(&self) -> u32 {
        self.header.dims.nz
    }

    pub fn nf(&self) -> u32 {
        self.header.dims.nf
    }

    /// Size breakdown of the stream, from the header alone.
    pub fn stats(&self) -> CompressionStats {
        CompressionStats::from_header(&self.header, self.stream.len())
    }

    //==============================================================================
    // Decoding
    //==============================================================================

    /// Standard decode into a caller-owned buffer of exactly `nvoxels` elements.
    ///
    /// The buffer is checked for size (`BufferSizeMismatch`) and element type
    /// (`TypeMismatch`) before it is touched. On `CorruptStream` its contents are
    /// unspecified.
    pub fn decompress<'b>(&self, dst: impl Into<VoxelBufferMut<'b>>) -> Result<(), FpzkError> {
        decode_volume(self.stream, dst.into(), CodecMode::Standard)
    }

    /// Decode of a stream produced by `kompress`: the inverse domain transform is
    /// applied and the voxels are restored to XYZC order.
    ///
    /// Streams below the transform's minimum precision (9 bits for `f32`, 12 for
    /// `f64`) fail with `UnsupportedPrecision` before `dst` is touched.
    pub fn dekompress_specialized<'b>(
        &self,
        dst: impl Into<VoxelBufferMut<'b>>,
    ) -> Result<(), FpzkError> {
        decode_volume(self.stream, dst.into(), CodecMode::Kempressed)
    }

    /// Like [`decompress`](Self::decompress), into raw bytes holding elements of
    /// the header's type.
    ///
    /// # Errors
    /// `BufferSizeMismatch` unless `dst` is exactly `decoded_nbytes()` long, with
    /// `actual` counting the whole elements it could hold. `PodCast` if the bytes
    /// are not aligned for the element type.
    pub fn decompress_bytes(&self, dst: &mut [u8]) -> Result<(), FpzkError> {
        let dst = self.byte_destination(dst)?;
        self.decompress(dst)
    }

    /// Like [`dekompress_specialized`](Self::dekompress_specialized), into raw bytes.
    pub fn dekompress_bytes(&self, dst: &mut [u8]) -> Result<(), FpzkError> {
        let dst = self.byte_destination(dst)?;
        self.dekompress_specialized(dst)
    }

    fn byte_destination<'b>(&self, dst: &'b mut [u8]) -> Result<VoxelBufferMut<'b>, FpzkError> {
        if dst.len() as u64 != self.decoded_nbytes() {
            let element_size = self.header.float_type.element_size();
            return Err(FpzkError::size_mismatch(self.nvoxels(), dst.len() / element_size));
        }
        VoxelBufferMut::from_bytes(dst, self.header.float_type)
    }

    /// Standard decode into a freshly allocated flat vector.
    pub fn to_vec(&self) -> Result<VoxelVec, FpzkError> {
        let len = self.header.dims.validated_len()?;
        let mut out = VoxelVec::zeroed(self.header.float_type, len);
        self.decompress(out.as_buffer_mut())?;
        Ok(out)
    }

    /// Standard decode into an array shaped `(nf, nz, ny, nx)`.
    pub fn to_array(&self) -> Result<VoxelArray, FpzkError> {
        let mut array = VoxelArray::zeroed(self.header.float_type, &self.header.dims);
        self.decompress(array.as_buffer_mut()?)?;
        Ok(array)
    }

    /// Specialized decode into an array shaped `(nf, nz, ny, nx)`.
    pub fn dekompress_to_array(&self) -> Result<VoxelArray, FpzkError> {
        let mut array = VoxelArray::zeroed(self.header.float_type, &self.header.dims);
        self.dekompress_specialized(array.as_buffer_mut()?)?;
        Ok(array)
    }
}
