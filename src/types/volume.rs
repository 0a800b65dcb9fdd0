//! Volume geometry and the typed buffers the codec reads from and writes into.
//!
//! A stream carries either `f32` or `f64` voxels, decided at runtime by the
//! header. Rather than reinterpreting raw memory, callers hand the codec one of
//! the tagged unions below, and the Voxel Assembler checks the variant against
//! the header before writing anything.

use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::error::FpzkError;
use crate::types::FloatType;
use crate::utils::{safe_bytes_to_typed_slice, safe_bytes_to_typed_slice_mut, typed_slice_to_bytes};

//==================================================================================
// 1. Dimensions
//==================================================================================

/// Extents of a 4-D voxel volume. `nx` varies fastest, `nf` slowest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
    pub nf: u32,
}

impl Dims {
    pub fn new(nx: u32, ny: u32, nz: u32, nf: u32) -> Self {
        Self { nx, ny, nz, nf }
    }

    /// `nx * ny * nz * nf`, or `None` if the product overflows `u64`.
    pub fn checked_nvoxels(&self) -> Option<u64> {
        (self.nx as u64)
            .checked_mul(self.ny as u64)?
            .checked_mul(self.nz as u64)?
            .checked_mul(self.nf as u64)
    }

    /// Validates the extents and returns the voxel count as a `usize`.
    pub(crate) fn validated_len(&self) -> Result<usize, FpzkError> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 || self.nf == 0 {
            return Err(FpzkError::invalid_header(format!(
                "zero dimension in {}x{}x{}x{}",
                self.nx, self.ny, self.nz, self.nf
            )));
        }
        self.checked_nvoxels()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                FpzkError::invalid_header(format!(
                    "voxel count of {}x{}x{}x{} does not fit in memory",
                    self.nx, self.ny, self.nz, self.nf
                ))
            })
    }

    /// Extents in traversal axis order `[x, y, z, f]`.
    pub fn extents(&self) -> [usize; 4] {
        [
            self.nx as usize,
            self.ny as usize,
            self.nz as usize,
            self.nf as usize,
        ]
    }

    /// ndarray shape `(nf, nz, ny, nx)`, i.e. row-major with `nx` innermost.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (
            self.nf as usize,
            self.nz as usize,
            self.ny as usize,
            self.nx as usize,
        )
    }

    /// Builds dims from an ndarray shape `[nf, nz, ny, nx]`.
    pub fn from_shape(shape: &[usize]) -> Result<Self, FpzkError> {
        let to_u32 = |extent: usize| {
            u32::try_from(extent).map_err(|_| {
                FpzkError::invalid_header(format!("extent {} exceeds u32::MAX", extent))
            })
        };
        match shape {
            [nf, nz, ny, nx] => Ok(Self::new(
                to_u32(*nx)?,
                to_u32(*ny)?,
                to_u32(*nz)?,
                to_u32(*nf)?,
            )),
            other => Err(FpzkError::InternalError(format!(
                "expected a 4-D shape, got {} axes",
                other.len()
            ))),
        }
    }
}

//==================================================================================
// 2. Tagged Buffers
//==================================================================================

/// A read-only voxel buffer of either element type.
#[derive(Debug, Clone, Copy)]
pub enum VoxelBuffer<'a> {
    Float32(&'a [f32]),
    Float64(&'a [f64]),
}

impl<'a> VoxelBuffer<'a> {
    /// Reinterprets a raw byte buffer as voxels of `float_type`.
    pub fn from_bytes(bytes: &'a [u8], float_type: FloatType) -> Result<Self, FpzkError> {
        Ok(match float_type {
            FloatType::Float32 => Self::Float32(safe_bytes_to_typed_slice(bytes)?),
            FloatType::Float64 => Self::Float64(safe_bytes_to_typed_slice(bytes)?),
        })
    }

    pub fn float_type(&self) -> FloatType {
        match self {
            Self::Float32(_) => FloatType::Float32,
            Self::Float64(_) => FloatType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(s) => s.len(),
            Self::Float64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a [f32]> for VoxelBuffer<'a> {
    fn from(slice: &'a [f32]) -> Self {
        Self::Float32(slice)
    }
}

impl<'a> From<&'a [f64]> for VoxelBuffer<'a> {
    fn from(slice: &'a [f64]) -> Self {
        Self::Float64(slice)
    }
}

/// A caller-owned, mutable destination of either element type.
#[derive(Debug)]
pub enum VoxelBufferMut<'a> {
    Float32(&'a mut [f32]),
    Float64(&'a mut [f64]),
}

impl<'a> VoxelBufferMut<'a> {
    /// Reinterprets a raw byte buffer as voxels of `float_type`.
    ///
    /// Fails with `PodCast` when the bytes are not a whole number of elements
    /// or are not aligned for the element type.
    pub fn from_bytes(bytes: &'a mut [u8], float_type: FloatType) -> Result<Self, FpzkError> {
        Ok(match float_type {
            FloatType::Float32 => Self::Float32(safe_bytes_to_typed_slice_mut(bytes)?),
            FloatType::Float64 => Self::Float64(safe_bytes_to_typed_slice_mut(bytes)?),
        })
    }

    pub fn float_type(&self) -> FloatType {
        match self {
            Self::Float32(_) => FloatType::Float32,
            Self::Float64(_) => FloatType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(s) => s.len(),
            Self::Float64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a mut [f32]> for VoxelBufferMut<'a> {
    fn from(slice: &'a mut [f32]) -> Self {
        Self::Float32(slice)
    }
}

impl<'a> From<&'a mut [f64]> for VoxelBufferMut<'a> {
    fn from(slice: &'a mut [f64]) -> Self {
        Self::Float64(slice)
    }
}

impl<'a> From<&'a mut Vec<f32>> for VoxelBufferMut<'a> {
    fn from(vec: &'a mut Vec<f32>) -> Self {
        Self::Float32(vec.as_mut_slice())
    }
}

impl<'a> From<&'a mut Vec<f64>> for VoxelBufferMut<'a> {
    fn from(vec: &'a mut Vec<f64>) -> Self {
        Self::Float64(vec.as_mut_slice())
    }
}

//==================================================================================
// 3. Owned Results
//==================================================================================

/// An owned, flat decode result in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelVec {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl VoxelVec {
    pub(crate) fn zeroed(float_type: FloatType, len: usize) -> Self {
        match float_type {
            FloatType::Float32 => Self::Float32(vec![0.0; len]),
            FloatType::Float64 => Self::Float64(vec![0.0; len]),
        }
    }

    pub(crate) fn as_buffer_mut(&mut self) -> VoxelBufferMut<'_> {
        match self {
            Self::Float32(v) => VoxelBufferMut::Float32(v),
            Self::Float64(v) => VoxelBufferMut::Float64(v),
        }
    }

    /// The voxels as raw bytes in native byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Float32(v) => typed_slice_to_bytes(v),
            Self::Float64(v) => typed_slice_to_bytes(v),
        }
    }

    pub fn float_type(&self) -> FloatType {
        match self {
            Self::Float32(_) => FloatType::Float32,
            Self::Float64(_) => FloatType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An owned decode result shaped `(nf, nz, ny, nx)`.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelArray {
    Float32(Array4<f32>),
    Float64(Array4<f64>),
}

impl VoxelArray {
    pub(crate) fn zeroed(float_type: FloatType, dims: &Dims) -> Self {
        match float_type {
            FloatType::Float32 => Self::Float32(Array4::zeros(dims.shape())),
            FloatType::Float64 => Self::Float64(Array4::zeros(dims.shape())),
        }
    }

    /// Borrows the array's contiguous storage as a decode destination.
    pub(crate) fn as_buffer_mut(&mut self) -> Result<VoxelBufferMut<'_>, FpzkError> {
        let not_contiguous =
            || FpzkError::InternalError("freshly allocated array is not contiguous".to_string());
        Ok(match self {
            Self::Float32(a) => VoxelBufferMut::Float32(a.as_slice_mut().ok_or_else(not_contiguous)?),
            Self::Float64(a) => VoxelBufferMut::Float64(a.as_slice_mut().ok_or_else(not_contiguous)?),
        })
    }

    pub fn float_type(&self) -> FloatType {
        match self {
            Self::Float32(_) => FloatType::Float32,
            Self::Float64(_) => FloatType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float32(a) => a.shape(),
            Self::Float64(a) => a.shape(),
        }
    }
}
