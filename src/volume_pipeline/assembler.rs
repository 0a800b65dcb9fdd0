// In: src/volume_pipeline/assembler.rs

//! The Voxel Assembler: validates the caller's destination against the header,
//! then writes each reconstructed key into its final position.

use crate::bridge::format::Header;
use crate::error::FpzkError;
use crate::kernels::bitcast::{from_ordered_key, widen_key};
use crate::kernels::kempress::{ChannelPlaneLayout, KempressTransform};
use crate::traits::FloatBits;
use crate::types::VoxelBufferMut;
use crate::volume_pipeline::CodecMode;

#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Storage order is the output order.
    Direct,
    /// Undo the kempress transform and scatter XYCZ back to XYZC.
    Dekempress {
        transform: KempressTransform,
        layout: ChannelPlaneLayout,
    },
}

pub struct VoxelAssembler<'a, T: FloatBits> {
    dst: &'a mut [T],
    precision: u32,
    placement: Placement,
}

impl<'a, T: FloatBits> VoxelAssembler<'a, T> {
    /// Checks the buffer's element count, then its element type, then (for the
    /// kempressed mode) the stream precision. Nothing is written to `dst` if any
    /// check fails.
    pub fn new(dst: VoxelBufferMut<'a>, header: &Header, mode: CodecMode) -> Result<Self, FpzkError> {
        let nvoxels = header.nvoxels();
        if dst.len() as u64 != nvoxels {
            return Err(FpzkError::size_mismatch(nvoxels, dst.len()));
        }
        if dst.float_type() != header.float_type {
            return Err(FpzkError::TypeMismatch {
                expected: header.float_type,
                actual: dst.float_type(),
            });
        }
        let dst = T::unwrap_mut(dst).ok_or_else(|| {
            FpzkError::InternalError(format!(
                "assembler instantiated for {} but header declares {}",
                T::FLOAT_TYPE,
                header.float_type
            ))
        })?;

        let placement = match mode {
            CodecMode::Standard => Placement::Direct,
            CodecMode::Kempressed => {
                KempressTransform::check_precision::<T>(header.precision)?;
                Placement::Dekempress {
                    transform: KempressTransform::for_type::<T>(),
                    layout: ChannelPlaneLayout::new(header.dims.extents()),
                }
            }
        };
        Ok(Self {
            dst,
            precision: header.precision,
            placement,
        })
    }

    /// Writes the voxel stored at `stored` with p-bit key `key`.
    #[inline]
    pub fn place(&mut self, stored: usize, key: u64) {
        let full = widen_key(key, T::BITS, self.precision);
        match self.placement {
            Placement::Direct => self.dst[stored] = from_ordered_key(full),
            Placement::Dekempress { transform, layout } => {
                self.dst[layout.logical_index(stored)] = from_ordered_key(transform.inverse_key(full));
            }
        }
    }
}
