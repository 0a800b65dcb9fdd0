// In: src/volume_pipeline/encoder.rs

//! The encode side of the codec: turns a typed voxel slice into a header plus a
//! range-coded residual body.

use crate::bridge::format::Header;
use crate::error::FpzkError;
use crate::kernels::bitcast::{encode_value, to_ordered_key, truncate_key};
use crate::kernels::bitplane::{encode_residual, PlaneModels, Residual};
use crate::kernels::kempress::{ChannelPlaneLayout, KempressTransform};
use crate::kernels::lorenzo::PredictorState;
use crate::kernels::range_coder::RangeEncoder;
use crate::traits::FloatBits;
use crate::volume_pipeline::CodecMode;

/// Appends `header` and the compressed body for `values` to `out`.
///
/// `values` must be in XYZC order and hold exactly `header.nvoxels()` elements.
pub fn encode_volume<T: FloatBits>(
    values: &[T],
    header: &Header,
    mode: CodecMode,
    out: &mut Vec<u8>,
) -> Result<(), FpzkError> {
    if header.float_type != T::FLOAT_TYPE {
        return Err(FpzkError::TypeMismatch {
            expected: header.float_type,
            actual: T::FLOAT_TYPE,
        });
    }
    let nvoxels = header.dims.validated_len()?;
    if values.len() != nvoxels {
        return Err(FpzkError::size_mismatch(nvoxels as u64, values.len()));
    }
    if mode == CodecMode::Kempressed {
        KempressTransform::check_precision::<T>(header.precision)?;
    }

    let precision = header.precision;
    log::debug!(
        "encoding {} voxels ({}, {}-bit keys, {:?})",
        nvoxels,
        header.float_type,
        precision,
        mode
    );

    header.write_to(out);
    match mode {
        CodecMode::Standard => {
            let keys = values.iter().map(|&v| encode_value(v, precision));
            encode_keys(header, keys, out);
        }
        CodecMode::Kempressed => {
            let transform = KempressTransform::for_type::<T>();
            let layout = ChannelPlaneLayout::new(header.dims.extents());
            let keys = (0..nvoxels).map(|stored| {
                let value = values[layout.logical_index(stored)];
                let key = transform.forward_key(to_ordered_key(value));
                truncate_key(key, T::BITS, precision)
            });
            encode_keys(header, keys, out);
        }
    }
    Ok(())
}

/// Codes `keys` (p-bit, in storage order) as a residual body appended to `out`.
fn encode_keys(header: &Header, keys: impl Iterator<Item = u64>, out: &mut Vec<u8>) {
    let precision = header.precision;
    let mut predictor = PredictorState::new(header.dims.extents(), precision);
    let mut models = PlaneModels::new(precision);
    let mut encoder = RangeEncoder::new(out);

    for key in keys {
        let predicted = predictor.predict();
        encode_residual(&mut encoder, &mut models, Residual::between(key, predicted));
        predictor.push(key);
    }
    encoder.finish();
}
