use super::*;
use crate::config::FpzkConfig;
use crate::error::FpzkError;
use crate::kernels::bitcast::to_ordered_key;
use crate::kernels::kempress::KempressTransform;
use crate::types::{Dims, FloatType, VoxelArray, VoxelVec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A smooth 4-D field with some noise, in XYZC order.
fn smooth_volume_f32(dims: Dims, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Vec::new();
    for f in 0..dims.nf {
        for z in 0..dims.nz {
            for y in 0..dims.ny {
                for x in 0..dims.nx {
                    let base = (x as f32 * 0.3).sin() + (y as f32 * 0.2).cos() * z as f32 + f as f32;
                    values.push(base + rng.random_range(-0.01f32..0.01));
                }
            }
        }
    }
    values
}

/// A segmentation-like volume: channel 0 holds integer labels, the others hold
/// affinities in `[0, 1]` with plenty of exact zeros.
fn segmentation_volume(dims: Dims, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let plane = (dims.nx * dims.ny * dims.nz) as usize;
    let mut values = Vec::with_capacity(plane * dims.nf as usize);
    for channel in 0..dims.nf {
        for i in 0..plane {
            let value = if channel == 0 {
                (i / 7) as f32
            } else if rng.random_range(0..4) == 0 {
                0.0
            } else {
                rng.random_range(0.0f32..=1.0)
            };
            values.push(value);
        }
    }
    values
}

fn assert_bits_eq_f32(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a.to_bits(), e.to_bits(), "voxel {}: {} != {}", i, a, e);
    }
}

//==================================================================================
// Header & Accessors
//==================================================================================

#[test]
fn test_scenario_a_two_by_two_float32() {
    let bytes = compress(&[1.0f32, 2.0, 3.0, 4.0], Dims::new(2, 2, 1, 1), &FpzkConfig::lossless())
        .unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    assert_eq!(handle.nvoxels(), 4);
    assert_eq!(handle.float_type(), FloatType::Float32);
    assert_eq!(handle.type_tag(), 0);
    assert_eq!(handle.precision(), 32);
    assert_eq!((handle.nx(), handle.ny(), handle.nz(), handle.nf()), (2, 2, 1, 1));
    assert_eq!(handle.nbytes(), bytes.len() as u64);
    assert_eq!(handle.decoded_nbytes(), 16);

    let mut out = vec![0.0f32; 4];
    handle.decompress(&mut out).unwrap();
    assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_nvoxels_matches_product_of_dims() {
    let dims = Dims::new(3, 5, 2, 4);
    let values = smooth_volume_f32(dims, 1);
    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();
    assert_eq!(handle.nvoxels(), 3 * 5 * 2 * 4);
    assert_eq!(handle.dims(), dims);
    assert_eq!(handle.header().dims, dims);
}

#[test]
fn test_unknown_type_tag_fails_open() {
    let mut bytes =
        compress(&[1.0f32, 2.0], Dims::new(2, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    bytes[5] = 2;
    assert!(matches!(Fpzk::open(&bytes), Err(FpzkError::InvalidHeader(_))));
}

#[test]
fn test_open_rejects_garbage() {
    assert!(matches!(Fpzk::open(&[]), Err(FpzkError::InvalidHeader(_))));
    assert!(matches!(Fpzk::open(&[0u8; 64]), Err(FpzkError::InvalidHeader(_))));
}

//==================================================================================
// Round-trips
//==================================================================================

#[test]
fn test_lossless_roundtrip_is_bit_exact() {
    let dims = Dims::new(9, 7, 5, 2);
    let mut values = smooth_volume_f32(dims, 2);
    values[3] = f32::NAN;
    values[10] = f32::INFINITY;
    values[11] = -0.0;
    values[40] = f32::from_bits(1);
    values[41] = -f32::MAX;

    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let mut out = vec![0.0f32; values.len()];
    Fpzk::open(&bytes).unwrap().decompress(&mut out).unwrap();
    assert_bits_eq_f32(&out, &values);
}

#[test]
fn test_lossless_roundtrip_float64() {
    let dims = Dims::new(6, 6, 6, 1);
    let mut rng = StdRng::seed_from_u64(3);
    let values: Vec<f64> = (0..216)
        .map(|i| (i as f64 * 0.01).exp() + rng.random_range(-1e-9..1e-9))
        .collect();

    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();
    assert_eq!(handle.float_type(), FloatType::Float64);
    assert_eq!(handle.precision(), 64);

    match handle.to_vec().unwrap() {
        VoxelVec::Float64(out) => {
            assert!(out.iter().zip(&values).all(|(a, b)| a.to_bits() == b.to_bits()))
        }
        other => panic!("unexpected type {}", other.float_type()),
    }
}

#[test]
fn test_lossy_roundtrip_respects_precision_bound() {
    let dims = Dims::new(10, 10, 10, 1);
    let values = smooth_volume_f32(dims, 4);
    for precision in [8u8, 16, 24] {
        let bytes = compress(&values, dims, &FpzkConfig::with_precision(precision)).unwrap();
        let mut out = vec![0.0f32; values.len()];
        Fpzk::open(&bytes).unwrap().decompress(&mut out).unwrap();

        let bound = 1u64 << (32 - precision as u32);
        for (a, b) in out.iter().zip(&values) {
            assert!(to_ordered_key(*a).abs_diff(to_ordered_key(*b)) < bound);
        }
    }
}

#[test]
fn test_lower_precision_compresses_smaller() {
    let dims = Dims::new(16, 16, 8, 1);
    let values = smooth_volume_f32(dims, 5);
    let lossless = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let lossy = compress(&values, dims, &FpzkConfig::with_precision(16)).unwrap();
    assert!(lossy.len() < lossless.len());
}

#[test]
fn test_stream_reencodes_identically() {
    let dims = Dims::new(8, 8, 4, 2);
    let values = smooth_volume_f32(dims, 6);
    for config in [FpzkConfig::lossless(), FpzkConfig::with_precision(20)] {
        let first = compress(&values, dims, &config).unwrap();
        let decoded = match decompress_vec(&first).unwrap() {
            VoxelVec::Float32(v) => v,
            other => panic!("unexpected type {}", other.float_type()),
        };
        let second = compress(&decoded, dims, &config).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_decoding_is_deterministic() {
    let dims = Dims::new(12, 6, 3, 1);
    let values = smooth_volume_f32(dims, 7);
    let bytes = compress(&values, dims, &FpzkConfig::with_precision(18)).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    let mut first = vec![0.0f32; values.len()];
    let mut second = vec![1.0f32; values.len()];
    handle.decompress(&mut first).unwrap();
    handle.decompress(&mut second).unwrap();
    assert_bits_eq_f32(&first, &second);
}

#[test]
fn test_concurrent_decodes_share_one_handle() {
    let dims = Dims::new(16, 16, 4, 1);
    let values = smooth_volume_f32(dims, 8);
    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    let (handle, values) = (&handle, &values);
    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut out = vec![0.0f32; values.len()];
                    handle.decompress(&mut out).map(|()| out)
                })
            })
            .collect();
        for worker in workers {
            let out = worker.join().unwrap().unwrap();
            assert_bits_eq_f32(&out, values);
        }
    });
}

#[test]
fn test_single_voxel_volume() {
    let bytes = compress(&[42.5f64], Dims::new(1, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    assert_eq!(decompress_vec(&bytes).unwrap(), VoxelVec::Float64(vec![42.5]));
}

#[test]
fn test_to_array_shape() {
    let dims = Dims::new(5, 4, 3, 2);
    let values = smooth_volume_f32(dims, 9);
    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    match Fpzk::open(&bytes).unwrap().to_array().unwrap() {
        VoxelArray::Float32(array) => {
            assert_eq!(array.shape(), &[2, 3, 4, 5]);
            // (f=1, z=2, y=3, x=4) is the last voxel.
            assert_eq!(array[[1, 2, 3, 4]].to_bits(), values[values.len() - 1].to_bits());
        }
        other => panic!("unexpected type {}", other.float_type()),
    }
}

//==================================================================================
// Buffer Contract
//==================================================================================

#[test]
fn test_scenario_c_short_buffer_is_untouched() {
    let bytes = compress(&[1.0f32, 2.0, 3.0, 4.0], Dims::new(2, 2, 1, 1), &FpzkConfig::lossless())
        .unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    let mut short = vec![9.0f32; 3];
    let result = handle.decompress(&mut short);
    assert!(matches!(
        result,
        Err(FpzkError::BufferSizeMismatch { expected: 4, actual: 3 })
    ));
    assert_eq!(short, vec![9.0; 3]);

    let mut long = vec![9.0f32; 5];
    assert!(handle.dekompress_specialized(&mut long).is_err());
    assert_eq!(long, vec![9.0; 5]);
}

#[test]
fn test_wrong_element_type_is_type_mismatch() {
    let bytes = compress(&[1.0f32, 2.0], Dims::new(2, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    let mut out = vec![5.0f64; 2];
    let result = Fpzk::open(&bytes).unwrap().decompress(&mut out);
    assert!(matches!(
        result,
        Err(FpzkError::TypeMismatch {
            expected: FloatType::Float32,
            actual: FloatType::Float64
        })
    ));
    assert_eq!(out, vec![5.0; 2]);
}

#[test]
fn test_decompress_into_raw_bytes() {
    let values = vec![0.125f32, -7.0, 3.5, 1e-30];
    let bytes = compress(&values, Dims::new(4, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    // Backed by f32 storage so the byte view is aligned.
    let mut storage = vec![0.0f32; 4];
    handle
        .decompress_bytes(bytemuck::cast_slice_mut(&mut storage))
        .unwrap();
    assert_eq!(storage, values);

    let mut ragged = vec![0u8; 15];
    assert!(matches!(
        handle.decompress_bytes(&mut ragged),
        Err(FpzkError::BufferSizeMismatch { expected: 4, actual: 3 })
    ));
    let mut short = vec![0u8; 12];
    assert!(matches!(
        handle.decompress_bytes(&mut short),
        Err(FpzkError::BufferSizeMismatch { expected: 4, actual: 3 })
    ));
    let mut long = vec![0u8; 17];
    assert!(matches!(
        handle.dekompress_bytes(&mut long),
        Err(FpzkError::BufferSizeMismatch { expected: 4, .. })
    ));
}

#[test]
fn test_misaligned_raw_bytes_fail_pod_cast() {
    let bytes = compress(&[1.0f32, 2.0, 3.0, 4.0], Dims::new(4, 1, 1, 1), &FpzkConfig::lossless())
        .unwrap();
    let handle = Fpzk::open(&bytes).unwrap();

    // The right length, shifted one byte off the f32 alignment.
    let mut storage = vec![0.0f32; 5];
    let raw: &mut [u8] = bytemuck::cast_slice_mut(&mut storage);
    assert!(matches!(
        handle.decompress_bytes(&mut raw[1..17]),
        Err(FpzkError::PodCast(_))
    ));
}

//==================================================================================
// Corruption
//==================================================================================

#[test]
fn test_scenario_b_truncated_stream_is_corrupt() {
    let dims = Dims::new(8, 8, 2, 1);
    let values = smooth_volume_f32(dims, 10);
    let bytes = compress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let truncated = &bytes[..bytes.len() - 1];

    let handle = Fpzk::open(truncated).unwrap();
    let mut out = vec![0.0f32; values.len()];
    assert!(matches!(
        handle.decompress(&mut out),
        Err(FpzkError::CorruptStream(_))
    ));
}

#[test]
fn test_header_only_stream_is_corrupt() {
    let bytes = compress(&[1.0f32], Dims::new(1, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes[..HEADER_LEN]).unwrap();
    let mut out = vec![0.0f32; 1];
    assert!(matches!(
        handle.decompress(&mut out),
        Err(FpzkError::CorruptStream(_))
    ));
}

#[test]
fn test_trailing_garbage_is_corrupt() {
    let mut bytes =
        compress(&[1.0f32, 2.0, 3.0], Dims::new(3, 1, 1, 1), &FpzkConfig::lossless()).unwrap();
    bytes.push(0xAB);
    let mut out = vec![0.0f32; 3];
    assert!(matches!(
        Fpzk::open(&bytes).unwrap().decompress(&mut out),
        Err(FpzkError::CorruptStream(_))
    ));
}

//==================================================================================
// Kempressed Mode
//==================================================================================

#[test]
fn test_scenario_d_segmentation_with_zeros_roundtrips() {
    let dims = Dims::new(8, 6, 4, 3);
    let values = segmentation_volume(dims, 11);
    assert!(values.iter().any(|v| *v == 0.0));

    let bytes = kompress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let handle = Fpzk::open(&bytes).unwrap();
    let mut out = vec![f32::NAN; values.len()];
    handle.dekompress_specialized(&mut out).unwrap();
    assert_bits_eq_f32(&out, &values);
}

#[test]
fn test_kempressed_lossy_respects_precision_bound() {
    let dims = Dims::new(8, 8, 4, 3);
    let values = segmentation_volume(dims, 12);
    let precision = 20u8;
    let bytes = kompress(&values, dims, &FpzkConfig::with_precision(precision)).unwrap();
    let mut out = vec![0.0f32; values.len()];
    Fpzk::open(&bytes).unwrap().dekompress_specialized(&mut out).unwrap();

    let bound = 1u64 << (32 - precision as u32);
    for (a, b) in out.iter().zip(&values) {
        assert!(a.is_finite());
        assert!(to_ordered_key(*a).abs_diff(to_ordered_key(*b)) < bound, "{} vs {}", a, b);
    }
}

#[test]
fn test_kempressed_lossy_at_minimum_precision_stays_finite() {
    // Channel 0 holds labels well above 2.0, which wrap to the bottom of the range.
    let dims = Dims::new(6, 5, 3, 2);
    let mut values = segmentation_volume(dims, 15);
    values[0] = f32::MAX;
    values[1] = -f32::MAX;
    values[2] = 2.0;
    let precision = KempressTransform::min_precision::<f32>();
    let bytes = kompress(&values, dims, &FpzkConfig::with_precision(precision as u8)).unwrap();
    let mut out = vec![0.0f32; values.len()];
    Fpzk::open(&bytes).unwrap().dekompress_specialized(&mut out).unwrap();

    let bound = 1u64 << (32 - precision);
    for (a, b) in out.iter().zip(&values) {
        assert!(a.is_finite(), "{} decoded as {}", b, a);
        assert!(to_ordered_key(*a).abs_diff(to_ordered_key(*b)) < bound, "{} vs {}", a, b);
    }
}

#[test]
fn test_kompress_rejects_precision_that_cuts_the_exponent() {
    let dims = Dims::new(3, 1, 1, 1);
    let result = kompress(&[0.0f32, 2.0, 3.0], dims, &FpzkConfig::with_precision(8));
    assert!(matches!(
        result,
        Err(FpzkError::UnsupportedPrecision { precision: 8, minimum: 9, .. })
    ));
    let result = kompress(&[0.0f64, 2.0, 3.0], dims, &FpzkConfig::with_precision(11));
    assert!(matches!(
        result,
        Err(FpzkError::UnsupportedPrecision { precision: 11, minimum: 12, .. })
    ));

    // A standard stream at that precision cannot be decoded through the transform.
    let bytes = compress(&[0.0f32, 2.0, 3.0], dims, &FpzkConfig::with_precision(8)).unwrap();
    let mut out = vec![-1.0f32; 3];
    assert!(matches!(
        Fpzk::open(&bytes).unwrap().dekompress_specialized(&mut out),
        Err(FpzkError::UnsupportedPrecision { .. })
    ));
    assert_eq!(out, vec![-1.0; 3]);
}

#[test]
fn test_kempressed_f64_wide_range_is_bit_exact() {
    let dims = Dims::new(4, 3, 2, 3);
    let mut rng = StdRng::seed_from_u64(16);
    let mut values: Vec<f64> = (0..dims.nx * dims.ny * dims.nz * dims.nf)
        .map(|_| rng.random_range(-1e6f64..1e6))
        .collect();
    values[0] = 0.0;
    values[1] = -0.0;
    values[2] = f64::MAX;
    values[3] = f64::NAN;
    values[4] = f64::NEG_INFINITY;

    let bytes = kompress(&values, dims, &FpzkConfig::lossless()).unwrap();
    let mut out = vec![0.0f64; values.len()];
    Fpzk::open(&bytes).unwrap().dekompress_specialized(&mut out).unwrap();
    for (a, b) in out.iter().zip(&values) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_standard_decode_of_kompressed_stream_shows_transformed_values() {
    // A single channel keeps XYCZ == XYZC, leaving only the value transform.
    let dims = Dims::new(4, 4, 2, 1);
    let values = segmentation_volume(dims, 13);
    let bytes = kompress(&values, dims, &FpzkConfig::lossless()).unwrap();

    let transform = KempressTransform::for_type::<f32>();
    let expected: Vec<f32> = values.iter().map(|v| transform.forward(*v)).collect();
    let mut out = vec![0.0f32; values.len()];
    Fpzk::open(&bytes).unwrap().decompress(&mut out).unwrap();
    assert_bits_eq_f32(&out, &expected);
}

#[test]
fn test_kompress_reorders_channels() {
    // nx = ny = 1: XYZC index is z + nz * c, XYCZ index is c + nf * z.
    let dims = Dims::new(1, 1, 2, 3);
    let values: Vec<f64> = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
    let bytes = kompress(&values, dims, &FpzkConfig::lossless()).unwrap();

    let transform = KempressTransform::for_type::<f64>();
    let mut stored = vec![0.0f64; 6];
    Fpzk::open(&bytes).unwrap().decompress(&mut stored).unwrap();
    let untransformed: Vec<f64> = stored.iter().map(|v| transform.inverse(*v)).collect();
    assert_eq!(untransformed, vec![0.0, 0.2, 0.4, 0.1, 0.3, 0.5]);

    match Fpzk::open(&bytes).unwrap().dekompress_to_array().unwrap() {
        VoxelArray::Float64(array) => assert_eq!(array.as_slice().unwrap(), values.as_slice()),
        other => panic!("unexpected type {}", other.float_type()),
    }
}

#[test]
fn test_dekompress_into_raw_bytes() {
    let dims = Dims::new(2, 2, 2, 2);
    let values = segmentation_volume(dims, 14);
    let bytes = kompress(&values, dims, &FpzkConfig::lossless()).unwrap();

    let mut storage = vec![0.0f32; values.len()];
    Fpzk::open(&bytes)
        .unwrap()
        .dekompress_bytes(bytemuck::cast_slice_mut(&mut storage))
        .unwrap();
    assert_bits_eq_f32(&storage, &values);
}
