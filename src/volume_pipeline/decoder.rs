// In: src/volume_pipeline/decoder.rs

//! The decode side of the codec and its per-call state machine.
//!
//! Every decode call owns a fresh [`DecodeSession`], which moves through
//! `Unopened -> HeaderParsed -> Decoding -> Complete`. The first error moves it
//! to `Failed`, which is terminal. The predictor and range coder state live only
//! inside `Decoding` and are dropped with the session.

use crate::bridge::format::{Header, HEADER_LEN};
use crate::error::FpzkError;
use crate::kernels::bitcast::width_mask;
use crate::kernels::bitplane::{decode_residual, PlaneModels};
use crate::kernels::lorenzo::PredictorState;
use crate::kernels::range_coder::RangeDecoder;
use crate::traits::FloatBits;
use crate::types::{FloatType, VoxelBufferMut};
use crate::volume_pipeline::assembler::VoxelAssembler;
use crate::volume_pipeline::CodecMode;

//==================================================================================
// 1. State Machine
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePhase {
    Unopened,
    HeaderParsed,
    Decoding,
    Complete,
    Failed,
}

impl DecodePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodePhase::Complete | DecodePhase::Failed)
    }
}

/// One decode call over a borrowed stream.
#[derive(Debug)]
pub struct DecodeSession<'a> {
    stream: &'a [u8],
    header: Option<Header>,
    phase: DecodePhase,
}

impl<'a> DecodeSession<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            header: None,
            phase: DecodePhase::Unopened,
        }
    }

    pub fn phase(&self) -> DecodePhase {
        self.phase
    }

    fn transition(&mut self, next: DecodePhase) {
        debug_assert!(!self.phase.is_terminal(), "transition out of {:?}", self.phase);
        log::trace!("decode session: {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Moves to `Failed` and hands the error back for propagation.
    pub fn fail(&mut self, err: FpzkError) -> FpzkError {
        if !self.phase.is_terminal() {
            log::warn!("decode failed during {:?}: {}", self.phase, err);
            self.transition(DecodePhase::Failed);
        }
        err
    }

    pub fn parse_header(&mut self) -> Result<Header, FpzkError> {
        if self.phase != DecodePhase::Unopened {
            return Err(self.fail(FpzkError::InternalError(format!(
                "header parse requested in phase {:?}",
                self.phase
            ))));
        }
        match Header::parse(self.stream) {
            Ok(header) => {
                self.header = Some(header);
                self.transition(DecodePhase::HeaderParsed);
                Ok(header)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Decodes every voxel, handing `(stored_index, p_bit_key)` to `sink` in
    /// storage order.
    pub fn decode_keys<F: FnMut(usize, u64)>(&mut self, mut sink: F) -> Result<(), FpzkError> {
        let header = match (self.phase, self.header) {
            (DecodePhase::HeaderParsed, Some(header)) => header,
            _ => {
                return Err(self.fail(FpzkError::InternalError(format!(
                    "body decode requested in phase {:?}",
                    self.phase
                ))))
            }
        };
        self.transition(DecodePhase::Decoding);
        match self.run_body(&header, &mut sink) {
            Ok(()) => {
                self.transition(DecodePhase::Complete);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn run_body<F: FnMut(usize, u64)>(&self, header: &Header, sink: &mut F) -> Result<(), FpzkError> {
        let body = self.stream.get(HEADER_LEN..).ok_or_else(|| {
            FpzkError::InternalError("stream shorter than a parsed header".to_string())
        })?;
        let nvoxels = header.dims.validated_len()?;
        let precision = header.precision;
        let mask = width_mask(precision);

        let mut decoder = RangeDecoder::new(body)?;
        let mut models = PlaneModels::new(precision);
        let mut predictor = PredictorState::new(header.dims.extents(), precision);

        for _ in 0..nvoxels {
            let stored = predictor.position();
            let predicted = predictor.predict();
            let residual = decode_residual(&mut decoder, &mut models)?;
            let key = residual.apply(predicted, mask).ok_or_else(|| {
                FpzkError::corrupt(format!(
                    "voxel {} reconstructs outside the {}-bit key domain",
                    stored, precision
                ))
            })?;
            predictor.push(key);
            sink(stored, key);
        }
        log::trace!("body fully decoded after {} bytes", decoder.consumed());
        decoder.finish()
    }
}

//==================================================================================
// 2. Public Entry Point
//==================================================================================

/// Decodes `stream` into `dst`, validating everything before any voxel is written.
pub fn decode_volume(
    stream: &[u8],
    dst: VoxelBufferMut<'_>,
    mode: CodecMode,
) -> Result<(), FpzkError> {
    let mut session = DecodeSession::new(stream);
    let header = session.parse_header()?;
    log::debug!(
        "decoding {} voxels ({}, {}-bit keys, {:?}) from {} bytes",
        header.nvoxels(),
        header.float_type,
        header.precision,
        mode,
        stream.len()
    );
    let result = match header.float_type {
        FloatType::Float32 => decode_typed::<f32>(&mut session, &header, dst, mode),
        FloatType::Float64 => decode_typed::<f64>(&mut session, &header, dst, mode),
    };
    log::debug!("decode session ended in {:?}", session.phase());
    result
}

fn decode_typed<T: FloatBits>(
    session: &mut DecodeSession<'_>,
    header: &Header,
    dst: VoxelBufferMut<'_>,
    mode: CodecMode,
) -> Result<(), FpzkError> {
    let mut assembler = match VoxelAssembler::<T>::new(dst, header, mode) {
        Ok(assembler) => assembler,
        Err(err) => return Err(session.fail(err)),
    };
    session.decode_keys(|stored, key| assembler.place(stored, key))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
