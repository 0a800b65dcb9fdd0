//! This module contains the adaptive binary range coder that carries every
//! residual bit of an fpzk body.
//!
//! It is a carry-less 32-bit range coder: the interval never wraps, so bytes are
//! emitted as soon as the top byte of `low` and `low + range` agree, and an
//! interval that straddles a byte boundary while getting too narrow is clipped
//! to the boundary instead of propagating a carry. Because the decoder tracks the
//! exact same `low`/`range` pair, it consumes precisely the bytes the encoder
//! produced, one-for-one and strictly in order. Running out of bytes is
//! therefore always corruption, never a request to pad.
//!
//! Probabilities come from [`BitModel`]s: two frequency counters per context,
//! updated after every symbol on both sides in lockstep.

use crate::error::FpzkError;

//==================================================================================
// 0. Constants
//==================================================================================

/// Once `low` and `low + range` agree above this, the top byte is settled.
const TOP: u32 = 1 << 24;
/// Minimum range after normalization; bounds the model total from above.
const BOT: u32 = 1 << 16;
/// Bytes written by `finish` and read up front by the decoder.
const FLUSH_BYTES: usize = 4;

/// Initial count for each symbol of a fresh model.
const MODEL_INIT: u32 = 2;
/// Count added to the observed symbol.
const MODEL_STEP: u32 = 24;
/// Counters are halved once their sum exceeds this. Must stay below `BOT`.
const MODEL_LIMIT: u32 = 1 << 13;

//==================================================================================
// 1. Adaptive Binary Model
//==================================================================================

/// Frequency counters for a single binary context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitModel {
    zeros: u32,
    ones: u32,
}

impl Default for BitModel {
    fn default() -> Self {
        Self {
            zeros: MODEL_INIT,
            ones: MODEL_INIT,
        }
    }
}

impl BitModel {
    #[inline]
    fn total(&self) -> u32 {
        self.zeros + self.ones
    }

    #[inline]
    fn update(&mut self, bit: bool) {
        if bit {
            self.ones += MODEL_STEP;
        } else {
            self.zeros += MODEL_STEP;
        }
        if self.total() > MODEL_LIMIT {
            // Rounding up keeps both counters non-zero.
            self.zeros = (self.zeros + 1) >> 1;
            self.ones = (self.ones + 1) >> 1;
        }
    }

    /// Current estimate of P(bit = 1), for diagnostics.
    pub fn probability_of_one(&self) -> f64 {
        self.ones as f64 / self.total() as f64
    }
}

//==================================================================================
// 2. Encoder
//==================================================================================

/// Range encoder appending to a caller-owned byte vector.
pub struct RangeEncoder<'a> {
    low: u32,
    range: u32,
    out: &'a mut Vec<u8>,
}

impl<'a> RangeEncoder<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self {
            low: 0,
            range: u32::MAX,
            out,
        }
    }

    /// Codes one bit under `model`, then adapts the model.
    #[inline]
    pub fn encode_bit(&mut self, bit: bool, model: &mut BitModel) {
        let step = self.range / model.total();
        let split = step * model.zeros;
        if bit {
            self.low = self.low.wrapping_add(split);
            self.range = step * model.ones;
        } else {
            self.range = split;
        }
        model.update(bit);
        self.normalize();
    }

    fn normalize(&mut self) {
        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) >= TOP {
                if self.range >= BOT {
                    break;
                }
                self.range = self.low.wrapping_neg() & (BOT - 1);
            }
            self.out.push((self.low >> 24) as u8);
            self.low <<= 8;
            self.range <<= 8;
        }
    }

    /// Flushes the final interval. The encoder must not be used afterwards.
    pub fn finish(mut self) {
        for _ in 0..FLUSH_BYTES {
            self.out.push((self.low >> 24) as u8);
            self.low <<= 8;
        }
    }
}

//==================================================================================
// 3. Decoder
//==================================================================================

/// Range decoder over a borrowed body slice.
pub struct RangeDecoder<'a> {
    low: u32,
    range: u32,
    code: u32,
    input: &'a [u8],
    position: usize,
}

impl<'a> RangeDecoder<'a> {
    /// Primes the decoder with the first four body bytes.
    pub fn new(input: &'a [u8]) -> Result<Self, FpzkError> {
        let mut decoder = Self {
            low: 0,
            range: u32::MAX,
            code: 0,
            input,
            position: 0,
        };
        for _ in 0..FLUSH_BYTES {
            decoder.code = (decoder.code << 8) | decoder.next_byte()? as u32;
        }
        Ok(decoder)
    }

    #[inline]
    fn next_byte(&mut self) -> Result<u8, FpzkError> {
        let byte = *self.input.get(self.position).ok_or_else(|| {
            FpzkError::corrupt(format!(
                "range coder starved: body exhausted after {} bytes",
                self.position
            ))
        })?;
        self.position += 1;
        Ok(byte)
    }

    /// Decodes one bit under `model`, then adapts the model exactly as the
    /// encoder did.
    #[inline]
    pub fn decode_bit(&mut self, model: &mut BitModel) -> Result<bool, FpzkError> {
        let step = self.range / model.total();
        let target = self.code.wrapping_sub(self.low) / step;
        if target >= model.total() {
            return Err(FpzkError::corrupt(format!(
                "range coder symbol out of model range near body byte {}",
                self.position
            )));
        }
        let split = step * model.zeros;
        let bit = target >= model.zeros;
        if bit {
            self.low = self.low.wrapping_add(split);
            self.range = step * model.ones;
        } else {
            self.range = split;
        }
        model.update(bit);
        self.normalize()?;
        Ok(bit)
    }

    fn normalize(&mut self) -> Result<(), FpzkError> {
        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) >= TOP {
                if self.range >= BOT {
                    return Ok(());
                }
                self.range = self.low.wrapping_neg() & (BOT - 1);
            }
            self.code = (self.code << 8) | self.next_byte()? as u32;
            self.low <<= 8;
            self.range <<= 8;
        }
    }

    /// Number of body bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// Fails if the body holds bytes the encoder never wrote.
    pub fn finish(self) -> Result<(), FpzkError> {
        let trailing = self.input.len() - self.position;
        if trailing != 0 {
            return Err(FpzkError::corrupt(format!(
                "{} trailing bytes after the last voxel",
                trailing
            )));
        }
        Ok(())
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
