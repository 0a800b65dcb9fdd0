//! This module contains the per-voxel bit-plane residual coder.
//!
//! A residual is a sign and a magnitude below `2^precision`. Its magnitude is
//! coded most-significant plane first in three phases:
//!
//! 1. **Significance**: one symbol per plane, from `precision - 1` downwards,
//!    answering "is the leading one bit at this plane?". The scan stops at the
//!    first yes. If every plane says no, the residual is zero and the voxel is
//!    done.
//! 2. **Sign**: one symbol, only for non-zero residuals.
//! 3. **Refinement**: the planes below the leading one, one symbol each.
//!
//! The encoder and decoder walk the same [`PlaneCursor`]. Its `next_symbol` is
//! the one stopping predicate both sides share, so they can never disagree about
//! how many symbols a voxel owns.

use crate::error::FpzkError;
use crate::kernels::range_coder::{BitModel, RangeDecoder, RangeEncoder};

//==================================================================================
// 1. Residuals
//==================================================================================

/// Signed difference between an actual and a predicted encoded-domain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Residual {
    pub negative: bool,
    pub magnitude: u64,
}

impl Residual {
    /// `actual - predicted`, without wrapping.
    #[inline]
    pub fn between(actual: u64, predicted: u64) -> Self {
        if actual >= predicted {
            Self {
                negative: false,
                magnitude: actual - predicted,
            }
        } else {
            Self {
                negative: true,
                magnitude: predicted - actual,
            }
        }
    }

    /// Applies the residual to `predicted`. Returns `None` if the result leaves
    /// `[0, mask]`, which no encoder can produce.
    #[inline]
    pub fn apply(self, predicted: u64, mask: u64) -> Option<u64> {
        let value = if self.negative {
            predicted.checked_sub(self.magnitude)?
        } else {
            predicted.checked_add(self.magnitude)?
        };
        (value <= mask).then_some(value)
    }
}

//==================================================================================
// 2. The Shared Plane Walk
//==================================================================================

/// The next symbol a voxel needs coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSymbol {
    Significance { plane: u32 },
    Sign { lead: u32 },
    Refinement { plane: u32 },
}

impl PlaneSymbol {
    /// The bit `residual` contributes for this symbol (encoder side).
    #[inline]
    pub fn bit_of(&self, residual: &Residual) -> bool {
        match *self {
            // Higher planes are known zero, so "leading one here" is just this bit.
            PlaneSymbol::Significance { plane } => (residual.magnitude >> plane) & 1 == 1,
            PlaneSymbol::Sign { .. } => residual.negative,
            PlaneSymbol::Refinement { plane } => (residual.magnitude >> plane) & 1 == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Significance,
    Sign,
    Refinement,
    Done,
}

/// Walks one voxel's planes, accumulating the residual as bits arrive.
#[derive(Debug, Clone)]
pub struct PlaneCursor {
    phase: Phase,
    plane: u32,
    lead: Option<u32>,
    residual: Residual,
}

impl PlaneCursor {
    pub fn new(precision: u32) -> Self {
        Self {
            phase: if precision == 0 {
                Phase::Done
            } else {
                Phase::Significance
            },
            plane: precision.saturating_sub(1),
            lead: None,
            residual: Residual::default(),
        }
    }

    /// The next symbol to code, or `None` once the residual is fully determined.
    #[inline]
    pub fn next_symbol(&self) -> Option<PlaneSymbol> {
        match self.phase {
            Phase::Significance => Some(PlaneSymbol::Significance { plane: self.plane }),
            Phase::Sign => self.lead.map(|lead| PlaneSymbol::Sign { lead }),
            Phase::Refinement => Some(PlaneSymbol::Refinement { plane: self.plane }),
            Phase::Done => None,
        }
    }

    /// Consumes the bit for the symbol last returned by `next_symbol`.
    #[inline]
    pub fn advance(&mut self, bit: bool) {
        match self.phase {
            Phase::Significance => {
                if bit {
                    self.lead = Some(self.plane);
                    self.residual.magnitude = 1u64 << self.plane;
                    self.phase = Phase::Sign;
                } else if self.plane == 0 {
                    self.phase = Phase::Done;
                } else {
                    self.plane -= 1;
                }
            }
            Phase::Sign => {
                self.residual.negative = bit;
                match self.lead {
                    Some(lead) if lead > 0 => {
                        self.plane = lead - 1;
                        self.phase = Phase::Refinement;
                    }
                    _ => self.phase = Phase::Done,
                }
            }
            Phase::Refinement => {
                if bit {
                    self.residual.magnitude |= 1u64 << self.plane;
                }
                if self.plane == 0 {
                    self.phase = Phase::Done;
                } else {
                    self.plane -= 1;
                }
            }
            Phase::Done => {}
        }
    }

    pub fn lead(&self) -> Option<u32> {
        self.lead
    }

    pub fn residual(&self) -> Residual {
        self.residual
    }
}

//==================================================================================
// 3. Plane Models
//==================================================================================

/// Where a significance plane sits relative to the previous voxel's leading plane.
const SIGNIFICANCE_CONTEXTS: usize = 3;

/// Adaptive models for every plane, plus the one-voxel history that selects
/// the significance context.
#[derive(Debug, Clone)]
pub struct PlaneModels {
    precision: u32,
    significance: Vec<BitModel>,
    sign: Vec<BitModel>,
    refinement: Vec<BitModel>,
    last_lead: Option<u32>,
}

impl PlaneModels {
    pub fn new(precision: u32) -> Self {
        let planes = precision as usize;
        Self {
            precision,
            significance: vec![BitModel::default(); planes * SIGNIFICANCE_CONTEXTS],
            sign: vec![BitModel::default(); planes],
            refinement: vec![BitModel::default(); planes],
            last_lead: None,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[inline]
    fn model_for(&mut self, symbol: PlaneSymbol) -> &mut BitModel {
        match symbol {
            PlaneSymbol::Significance { plane } => {
                let context = match self.last_lead {
                    Some(last) if plane < last => 2,
                    Some(last) if plane == last => 1,
                    _ => 0,
                };
                &mut self.significance[plane as usize * SIGNIFICANCE_CONTEXTS + context]
            }
            PlaneSymbol::Sign { lead } => &mut self.sign[lead as usize],
            PlaneSymbol::Refinement { plane } => &mut self.refinement[plane as usize],
        }
    }

    #[inline]
    fn finish_voxel(&mut self, lead: Option<u32>) {
        self.last_lead = lead;
    }
}

//==================================================================================
// 4. Public API
//==================================================================================

/// Codes one voxel's residual. `residual.magnitude` must be below `2^precision`.
pub fn encode_residual(encoder: &mut RangeEncoder<'_>, models: &mut PlaneModels, residual: Residual) {
    debug_assert!(
        models.precision == 64 || residual.magnitude >> models.precision == 0,
        "residual magnitude exceeds precision"
    );
    let mut cursor = PlaneCursor::new(models.precision);
    while let Some(symbol) = cursor.next_symbol() {
        let bit = symbol.bit_of(&residual);
        encoder.encode_bit(bit, models.model_for(symbol));
        cursor.advance(bit);
    }
    debug_assert_eq!(cursor.residual().magnitude, residual.magnitude);
    models.finish_voxel(cursor.lead());
}

/// Decodes one voxel's residual, mirroring `encode_residual` symbol for symbol.
pub fn decode_residual(
    decoder: &mut RangeDecoder<'_>,
    models: &mut PlaneModels,
) -> Result<Residual, FpzkError> {
    let mut cursor = PlaneCursor::new(models.precision);
    while let Some(symbol) = cursor.next_symbol() {
        let bit = decoder.decode_bit(models.model_for(symbol))?;
        cursor.advance(bit);
    }
    models.finish_voxel(cursor.lead());
    Ok(cursor.residual())
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
