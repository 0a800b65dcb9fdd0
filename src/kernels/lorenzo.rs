//! This module contains the causal 4-D Lorenzo predictor.
//!
//! Voxels are visited in storage order (`f`, `z`, `y`, `x` from outermost to
//! innermost). The prediction for a voxel is the inclusion–exclusion sum over
//! its already-visited corner neighbors:
//!
//! ```text
//! pred(i) = Σ_{S ⊆ {x,y,z,f}, S ≠ ∅} (-1)^(|S|+1) · v(i - e_S)
//! ```
//!
//! which is exact for any function that is multilinear in the coordinates.
//! A neighbor that would sit at index `-1` on any axis contributes zero.
//!
//! All arithmetic is wrapping integer arithmetic on encoded-domain keys, reduced
//! modulo `2^precision`, so predictions are identical on every platform.

use std::sync::OnceLock;

use crate::kernels::bitcast::width_mask;

//==================================================================================
// 1. Stencil
//==================================================================================

/// Number of axes the predictor spans.
pub const AXES: usize = 4;

/// One neighbor of the Lorenzo stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilTerm {
    /// Bit `a` set means the neighbor is one step back along axis `a`.
    pub axes: u8,
    /// `true` for odd-sized axis subsets.
    pub positive: bool,
}

impl StencilTerm {
    #[inline]
    fn steps_back(&self, axis: usize) -> bool {
        self.axes & (1u8 << axis) != 0
    }
}

static STENCIL: OnceLock<Vec<StencilTerm>> = OnceLock::new();

/// The fifteen non-empty axis subsets with their signs, built once per process.
pub fn stencil() -> &'static [StencilTerm] {
    STENCIL.get_or_init(|| {
        (1u8..(1 << AXES))
            .map(|axes| StencilTerm {
                axes,
                positive: axes.count_ones() % 2 == 1,
            })
            .collect()
    })
}

//==================================================================================
// 2. Predictor State
//==================================================================================

/// Per-call scratch holding the most recent keys needed for prediction.
///
/// The ring buffer is as long as the furthest neighbor offset. Axes with an
/// extent of one never contribute, so a 3-D volume only keeps one `x`/`y` slab
/// plus a row plus one voxel.
#[derive(Debug)]
pub struct PredictorState {
    extents: [usize; AXES],
    coord: [usize; AXES],
    /// Each live stencil term with its linear offset.
    terms: Vec<(StencilTerm, usize)>,
    ring: Vec<u64>,
    position: usize,
    mask: u64,
}

impl PredictorState {
    /// `extents` is `[nx, ny, nz, nf]`; every extent must be non-zero.
    pub fn new(extents: [usize; AXES], precision: u32) -> Self {
        let mut strides = [1usize; AXES];
        for axis in 1..AXES {
            strides[axis] = strides[axis - 1] * extents[axis - 1];
        }

        let active = |axis: usize| extents[axis] > 1;
        let terms: Vec<(StencilTerm, usize)> = stencil()
            .iter()
            .filter(|term| (0..AXES).all(|a| !term.steps_back(a) || active(a)))
            .map(|term| {
                let offset = (0..AXES)
                    .filter(|&a| term.steps_back(a))
                    .map(|a| strides[a])
                    .sum::<usize>();
                (*term, offset)
            })
            .collect();

        let window = terms.iter().map(|&(_, offset)| offset).max().unwrap_or(0).max(1);

        Self {
            extents,
            coord: [0; AXES],
            terms,
            ring: vec![0; window],
            position: 0,
            mask: width_mask(precision),
        }
    }

    /// Predicts the key of the next voxel in traversal order.
    #[inline]
    pub fn predict(&self) -> u64 {
        let window = self.ring.len();
        let mut prediction = 0u64;
        for &(term, offset) in &self.terms {
            let on_boundary = (0..AXES).any(|a| term.steps_back(a) && self.coord[a] == 0);
            if on_boundary {
                continue;
            }
            let neighbor = self.ring[(self.position - offset) % window];
            prediction = if term.positive {
                prediction.wrapping_add(neighbor)
            } else {
                prediction.wrapping_sub(neighbor)
            };
        }
        prediction & self.mask
    }

    /// Records the reconstructed key of the current voxel and steps to the next.
    #[inline]
    pub fn push(&mut self, key: u64) {
        let window = self.ring.len();
        self.ring[self.position % window] = key;
        self.position += 1;
        for axis in 0..AXES {
            self.coord[axis] += 1;
            if self.coord[axis] < self.extents[axis] {
                break;
            }
            self.coord[axis] = 0;
        }
    }

    /// Linear index of the voxel about to be predicted.
    pub fn position(&self) -> usize {
        self.position
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
