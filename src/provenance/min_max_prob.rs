//! Min-max probability provenance: cheap fuzzy confidence scores.
//!
//! `add = max` (best alternative), `mult = min` (weakest link). Not a true
//! probability — overlapping derivations are not combined — but idempotent,
//! so it converges exactly and fast. The go-to algebra when a confidence
//! ranking is enough and the exact-probability machinery is overkill.

use super::{DynInputTag, Provenance};

/// Provenance over the fuzzy semiring ([0,1], max, min).
#[derive(Debug, Clone, Copy)]
pub struct MinMaxProbProvenance {
    /// Facts with probability at or below this floor are discarded early
    /// when the session enables early discard. 0.0 disables the floor.
    pub discard_floor: f64,
}

impl Default for MinMaxProbProvenance {
    fn default() -> Self {
        Self { discard_floor: 0.0 }
    }
}

impl MinMaxProbProvenance {
    /// An instance that discards facts at or below `floor`.
    pub fn with_discard_floor(floor: f64) -> Self {
        Self {
            discard_floor: floor,
        }
    }
}

impl Provenance for MinMaxProbProvenance {
    type InputTag = f64;
    type Tag = f64;
    type OutputTag = f64;

    fn name(&self) -> &'static str {
        "minmaxprob"
    }

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn add(&self, t1: &f64, t2: &f64) -> f64 {
        t1.max(*t2)
    }

    fn mult(&self, t1: &f64, t2: &f64) -> f64 {
        t1.min(*t2)
    }

    fn negate(&self, t: &f64) -> Option<f64> {
        Some(1.0 - t)
    }

    fn tagging_fn(&mut self, input: Option<f64>) -> f64 {
        input.unwrap_or(1.0)
    }

    fn tagging_dyn(&mut self, tag: &DynInputTag) -> f64 {
        match tag {
            DynInputTag::Float(p) => *p,
            DynInputTag::Bool(false) => 0.0,
            _ => 1.0,
        }
    }

    fn recover_fn(&self, t: &f64) -> f64 {
        *t
    }

    fn discard(&self, t: &f64) -> bool {
        *t <= self.discard_floor
    }

    fn saturated(&self, old: &f64, new: &f64) -> bool {
        // add = max is idempotent over the finite set of input
        // probabilities, so exact comparison is sound.
        old == new
    }
}
