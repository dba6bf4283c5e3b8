//! Tropical (min-plus) provenance: shortest-path costs.
//!
//! Tags are non-negative costs. `add` keeps the cheaper alternative,
//! `mult` sums the costs of jointly required atoms, so a converged tag is
//! the cost of the cheapest derivation — shortest paths without leaving
//! the rule language.

use super::{DynInputTag, Provenance};

/// Provenance over the tropical semiring (ℝ∪{∞}, min, +).
#[derive(Debug, Clone, Copy, Default)]
pub struct TropicalProvenance;

impl Provenance for TropicalProvenance {
    type InputTag = f64;
    type Tag = f64;
    type OutputTag = f64;

    fn name(&self) -> &'static str {
        "tropical"
    }

    fn zero(&self) -> f64 {
        f64::INFINITY
    }

    fn one(&self) -> f64 {
        0.0
    }

    fn add(&self, t1: &f64, t2: &f64) -> f64 {
        t1.min(*t2)
    }

    fn mult(&self, t1: &f64, t2: &f64) -> f64 {
        t1 + t2
    }

    fn tagging_fn(&mut self, input: Option<f64>) -> f64 {
        input.unwrap_or(0.0)
    }

    fn tagging_dyn(&mut self, tag: &DynInputTag) -> f64 {
        match tag {
            DynInputTag::Float(cost) => *cost,
            _ => 0.0,
        }
    }

    fn recover_fn(&self, t: &f64) -> f64 {
        *t
    }

    fn discard(&self, t: &f64) -> bool {
        t.is_infinite()
    }

    fn saturated(&self, old: &f64, new: &f64) -> bool {
        // The merged tag is min(old, incoming): saturated iff no improvement.
        new >= old
    }
}
