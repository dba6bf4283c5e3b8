//! Natural-number provenance: counts the number of distinct derivations.
//!
//! `add` sums counts from alternative derivations, `mult` multiplies counts
//! of jointly required atoms. Counts grow without bound through recursive
//! cycles — the iteration limit is the backstop there, and a limit-truncated
//! run is reported as such.

use super::{DynInputTag, Provenance};

/// Provenance over the counting semiring (ℕ, +, ×).
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalProvenance;

impl Provenance for NaturalProvenance {
    type InputTag = usize;
    type Tag = usize;
    type OutputTag = usize;

    fn name(&self) -> &'static str {
        "natural"
    }

    fn zero(&self) -> usize {
        0
    }

    fn one(&self) -> usize {
        1
    }

    fn add(&self, t1: &usize, t2: &usize) -> usize {
        t1.saturating_add(*t2)
    }

    fn mult(&self, t1: &usize, t2: &usize) -> usize {
        t1.saturating_mul(*t2)
    }

    fn tagging_fn(&mut self, input: Option<usize>) -> usize {
        input.unwrap_or(1)
    }

    fn tagging_dyn(&mut self, tag: &DynInputTag) -> usize {
        match tag {
            DynInputTag::Natural(n) => *n,
            _ => 1,
        }
    }

    fn recover_fn(&self, t: &usize) -> usize {
        *t
    }

    fn discard(&self, t: &usize) -> bool {
        *t == 0
    }

    fn saturated(&self, old: &usize, new: &usize) -> bool {
        old == new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_combine_arithmetically() {
        let p = NaturalProvenance;
        assert_eq!(p.add(&2, &3), 5);
        assert_eq!(p.mult(&2, &3), 6);
        assert_eq!(p.add(&7, &p.zero()), 7);
        assert_eq!(p.mult(&7, &p.one()), 7);
    }

    #[test]
    fn negation_is_unsupported() {
        let p = NaturalProvenance;
        assert_eq!(p.negate(&1), None);
    }

    #[test]
    fn saturating_arithmetic_at_the_top() {
        let p = NaturalProvenance;
        assert_eq!(p.add(&usize::MAX, &1), usize::MAX);
        assert_eq!(p.mult(&usize::MAX, &2), usize::MAX);
    }
}
