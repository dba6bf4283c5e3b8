//! Top-K proofs provenance: bounded proof tracking.
//!
//! Identical to [`ProofsProvenance`](super::ProofsProvenance) except that
//! after every `add` and `mult` the proof set is pruned to the K disjuncts
//! with highest estimated weight (product of per-literal probabilities).
//! Memory stays bounded; the recovered probability becomes a lower bound
//! when proofs are actually dropped, and stays exact while the true proof
//! count fits in K.

use super::proofs::FactTable;
use super::{DynInputTag, Provenance};
use crate::proofs::Proofs;
use crate::wmc::DnfFormula;

/// Proof-tracking provenance with a retention bound.
#[derive(Debug, Clone)]
pub struct TopKProofsProvenance {
    k: usize,
    table: FactTable,
}

impl TopKProofsProvenance {
    /// Track at most `k` proofs per tuple. `k` must be at least 1.
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            table: FactTable::default(),
        }
    }

    /// The retention bound.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The base-fact table.
    pub fn facts(&self) -> &FactTable {
        &self.table
    }
}

impl Default for TopKProofsProvenance {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Provenance for TopKProofsProvenance {
    type InputTag = f64;
    type Tag = Proofs;
    type OutputTag = f64;

    fn name(&self) -> &'static str {
        "topkproofs"
    }

    fn zero(&self) -> Proofs {
        Proofs::none()
    }

    fn one(&self) -> Proofs {
        Proofs::trivial()
    }

    fn add(&self, t1: &Proofs, t2: &Proofs) -> Proofs {
        t1.union(t2).prune_top_k(self.k, self.table.weights())
    }

    fn mult(&self, t1: &Proofs, t2: &Proofs) -> Proofs {
        t1.product(t2).prune_top_k(self.k, self.table.weights())
    }

    fn tagging_fn(&mut self, input: Option<f64>) -> Proofs {
        let prob = input.unwrap_or(1.0);
        Proofs::base(self.table.register(prob))
    }

    fn tagging_dyn(&mut self, tag: &DynInputTag) -> Proofs {
        let prob = match tag {
            DynInputTag::Float(p) => Some(*p),
            DynInputTag::Bool(false) => Some(0.0),
            _ => None,
        };
        self.tagging_fn(prob)
    }

    fn recover_fn(&self, t: &Proofs) -> f64 {
        DnfFormula::from_proofs(t).probability(self.table.weights())
    }

    fn discard(&self, t: &Proofs) -> bool {
        t.is_empty()
    }

    fn saturated(&self, old: &Proofs, new: &Proofs) -> bool {
        old == new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_while_under_the_bound() {
        let mut p = TopKProofsProvenance::new(3);
        let direct = p.tagging_fn(Some(0.6));
        let hop1 = p.tagging_fn(Some(0.9));
        let hop2 = p.tagging_fn(Some(0.8));
        let chain = p.mult(&hop1, &hop2);
        let both = p.add(&direct, &chain);
        assert_eq!(both.conjuncts().len(), 2);
        assert!((p.recover_fn(&both) - 0.888).abs() < 1e-12);
    }

    #[test]
    fn prunes_to_heaviest_proofs() {
        let mut p = TopKProofsProvenance::new(1);
        let weak = p.tagging_fn(Some(0.2));
        let strong = p.tagging_fn(Some(0.9));
        let both = p.add(&weak, &strong);
        // Only the strong proof survives k = 1.
        assert_eq!(both.conjuncts().len(), 1);
        assert!((p.recover_fn(&both) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn pruned_probability_is_a_lower_bound() {
        let mut p = TopKProofsProvenance::new(1);
        let a = p.tagging_fn(Some(0.5));
        let b = p.tagging_fn(Some(0.5));
        let pruned = p.recover_fn(&p.add(&a, &b));
        // Full inclusion–exclusion would give 0.75.
        assert!((pruned - 0.5).abs() < 1e-12);
        assert!(pruned <= 0.75);
    }

    #[test]
    fn k_is_clamped_to_at_least_one() {
        let p = TopKProofsProvenance::new(0);
        assert_eq!(p.k(), 1);
    }
}
