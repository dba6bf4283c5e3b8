//! Exact-probability provenance: full proof tracking plus WMC recovery.
//!
//! Tags are [`Proofs`] values — every derivation of a tuple, down to the
//! base facts it rests on. The algebra owns the session-scoped fact table:
//! fact identifiers are allocated at tagging time, monotonically, never
//! reused, with the base probability recorded alongside. `recover_fn`
//! compiles the proof set into a decision diagram and evaluates the exact
//! probability via weighted model counting, so overlapping derivations are
//! combined by inclusion–exclusion rather than double-counted.

use serde::{Deserialize, Serialize};

use super::{DynInputTag, Provenance};
use crate::proofs::{FactId, Proofs};
use crate::wmc::DnfFormula;

/// The session-scoped base-fact table: probabilities indexed by [`FactId`].
///
/// Owned by the provenance instance (and therefore by its session) — never
/// a global. The next fact ID is simply the table's length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactTable {
    probs: Vec<f64>,
}

impl FactTable {
    /// Register a base fact with the given probability; returns its ID.
    pub fn register(&mut self, prob: f64) -> FactId {
        let id = self.probs.len();
        self.probs.push(prob);
        id
    }

    /// The probability of a registered base fact.
    pub fn probability(&self, fact: FactId) -> Option<f64> {
        self.probs.get(fact).copied()
    }

    /// Number of registered base facts.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Whether no fact has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// The full weight table, for WMC evaluation.
    pub fn weights(&self) -> &[f64] {
        &self.probs
    }
}

/// Provenance tracking *all* proofs, recovering exact probabilities.
///
/// Complete but potentially exponential in pathological programs; see
/// [`TopKProofsProvenance`](super::TopKProofsProvenance) for the bounded
/// variant.
#[derive(Debug, Clone, Default)]
pub struct ProofsProvenance {
    table: FactTable,
}

impl ProofsProvenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// The base-fact table (for inspection and debugging).
    pub fn facts(&self) -> &FactTable {
        &self.table
    }
}

impl Provenance for ProofsProvenance {
    type InputTag = f64;
    type Tag = Proofs;
    type OutputTag = f64;

    fn name(&self) -> &'static str {
        "proofs"
    }

    fn zero(&self) -> Proofs {
        Proofs::none()
    }

    fn one(&self) -> Proofs {
        Proofs::trivial()
    }

    fn add(&self, t1: &Proofs, t2: &Proofs) -> Proofs {
        t1.union(t2)
    }

    fn mult(&self, t1: &Proofs, t2: &Proofs) -> Proofs {
        t1.product(t2)
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
