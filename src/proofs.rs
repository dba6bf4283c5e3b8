//! Proof sets: disjunctions of conjunctions of base-fact identifiers.
//!
//! A [`Proofs`] value explains every way a tuple was derived: the outer
//! vector is a disjunction (alternative derivations), each [`Conjunct`] a
//! conjunction (base facts jointly required). Fact identifiers are plain
//! indices into the owning provenance's probability table — sorted index
//! vectors, no pointer trees, so structural sharing during `add`/`mult` is
//! a memcpy.

use serde::{Deserialize, Serialize};

/// Stable identifier of a base (extensional) fact within one session.
///
/// Assigned monotonically at tagging time, never reused.
pub type FactId = usize;

/// A conjunction of base facts: the set of facts jointly required by one
/// derivation. Fact IDs are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Conjunct {
    facts: Vec<FactId>,
}

impl Conjunct {
    /// A conjunction over the given facts; sorts and deduplicates.
    pub fn new(mut facts: Vec<FactId>) -> Self {
        facts.sort_unstable();
        facts.dedup();
        Conjunct { facts }
    }

    /// The empty conjunction (vacuously true).
    pub fn empty() -> Self {
        Conjunct { facts: Vec::new() }
    }

    /// A conjunction of a single base fact.
    pub fn singleton(fact: FactId) -> Self {
        Conjunct { facts: vec![fact] }
    }

    /// The sorted fact IDs.
    pub fn facts(&self) -> &[FactId] {
        &self.facts
    }

    /// Whether every fact of `self` also occurs in `other`.
    ///
    /// Both sides are sorted, so this is a linear merge scan.
    pub fn subsumes(&self, other: &Conjunct) -> bool {
        let mut it = other.facts.iter();
        'outer: for f in &self.facts {
            for g in it.by_ref() {
                match g.cmp(f) {
                    std::cmp::Ordering::Less => continue,
                    std::cmp::Ordering::Equal => continue 'outer,
                    std::cmp::Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }

    /// Union of two conjunctions (merge of sorted fact lists).
    pub fn merge(&self, other: &Conjunct) -> Conjunct {
        let mut facts = Vec::with_capacity(self.facts.len() + other.facts.len());
        let (mut i, mut j) = (0, 0);
        while i < self.facts.len() && j < other.facts.len() {
            match self.facts[i].cmp(&other.facts[j]) {
                std::cmp::Ordering::Less => {
                    facts.push(self.facts[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    facts.push(other.facts[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    facts.push(self.facts[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        facts.extend_from_slice(&self.facts[i..]);
        facts.extend_from_slice(&other.facts[j..]);
        Conjunct { facts }
    }

    /// Estimated weight: product of the per-fact probabilities.
    ///
    /// # Panics
    ///
    /// Panics if a fact ID falls outside `probs` — the proof references a
    /// base fact the store never registered, which must abort rather than
    /// silently approximate.
    pub fn weight(&self, probs: &[f64]) -> f64 {
        self.facts
            .iter()
            .map(|&f| match probs.get(f) {
                Some(p) => *p,
                None => panic!(
                    "internal consistency violation: proof references fact {f} but only {} base facts are registered",
                    probs.len()
                ),
            })
            .product()
    }
}

/// A disjunction of conjunctions: all tracked derivations of one tuple.
///
/// Conjuncts are kept sorted, deduplicated, and free of outer-subsumed
/// entries, so structurally identical proof sets compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proofs {
    conjuncts: Vec<Conjunct>,
}

impl Proofs {
    /// No derivations: the additive identity (false).
    pub fn none() -> Self {
        Proofs {
            conjuncts: Vec::new(),
        }
    }

    /// One unconditional derivation: the multiplicative identity (true).
    pub fn trivial() -> Self {
        Proofs {
            conjuncts: vec![Conjunct::empty()],
        }
    }

    /// A single derivation from one base fact.
    pub fn base(fact: FactId) -> Self {
        Proofs {
            conjuncts: vec![Conjunct::singleton(fact)],
        }
    }

    /// The tracked derivations.
    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    /// Whether no derivation is tracked.
    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }

    /// Disjunction: union of the outer conjunct sets, with subsumed
    /// conjuncts removed (a superset of another conjunct adds nothing).
    pub fn union(&self, other: &Proofs) -> Proofs {
        let mut conjuncts = self.conjuncts.clone();
        conjuncts.extend(other.conjuncts.iter().cloned());
        Proofs::normalized(conjuncts)
    }

    /// Conjunction: Cartesian product, each pair merged into one conjunct.
    pub fn product(&self, other: &Proofs) -> Proofs {
        let mut conjuncts = Vec::with_capacity(self.conjuncts.len() * other.conjuncts.len());
        for a in &self.conjuncts {
            for b in &other.conjuncts {
                conjuncts.push(a.merge(b));
            }
        }
        Proofs::normalized(conjuncts)
    }

    /// Retain only the `k` conjuncts with highest estimated weight.
    ///
    /// Ties break toward the canonically smaller conjunct so pruning is
    /// deterministic. Trades completeness for bounded memory; the result is
    /// re-normalized so equality stays structural.
    pub fn prune_top_k(&self, k: usize, probs: &[f64]) -> Proofs {
        if self.conjuncts.len() <= k {
            return self.clone();
        }
        let mut ranked: Vec<&Conjunct> = self.conjuncts.iter().collect();
        ranked.sort_by(|a, b| {
            b.weight(probs)
                .total_cmp(&a.weight(probs))
                .then_with(|| a.cmp(b))
        });
        Proofs::normalized(ranked.into_iter().take(k).cloned().collect())
    }

    /// Sort, deduplicate, and drop outer-subsumed conjuncts.
    fn normalized(mut conjuncts: Vec<Conjunct>) -> Proofs {
        conjuncts.sort();
        conjuncts.dedup();
        // After dedup, mutual subsumption is impossible, so drop a conjunct
        // whenever any *other* conjunct subsumes it. Quadratic, but proof
        // sets are small by construction (top-K pruning bounds them).
        let mut kept: Vec<Conjunct> = Vec::with_capacity(conjuncts.len());
        'outer: for (i, c) in conjuncts.iter().enumerate() {
            for (j, d) in conjuncts.iter().enumerate() {
                if i != j && d.subsumes(c) {
                    continue 'outer;
                }
            }
            kept.push(c.clone());
        }
        Proofs { conjuncts: kept }
    }
}

impl std::fmt::Display for Proofs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, c) in self.conjuncts.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{{")?;
            for (j, fact) in c.facts().iter().enumerate() {
                if j > 0 {
                    write!(f, "^")?;
                }
                write!(f, "{fact}")?;
            }
            write!(f, "}}")?;
        }
        write!(f, "}}")
    }
}
