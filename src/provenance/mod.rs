//! Tag algebras: the provenance abstraction and its built-in semirings.
//!
//! Every derived fact carries a [`Provenance::Tag`]. The evaluator combines
//! tags with `add` (alternative derivations of the same tuple) and `mult`
//! (atoms jointly required by one rule body) and never looks inside them —
//! the same rule set answers "is it true", "how many ways", "how probable",
//! or "which proofs" purely by swapping the algebra.
//!
//! Algebra authors uphold the semiring contract themselves: `add` and
//! `mult` must be commutative and associative, with `add(t, zero()) == t`
//! and `mult(t, one()) == t` on every reachable tag. Violations are not
//! checked at runtime.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub mod add_mult_prob;
pub mod boolean;
pub mod min_max_prob;
pub mod natural;
pub mod proofs;
pub mod top_k_proofs;
pub mod tropical;
pub mod unit;

pub use add_mult_prob::AddMultProbProvenance;
pub use boolean::BooleanProvenance;
pub use min_max_prob::MinMaxProbProvenance;
pub use natural::NaturalProvenance;
pub use proofs::ProofsProvenance;
pub use top_k_proofs::TopKProofsProvenance;
pub use tropical::TropicalProvenance;
pub use unit::UnitProvenance;

/// A tag algebra over rule evaluation.
///
/// `InputTag` is what external callers attach to facts (e.g. a literal
/// probability), `Tag` is the internal element propagated through joins
/// and unions, `OutputTag` is what queries read back after convergence
/// (for proof-based algebras, a scalar probability recovered via WMC).
pub trait Provenance: 'static {
    type InputTag: Clone + std::fmt::Debug;
    type Tag: Clone + std::fmt::Debug + 'static;
    type OutputTag: Clone + std::fmt::Debug;

    /// Stable name used for selection and diagnostics.
    fn name(&self) -> &'static str;

    /// Additive identity: the tag of an underivable tuple.
    fn zero(&self) -> Self::Tag;

    /// Multiplicative identity: the tag of an unconditional premise.
    fn one(&self) -> Self::Tag;

    /// Combine tags from alternative derivations of the same tuple.
    fn add(&self, t1: &Self::Tag, t2: &Self::Tag) -> Self::Tag;

    /// Combine tags of atoms jointly required by one rule body.
    fn mult(&self, t1: &Self::Tag, t2: &Self::Tag) -> Self::Tag;

    /// Tag of a negated atom, or `None` when this algebra cannot negate.
    ///
    /// Programs containing negation are rejected before evaluation when the
    /// active algebra returns `None` here.
    fn negate(&self, _t: &Self::Tag) -> Option<Self::Tag> {
        None
    }

    /// Convert an externally supplied tag into an internal one.
    ///
    /// Takes `&mut self`: proof-based algebras allocate the fact identifier
    /// and record the base probability here.
    fn tagging_fn(&mut self, input: Option<Self::InputTag>) -> Self::Tag;

    /// Convert a dynamically typed tag (from a foreign predicate) into an
    /// internal one. The default ignores the payload.
    fn tagging_dyn(&mut self, _tag: &DynInputTag) -> Self::Tag {
        self.tagging_fn(None)
    }

    /// Convert a converged internal tag back into a user-facing value.
    fn recover_fn(&self, t: &Self::Tag) -> Self::OutputTag;

    /// Early-termination predicate: a `true` here lets the evaluator drop
    /// the fact without further propagation. Purely a performance
    /// optimization — disabling it must never change recoverable results.
    fn discard(&self, _t: &Self::Tag) -> bool {
        false
    }

    /// Whether a tuple's tag has stopped changing. The evaluator's only way
    /// of comparing tags.
    fn saturated(&self, old: &Self::Tag, new: &Self::Tag) -> bool;

    /// Whether this algebra can evaluate negated atoms at all.
    ///
    /// Probed once at program-compile time with the multiplicative identity.
    fn supports_negation(&self) -> bool {
        self.negate(&self.one()).is_some()
    }
}

/// Dynamically typed input tag yielded by foreign predicates.
///
/// Foreign predicates are algebra-agnostic; each algebra picks out the
/// payload it understands in [`Provenance::tagging_dyn`] and falls back to
/// `one()`-like behavior otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DynInputTag {
    /// No tag: the fact is unconditionally true.
    None,
    /// A probability or cost.
    Float(f64),
    /// A truth value.
    Bool(bool),
    /// A multiplicity.
    Natural(usize),
}

/// Name-based selection of a built-in algebra.
///
/// Surface layers parse the user's `--provenance` choice into this enum and
/// monomorphize their session over the matching algebra type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvenanceKind {
    Unit,
    Boolean,
    Natural,
    Tropical,
    MinMaxProb,
    AddMultProb,
    Proofs,
    TopKProofs,
}

impl FromStr for ProvenanceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "unit" => Ok(ProvenanceKind::Unit),
            "bool" | "boolean" => Ok(ProvenanceKind::Boolean),
            "natural" | "count" => Ok(ProvenanceKind::Natural),
            "tropical" | "minplus" => Ok(ProvenanceKind::Tropical),
            "minmaxprob" => Ok(ProvenanceKind::MinMaxProb),
            "addmultprob" => Ok(ProvenanceKind::AddMultProb),
            "proofs" => Ok(ProvenanceKind::Proofs),
            "topkproofs" => Ok(ProvenanceKind::TopKProofs),
            other => Err(ConfigError::UnknownProvenance {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ProvenanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProvenanceKind::Unit => "unit",
            ProvenanceKind::Boolean => "bool",
            ProvenanceKind::Natural => "natural",
            ProvenanceKind::Tropical => "tropical",
            ProvenanceKind::MinMaxProb => "minmaxprob",
            ProvenanceKind::AddMultProb => "addmultprob",
            ProvenanceKind::Proofs => "proofs",
            ProvenanceKind::TopKProofs => "topkproofs",
        };
        write!(f, "{name}")
    }
}
