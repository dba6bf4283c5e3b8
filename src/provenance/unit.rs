//! Unit provenance: no tracking at all.
//!
//! Every tag is the same zero-sized marker, so the evaluator degenerates to
//! plain Datalog — a tuple is either derivable or absent. The fastest
//! algebra; the baseline the others are measured against.

use serde::{Deserialize, Serialize};

use super::Provenance;

/// The single inhabitant of the unit algebra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit;

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "()")
    }
}

/// Provenance that tracks nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitProvenance;

impl Provenance for UnitProvenance {
    type InputTag = ();
    type Tag = Unit;
    type OutputTag = Unit;

    fn name(&self) -> &'static str {
        "unit"
    }

    fn zero(&self) -> Unit {
        Unit
    }

    fn one(&self) -> Unit {
        Unit
    }

    fn add(&self, _t1: &Unit, _t2: &Unit) -> Unit {
        Unit
    }

    fn mult(&self, _t1: &Unit, _t2: &Unit) -> Unit {
        Unit
    }

    fn negate(&self, _t: &Unit) -> Option<Unit> {
        Some(Unit)
    }

    fn tagging_fn(&mut self, _input: Option<()>) -> Unit {
        Unit
    }

    fn recover_fn(&self, _t: &Unit) -> Unit {
        Unit
    }

    fn saturated(&self, _old: &Unit, _new: &Unit) -> bool {
        // Tags never change; only new tuples drive iteration.
        true
    }
}
