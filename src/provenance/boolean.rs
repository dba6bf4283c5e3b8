//! Boolean provenance: plain truth tracking with negation support.

use super::{DynInputTag, Provenance};

/// Provenance over the Boolean semiring (`add = ∨`, `mult = ∧`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanProvenance;

impl Provenance for BooleanProvenance {
    type InputTag = bool;
    type Tag = bool;
    type OutputTag = bool;

    fn name(&self) -> &'static str {
        "bool"
    }

    fn zero(&self) -> bool {
        false
    }

    fn one(&self) -> bool {
        true
    }

    fn add(&self, t1: &bool, t2: &bool) -> bool {
        *t1 || *t2
    }

    fn mult(&self, t1: &bool, t2: &bool) -> bool {
        *t1 && *t2
    }

    fn negate(&self, t: &bool) -> Option<bool> {
        Some(!t)
    }

    fn tagging_fn(&mut self, input: Option<bool>) -> bool {
        input.unwrap_or(true)
    }

    fn tagging_dyn(&mut self, tag: &DynInputTag) -> bool {
        match tag {
            DynInputTag::Bool(b) => *b,
            _ => true,
        }
    }

    fn recover_fn(&self, t: &bool) -> bool {
        *t
    }

    fn discard(&self, t: &bool) -> bool {
        !t
    }

    fn saturated(&self, old: &bool, new: &bool) -> bool {
        old == new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semiring_structure() {
        let p = BooleanProvenance;
        assert!(p.add(&true, &false));
        assert!(!p.mult(&true, &false));
        assert_eq!(p.negate(&true), Some(false));
    }

    #[test]
    fn false_tags_are_discardable() {
        let p = BooleanProvenance;
        assert!(p.discard(&false));
        assert!(!p.discard(&true));
    }

    #[test]
    fn dyn_tagging_reads_bool_payload() {
        let mut p = BooleanProvenance;
        assert!(!p.tagging_dyn(&DynInputTag::Bool(false)));
        assert!(p.tagging_dyn(&DynInputTag::None));
        assert!(p.tagging_dyn(&DynInputTag::Float(0.5)));
    }
}
