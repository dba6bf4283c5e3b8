//! Add-mult probability provenance: noisy-or over independent derivations.
//!
//! `add(a, b) = a + b − ab` treats alternative derivations as independent
//! events, `mult = a·b` their conjunction. Unlike min-max this is not
//! idempotent: recursive programs produce tag chains that asymptote, so
//! saturation uses an epsilon rather than exact equality.

use super::{DynInputTag, Provenance};

/// Provenance over ([0,1], a+b−ab, ×).
#[derive(Debug, Clone, Copy)]
pub struct AddMultProbProvenance {
    /// Convergence epsilon for `saturated`.
    pub epsilon: f64,
    /// Early-discard floor; 0.0 disables it.
    pub discard_floor: f64,
}

impl Default for AddMultProbProvenance {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            discard_floor: 0.0,
        }
    }
}

impl Provenance for AddMultProbProvenance {
    type InputTag = f64;
    type Tag = f64;
    type OutputTag = f64;

    fn name(&self) -> &'static str {
        "addmultprob"
    }

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn add(&self, t1: &f64, t2: &f64) -> f64 {
        t1 + t2 - t1 * t2
    }

    fn mult(&self, t1: &f64, t2: &f64) -> f64 {
        t1 * t2
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
        (new - old).abs() <= self.epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noisy_or_combination() {
        let p = AddMultProbProvenance::default();
        assert!((p.add(&0.6, &0.72) - 0.888).abs() < 1e-12);
        assert!((p.mult(&0.9, &0.8) - 0.72).abs() < 1e-12);
    }

    #[test]
    fn identities() {
        let p = AddMultProbProvenance::default();
        assert_eq!(p.add(&0.4, &p.zero()), 0.4);
        assert_eq!(p.mult(&0.4, &p.one()), 0.4);
    }

    #[test]
    fn epsilon_saturation() {
        let p = AddMultProbProvenance::default();
        assert!(p.saturated(&0.5, &0.5));
        assert!(p.saturated(&0.5, &(0.5 + 1e-9)));
        assert!(!p.saturated(&0.5, &0.6));
    }

    #[test]
    fn stays_within_unit_interval() {
        let p = AddMultProbProvenance::default();
        let mut acc = 0.0;
        for _ in 0..50 {
            acc = p.add(&acc, &0.3);
        }
        assert!(acc <= 1.0);
        assert!(acc > 0.999);
    }
}
