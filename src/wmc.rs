//! Weighted model counting over DNF proof formulas.
//!
//! A [`DnfFormula`] is the Boolean view of a proof set: a disjunction of
//! clauses, each a conjunction of literals over base-fact variables (with
//! polarity, so negation-capable algebras can reuse the machinery). The
//! formula is compiled by Shannon expansion over the sorted variable order
//! into a small decision-diagram arena; weighted evaluation of that diagram
//! yields the *exact* probability that at least one clause holds —
//! inclusion–exclusion falls out of the expansion, overlapping clauses are
//! never double-counted, and no truth table is ever enumerated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::proofs::{FactId, Proofs};

/// A single literal: a base-fact variable with polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub fact: FactId,
    pub positive: bool,
}

impl Literal {
    pub fn pos(fact: FactId) -> Self {
        Literal {
            fact,
            positive: true,
        }
    }

    pub fn neg(fact: FactId) -> Self {
        Literal {
            fact,
            positive: false,
        }
    }
}

/// One conjunction of literals. Kept sorted by fact ID.
type Clause = Vec<Literal>;

/// A Boolean formula in disjunctive normal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnfFormula {
    clauses: Vec<Clause>,
}

impl DnfFormula {
    /// Build a formula from explicit clauses.
    pub fn new(clauses: Vec<Vec<Literal>>) -> Self {
        DnfFormula {
            clauses: normalize(clauses),
        }
    }

    /// The Boolean view of a proof set: every literal positive.
    pub fn from_proofs(proofs: &Proofs) -> Self {
        DnfFormula::new(
            proofs
                .conjuncts()
                .iter()
                .map(|c| c.facts().iter().map(|&f| Literal::pos(f)).collect())
                .collect(),
        )
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the formula is the constant false (no clauses).
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Compile into a decision diagram over the sorted variable order.
    pub fn compile(&self) -> CompiledFormula {
        let mut compiler = Compiler {
            nodes: Vec::new(),
            memo: HashMap::new(),
        };
        let root = compiler.build(self.clauses.clone());
        CompiledFormula {
            nodes: compiler.nodes,
            root,
        }
    }

    /// Compile and evaluate in one step.
    ///
    /// `probs[f]` is the probability that base fact `f` holds. See
    /// [`CompiledFormula::wmc`] for the consistency contract.
    pub fn probability(&self, probs: &[f64]) -> f64 {
        self.compile().wmc(probs)
    }
}

/// Sort literals within clauses, drop internally contradictory clauses
/// (`v ∧ ¬v`), sort and deduplicate the clause list.
fn normalize(clauses: Vec<Clause>) -> Vec<Clause> {
    let mut out: Vec<Clause> = Vec::with_capacity(clauses.len());
    'clause: for mut clause in clauses {
        clause.sort_unstable();
        clause.dedup();
        for pair in clause.windows(2) {
            if pair[0].fact == pair[1].fact {
                continue 'clause;
            }
        }
        out.push(clause);
    }
    out.sort();
    out.dedup();
    out
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// Reference to a node in the compiled diagram, or a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    True,
    False,
    Node(usize),
}

/// An internal decision node: branch on `var`, `hi` when true, `lo` when false.
#[derive(Debug, Clone, Copy)]
struct DecisionNode {
    var: FactId,
    lo: NodeRef,
    hi: NodeRef,
}

/// A compiled Boolean-decision structure supporting weighted traversal.
///
/// Nodes are stored in an arena in bottom-up order (children strictly before
/// parents), so evaluation is a single forward pass.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    nodes: Vec<DecisionNode>,
    root: NodeRef,
}

impl CompiledFormula {
    /// Number of internal decision nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Exact weighted model count: the probability that the formula holds
    /// given independent per-fact probabilities `probs[f]`.
    ///
    /// # Panics
    ///
    /// Panics if a literal references a fact ID outside `probs`. A dangling
    /// fact ID means the evaluator handed over a proof referencing a base
    /// fact the store never registered — an internal consistency bug that
    /// must abort rather than silently approximate.
    pub fn wmc(&self, probs: &[f64]) -> f64 {
        let mut value = vec![0.0_f64; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            assert!(
                node.var < probs.len(),
                "internal consistency violation: proof references fact {} but only {} base facts are registered",
                node.var,
                probs.len(),
            );
            let p = probs[node.var];
            let hi = self.resolve(node.hi, &value);
            let lo = self.resolve(node.lo, &value);
            value[i] = p * hi + (1.0 - p) * lo;
        }
        self.resolve(self.root, &value)
    }

    fn resolve(&self, r: NodeRef, value: &[f64]) -> f64 {
        match r {
            NodeRef::True => 1.0,
            NodeRef::False => 0.0,
            NodeRef::Node(i) => value[i],
        }
    }
}

struct Compiler {
    nodes: Vec<DecisionNode>,
    memo: HashMap<Vec<Clause>, NodeRef>,
}

impl Compiler {
    /// Shannon-expand the residual formula on its smallest variable.
    ///
    /// Each step eliminates the branch variable from every clause, so the
    /// recursion depth is bounded by the number of distinct variables.
    fn build(&mut self, clauses: Vec<Clause>) -> NodeRef {
        if clauses.iter().any(Vec::is_empty) {
            return NodeRef::True;
        }
        if clauses.is_empty() {
            return NodeRef::False;
        }
        if let Some(&cached) = self.memo.get(&clauses) {
            return cached;
        }

        let var = clauses
            .iter()
            .flat_map(|c| c.iter().map(|l| l.fact))
            .min()
            .expect("non-empty clauses have a variable");

        let hi = self.restrict(&clauses, var, true);
        let lo = self.restrict(&clauses, var, false);
        let hi_ref = self.build(hi);
        let lo_ref = self.build(lo);

        let node = if hi_ref == lo_ref {
            // Branch is irrelevant for this variable; collapse.
            hi_ref
        } else {
            self.nodes.push(DecisionNode {
                var,
                lo: lo_ref,
                hi: hi_ref,
            });
            NodeRef::Node(self.nodes.len() - 1)
        };
        self.memo.insert(clauses, node);
        node
    }

    /// The residual formula under `var := assignment`.
    fn restrict(&self, clauses: &[Clause], var: FactId, assignment: bool) -> Vec<Clause> {
        let mut out = Vec::with_capacity(clauses.len());
        'clause: for clause in clauses {
            let mut reduced = Vec::with_capacity(clause.len());
            for &lit in clause {
                if lit.fact == var {
                    if lit.positive != assignment {
                        // Literal falsified: the whole conjunction drops.
                        continue 'clause;
                    }
                    // Literal satisfied: it vanishes from the clause.
                } else {
                    reduced.push(lit);
                }
            }
            out.push(reduced);
        }
        normalize(out)
    }
}
