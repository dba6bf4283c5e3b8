//! Stratified semi-naive fixpoint evaluation.
//!
//! Strata run bottom-up; within a stratum, iteration repeats until no
//! relation reports a change. Each iteration evaluates every rule in
//! delta-rotation form: one recursive body atom reads the previous
//! iteration's delta (tag increments, not merged totals), atoms before it
//! read the full frontier, atoms after it read the frontier as it stood
//! before that delta landed — so every derivation contributes to its head
//! tag exactly once, which keeps non-idempotent algebras (counting,
//! noisy-or) honest.
//!
//! Derived relations are rebuilt from their externally inserted base facts
//! at the start of each affected stratum, so repeated runs are idempotent
//! and incremental re-runs agree with evaluation from scratch.

use indexmap::{IndexMap, IndexSet};

use crate::ast::{Atom, BodyLiteral, Rule, Term};
use crate::error::{ConfigError, ProvlogResult, RuntimeError};
use crate::foreign::ForeignRegistry;
use crate::provenance::Provenance;
use crate::store::{Database, Relation};
use crate::stratify::Stratification;
use crate::tuple::Tuple;
use crate::value::Value;

/// Knobs the session hands the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    /// Per-stratum iteration cap. `None` iterates to convergence.
    pub iter_limit: Option<usize>,
    /// Honor the algebra's `discard` predicate during derivation.
    pub early_discard: bool,
}

/// How a run ended. Truncation is always reported, never a silent success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every stratum reached its fixpoint.
    Converged { iterations: usize },
    /// The iteration cap fired while a stratum was still producing changes.
    /// Results are a valid under-approximation of the fixpoint.
    Truncated { stratum: usize, iterations: usize },
}

impl RunStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, RunStatus::Converged { .. })
    }
}

/// Checks performed once before any evaluation: range restriction, negation
/// capability of the active algebra, and that every compute literal
/// references a registered foreign function.
pub fn validate_program<P: Provenance>(
    rules: &[Rule],
    prov: &P,
    registry: &ForeignRegistry,
) -> ProvlogResult<()> {
    for rule in rules {
        rule.validate()?;
        for literal in &rule.body {
            if let BodyLiteral::Compute { function, .. } = literal {
                if registry.function(function).is_none() {
                    return Err(RuntimeError::UnknownForeignFunction {
                        name: function.clone(),
                    }
                    .into());
                }
            }
        }
    }
    if rules.iter().any(Rule::has_negation) && !prov.supports_negation() {
        return Err(ConfigError::NegationUnsupported {
            provenance: prov.name().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Evaluate the stratified program over the database.
///
/// `affected` flags which strata need re-evaluation (all of them on a full
/// run; only the dirty cone on an incremental one).
pub fn evaluate<P: Provenance>(
    db: &mut Database<P>,
    prov: &mut P,
    registry: &ForeignRegistry,
    stratification: &Stratification,
    affected: &[bool],
    options: &EvaluationOptions,
) -> ProvlogResult<RunStatus> {
    let mut total_iterations = 0;

    for (stratum_index, stratum) in stratification.strata.iter().enumerate() {
        if !affected.get(stratum_index).copied().unwrap_or(true) {
            tracing::debug!(stratum = stratum_index, "stratum unaffected; skipping");
            continue;
        }

        let heads: IndexSet<&str> = stratum
            .rules
            .iter()
            .map(|r| r.head.relation.as_str())
            .collect();
        for name in &stratum.relations {
            if let Some(relation) = db.get_mut(name) {
                if heads.contains(name.as_str()) {
                    relation.reset_to_base();
                }
                relation.seed_delta();
            }
        }

        let mut iterations = 0;
        loop {
            iterations += 1;
            for rule in &stratum.rules {
                let recursive: Vec<usize> = rule
                    .body
                    .iter()
                    .enumerate()
                    .filter_map(|(i, l)| match l {
                        BodyLiteral::Atom(a)
                            if stratum.relations.contains(&a.relation)
                                && db.contains(&a.relation) =>
                        {
                            Some(i)
                        }
                        _ => None,
                    })
                    .collect();

                let mut derived = Vec::new();
                if recursive.is_empty() {
                    if iterations == 1 {
                        derived = rule_matches(db, prov, registry, rule, stratum, None, options)?;
                    }
                } else {
                    for &position in &recursive {
                        derived.extend(rule_matches(
                            db,
                            prov,
                            registry,
                            rule,
                            stratum,
                            Some(position),
                            options,
                        )?);
                    }
                }

                for (tuple, tag) in derived {
                    if options.early_discard && prov.discard(&tag) {
                        continue;
                    }
                    db.entry_for(&rule.head.relation, &tuple)
                        .stage(prov, tuple, tag);
                }
            }

            let mut changed = false;
            for name in &stratum.relations {
                if let Some(relation) = db.get_mut(name) {
                    changed |= relation.commit(prov);
                }
            }
            tracing::debug!(
                stratum = stratum_index,
                iteration = iterations,
                changed,
                "iteration committed"
            );

            if !changed {
                break;
            }
            if let Some(limit) = options.iter_limit {
                if iterations >= limit {
                    tracing::warn!(
                        stratum = stratum_index,
                        iterations,
                        "iteration limit reached before fixpoint"
                    );
                    return Ok(RunStatus::Truncated {
                        stratum: stratum_index,
                        iterations: total_iterations + iterations,
                    });
                }
            }
        }
        total_iterations += iterations;
    }

    Ok(RunStatus::Converged {
        iterations: total_iterations,
    })
}

// ---------------------------------------------------------------------------
// Rule evaluation
// ---------------------------------------------------------------------------

type Bindings = IndexMap<String, Value>;

/// Which slice of a relation a positive atom reads in this rotation.
enum AtomSource<'a, P: Provenance> {
    Full(&'a Relation<P>),
    Delta(&'a Relation<P>),
    /// The frontier as it stood before the last iteration: new tuples are
    /// skipped, changed tuples show their pre-merge tag.
    Previous(&'a Relation<P>),
    Foreign(&'a dyn crate::foreign::ForeignPredicate),
    Empty,
}

fn rule_matches<P: Provenance>(
    db: &Database<P>,
    prov: &mut P,
    registry: &ForeignRegistry,
    rule: &Rule,
    stratum: &crate::stratify::Stratum,
    delta_position: Option<usize>,
    options: &EvaluationOptions,
) -> ProvlogResult<Vec<(Tuple, P::Tag)>> {
    let mut states: Vec<(Bindings, P::Tag)> = vec![(Bindings::new(), prov.one())];

    for (index, literal) in rule.body.iter().enumerate() {
        match literal {
            BodyLiteral::Atom(atom) => {
                let source = source_for(db, registry, stratum, atom, index, delta_position);
                states = join_atom(prov, atom, &source, states, options)?;
            }
            BodyLiteral::Negated(atom) => {
                states = apply_negation(db, prov, atom, states)?;
            }
            BodyLiteral::Compute {
                dst,
                function,
                args,
            } => {
                states = apply_compute(registry, dst, function, args, states)?;
            }
        }
        if states.is_empty() {
            return Ok(Vec::new());
        }
    }

    let mut derived = Vec::with_capacity(states.len());
    for (binding, tag) in states {
        let tuple = instantiate_head(&rule.head, &binding)?;
        derived.push((tuple, tag));
    }
    Ok(derived)
}

fn source_for<'a, P: Provenance>(
    db: &'a Database<P>,
    registry: &'a ForeignRegistry,
    stratum: &crate::stratify::Stratum,
    atom: &Atom,
    index: usize,
    delta_position: Option<usize>,
) -> AtomSource<'a, P> {
    if let Some(relation) = db.get(&atom.relation) {
        if stratum.relations.contains(&atom.relation) {
            if let Some(delta) = delta_position {
                return match index.cmp(&delta) {
                    std::cmp::Ordering::Equal => AtomSource::Delta(relation),
                    std::cmp::Ordering::Less => AtomSource::Full(relation),
                    std::cmp::Ordering::Greater => AtomSource::Previous(relation),
                };
            }
        }
        return AtomSource::Full(relation);
    }
    if let Some(predicate) = registry.predicate(&atom.relation) {
        return AtomSource::Foreign(predicate);
    }
    AtomSource::Empty
}

fn join_atom<P: Provenance>(
    prov: &mut P,
    atom: &Atom,
    source: &AtomSource<'_, P>,
    states: Vec<(Bindings, P::Tag)>,
    options: &EvaluationOptions,
) -> ProvlogResult<Vec<(Bindings, P::Tag)>> {
    let mut next = Vec::new();
    match source {
        AtomSource::Empty => {}
        AtomSource::Foreign(predicate) => {
            for (binding, tag) in &states {
                // The bound prefix must be fully resolved before the
                // predicate can generate.
                if atom.terms.len() != predicate.arity() {
                    continue;
                }
                let bound: Option<Vec<Value>> = atom.terms[..predicate.num_bound()]
                    .iter()
                    .map(|t| resolve(t, binding))
                    .collect();
                let Some(bound) = bound else { continue };
                for (dyn_tag, tuple) in predicate.evaluate(&bound) {
                    if let Some(extended) = unify(atom, &tuple, binding) {
                        let fact_tag = prov.tagging_dyn(&dyn_tag);
                        let combined = prov.mult(tag, &fact_tag);
                        if options.early_discard && prov.discard(&combined) {
                            continue;
                        }
                        next.push((extended, combined));
                    }
                }
            }
        }
        AtomSource::Full(relation) | AtomSource::Delta(relation) | AtomSource::Previous(relation) => {
            let iterate = |f: &mut dyn FnMut(&Tuple, &P::Tag)| match source {
                AtomSource::Full(_) => {
                    for (t, tag) in relation.iter() {
                        f(t, tag);
                    }
                }
                AtomSource::Delta(_) => {
                    for (t, tag) in relation.delta() {
                        f(t, tag);
                    }
                }
                AtomSource::Previous(_) => {
                    for (t, tag) in relation.iter() {
                        if let Some(old) = relation.prior_tag(t) {
                            f(t, old);
                        } else if !relation.delta_contains(t) {
                            f(t, tag);
                        }
                    }
                }
                _ => {}
            };
            for (binding, tag) in &states {
                iterate(&mut |tuple, fact_tag| {
                    if let Some(extended) = unify(atom, tuple, binding) {
                        let combined = prov.mult(tag, fact_tag);
                        if options.early_discard && prov.discard(&combined) {
                            return;
                        }
                        next.push((extended, combined));
                    }
                });
            }
        }
    }
    Ok(next)
}

/// A negated atom never binds; it rescales (or kills) the tag of each
/// candidate. The negated tag is the complement of the `add`-combination of
/// every matching tuple's tag; a complement indistinguishable from `zero`
/// drops the candidate outright.
fn apply_negation<P: Provenance>(
    db: &Database<P>,
    prov: &P,
    atom: &Atom,
    states: Vec<(Bindings, P::Tag)>,
) -> ProvlogResult<Vec<(Bindings, P::Tag)>> {
    let relation = db.get(&atom.relation);
    let mut next = Vec::new();
    for (binding, tag) in states {
        let mut combined: Option<P::Tag> = None;
        if let Some(relation) = relation {
            for (tuple, fact_tag) in relation.iter() {
                if unify(atom, tuple, &binding).is_some() {
                    combined = Some(match combined {
                        Some(acc) => prov.add(&acc, fact_tag),
                        None => fact_tag.clone(),
                    });
                }
            }
        }
        let unsupported = || ConfigError::NegationUnsupported {
            provenance: prov.name().to_string(),
        };
        match combined {
            // Nothing matched: the negation holds outright.
            None => {
                let negated = prov.negate(&prov.zero()).ok_or_else(unsupported)?;
                next.push((binding, prov.mult(&tag, &negated)));
            }
            Some(acc) => {
                let negated = prov.negate(&acc).ok_or_else(unsupported)?;
                // A complement indistinguishable from zero kills the
                // candidate instead of deriving a zero-tagged fact.
                if prov.saturated(&prov.zero(), &negated) {
                    continue;
                }
                next.push((binding, prov.mult(&tag, &negated)));
            }
        }
    }
    Ok(next)
}

fn apply_compute<T: Clone>(
    registry: &ForeignRegistry,
    dst: &str,
    function: &str,
    args: &[Term],
    states: Vec<(Bindings, T)>,
) -> ProvlogResult<Vec<(Bindings, T)>> {
    let function_impl =
        registry
            .function(function)
            .ok_or_else(|| RuntimeError::UnknownForeignFunction {
                name: function.to_string(),
            })?;
    let mut next = Vec::new();
    for (mut binding, tag) in states {
        let resolved: Option<Vec<Value>> = args.iter().map(|a| resolve(a, &binding)).collect();
        let Some(resolved) = resolved else { continue };
        // `None` from the function drops the candidate silently.
        let Some(result) = function_impl.call(&resolved) else {
            continue;
        };
        match binding.get(dst) {
            Some(existing) if *existing != result => continue,
            Some(_) => {}
            None => {
                binding.insert(dst.to_string(), result);
            }
        }
        next.push((binding, tag));
    }
    Ok(next)
}

fn resolve(term: &Term, binding: &Bindings) -> Option<Value> {
    match term {
        Term::Constant(c) => Some(c.clone()),
        Term::Variable(v) => binding.get(v).cloned(),
    }
}

fn unify(atom: &Atom, tuple: &Tuple, binding: &Bindings) -> Option<Bindings> {
    if atom.terms.len() != tuple.arity() {
        return None;
    }
    let mut out = binding.clone();
    for (term, value) in atom.terms.iter().zip(tuple.iter()) {
        match term {
            Term::Constant(c) => {
                if c != value {
                    return None;
                }
            }
            Term::Variable(v) => match out.get(v) {
                Some(existing) => {
                    if existing != value {
                        return None;
                    }
                }
                None => {
                    out.insert(v.clone(), value.clone());
                }
            },
        }
    }
    Some(out)
}

fn instantiate_head(head: &Atom, binding: &Bindings) -> ProvlogResult<Tuple> {
    head.terms
        .iter()
        .map(|term| {
            resolve(term, binding).ok_or_else(|| {
                RuntimeError::UnboundHeadVariable {
                    variable: term.to_string(),
                    relation: head.relation.clone(),
                }
                .into()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{cst, var};
    use crate::provenance::{
        AddMultProbProvenance, BooleanProvenance, MinMaxProbProvenance, NaturalProvenance,
        UnitProvenance,
    };

    fn atom(rel: &str, vars: &[&str]) -> Atom {
        Atom::new(rel, vars.iter().map(|v| var(*v)).collect())
    }

    fn closure_rules() -> Vec<Rule> {
        vec![
            Rule::from_atoms(atom("path", &["a", "b"]), vec![atom("edge", &["a", "b"])]),
            Rule::from_atoms(
                atom("path", &["a", "c"]),
                vec![atom("path", &["a", "b"]), atom("edge", &["b", "c"])],
            ),
        ]
    }

    fn options() -> EvaluationOptions {
        EvaluationOptions {
            iter_limit: None,
            early_discard: true,
        }
    }

    fn run<P: Provenance>(
        db: &mut Database<P>,
        prov: &mut P,
        rules: &[Rule],
        opts: &EvaluationOptions,
    ) -> RunStatus {
        let registry = ForeignRegistry::default();
        validate_program(rules, prov, &registry).unwrap();
        let strat = Stratification::compute(rules).unwrap();
        let affected = vec![true; strat.strata.len()];
        evaluate(db, prov, &registry, &strat, &affected, opts).unwrap()
    }

    fn chain_edges<T>(n: i64) -> Vec<(Option<T>, Tuple)> {
        (0..n - 1).map(|i| (None, Tuple::from((i, i + 1)))).collect()
    }

    #[test]
    fn transitive_closure_over_a_chain() {
        let mut prov = UnitProvenance::default();
        let mut db: Database<UnitProvenance> = Database::default();
        db.insert_facts(&mut prov, "edge", chain_edges(5), true)
            .unwrap();
        let status = run(&mut db, &mut prov, &closure_rules(), &options());
        assert!(status.is_converged());
        // n*(n-1)/2 ordered pairs on a 5-node chain.
        assert_eq!(db.get("path").unwrap().len(), 10);
    }

    #[test]
    fn counting_derivations_in_a_diamond() {
        let mut prov = NaturalProvenance::default();
        let mut db: Database<NaturalProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (None, Tuple::from((0i64, 1i64))),
                (None, Tuple::from((0i64, 2i64))),
                (None, Tuple::from((1i64, 3i64))),
                (None, Tuple::from((2i64, 3i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let path = db.get("path").unwrap();
        // Two distinct derivations of path(0, 3); single-hop paths have one.
        assert_eq!(path.tag_of(&Tuple::from((0i64, 3i64))), Some(&2));
        assert_eq!(path.tag_of(&Tuple::from((0i64, 1i64))), Some(&1));
    }

    #[test]
    fn counting_stays_exact_when_a_tag_grows_after_use() {
        // Chain 0->1->2->3 plus the shortcut 0->2. path(0, 2) picks up its
        // second derivation only after the first one has already produced
        // path(0, 3), so the late increment must propagate without the
        // earlier contribution being counted again.
        let mut prov = NaturalProvenance::default();
        let mut db: Database<NaturalProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (None, Tuple::from((0i64, 1i64))),
                (None, Tuple::from((1i64, 2i64))),
                (None, Tuple::from((2i64, 3i64))),
                (None, Tuple::from((0i64, 2i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let path = db.get("path").unwrap();
        assert_eq!(path.tag_of(&Tuple::from((0i64, 2i64))), Some(&2));
        assert_eq!(path.tag_of(&Tuple::from((0i64, 3i64))), Some(&2));
    }

    #[test]
    fn noisy_or_folds_each_derivation_once() {
        // Same topology with probabilities. path(0, 3) has two derivations,
        // 0.6 * 0.7 and 0.9 * 0.8 * 0.7; its tag is their noisy-or fold,
        // 0.42 + 0.504 - 0.42 * 0.504.
        let mut prov = AddMultProbProvenance::default();
        let mut db: Database<AddMultProbProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (Some(0.9), Tuple::from((0i64, 1i64))),
                (Some(0.8), Tuple::from((1i64, 2i64))),
                (Some(0.7), Tuple::from((2i64, 3i64))),
                (Some(0.6), Tuple::from((0i64, 2i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let path = db.get("path").unwrap();
        let p02 = path.tag_of(&Tuple::from((0i64, 2i64))).unwrap();
        assert!((p02 - 0.888).abs() < 1e-9);
        let p03 = path.tag_of(&Tuple::from((0i64, 3i64))).unwrap();
        assert!((p03 - 0.71232).abs() < 1e-9);
    }

    #[test]
    fn quadratic_closure_counts_each_derivation_tree_once() {
        // path(a, c) :- path(a, b), path(b, c) joins two recursive atoms,
        // so changed tuples meet both the delta and the pre-delta frontier.
        let rules = vec![
            Rule::from_atoms(atom("path", &["a", "b"]), vec![atom("edge", &["a", "b"])]),
            Rule::from_atoms(
                atom("path", &["a", "c"]),
                vec![atom("path", &["a", "b"]), atom("path", &["b", "c"])],
            ),
        ];
        let mut prov = NaturalProvenance::default();
        let mut db: Database<NaturalProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (None, Tuple::from((0i64, 1i64))),
                (None, Tuple::from((1i64, 2i64))),
                (None, Tuple::from((2i64, 3i64))),
                (None, Tuple::from((0i64, 2i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let path = db.get("path").unwrap();
        // path(0, 2): the direct edge, or path(0, 1) * path(1, 2).
        assert_eq!(path.tag_of(&Tuple::from((0i64, 2i64))), Some(&2));
        // path(0, 3): path(0, 1) * path(1, 3), or either path(0, 2)
        // derivation * path(2, 3).
        assert_eq!(path.tag_of(&Tuple::from((0i64, 3i64))), Some(&3));
    }

    #[test]
    fn late_increment_joins_the_pre_delta_frontier() {
        // Two tuples gain their second derivation in the same iteration, and
        // the next iteration joins one's increment against the other's
        // previous tag. Skipping changed tuples in the pre-delta frontier
        // (instead of showing their old tag) would lose that tree.
        let rules = vec![
            Rule::from_atoms(atom("path", &["a", "b"]), vec![atom("edge", &["a", "b"])]),
            Rule::from_atoms(
                atom("path", &["a", "c"]),
                vec![atom("path", &["a", "b"]), atom("path", &["b", "c"])],
            ),
        ];
        let mut prov = NaturalProvenance::default();
        let mut db: Database<NaturalProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (None, Tuple::from((5i64, 0i64))),
                (None, Tuple::from((0i64, 1i64))),
                (None, Tuple::from((1i64, 2i64))),
                (None, Tuple::from((2i64, 3i64))),
                (None, Tuple::from((5i64, 1i64))),
                (None, Tuple::from((1i64, 3i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let path = db.get("path").unwrap();
        assert_eq!(path.tag_of(&Tuple::from((5i64, 1i64))), Some(&2));
        assert_eq!(path.tag_of(&Tuple::from((1i64, 3i64))), Some(&2));
        assert_eq!(path.tag_of(&Tuple::from((0i64, 3i64))), Some(&3));
        // Every route from 5 to 3, each under every bracketing:
        // 5-0-1-2-3 (5 trees), 5-0-1-3 (2), 5-1-2-3 (2), 5-1-3 (1).
        assert_eq!(path.tag_of(&Tuple::from((5i64, 3i64))), Some(&10));
    }

    #[test]
    fn min_max_prob_picks_the_best_alternative() {
        let mut prov = MinMaxProbProvenance::default();
        let mut db: Database<MinMaxProbProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (Some(0.9), Tuple::from((0i64, 1i64))),
                (Some(0.8), Tuple::from((1i64, 2i64))),
                (Some(0.6), Tuple::from((0i64, 2i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let path = db.get("path").unwrap();
        // Direct 0.6 vs. min(0.9, 0.8) through the chain.
        assert_eq!(path.tag_of(&Tuple::from((0i64, 2i64))), Some(&0.8));
    }

    #[test]
    fn stratified_negation() {
        let mut rules = closure_rules();
        rules.push(Rule::new(
            atom("unreachable", &["a", "b"]),
            vec![
                BodyLiteral::Atom(atom("node", &["a"])),
                BodyLiteral::Atom(atom("node", &["b"])),
                BodyLiteral::Negated(atom("path", &["a", "b"])),
            ],
        ));
        let mut prov = BooleanProvenance::default();
        let mut db: Database<BooleanProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![(None, Tuple::from((0i64, 1i64)))],
            true,
        )
        .unwrap();
        db.insert_facts(
            &mut prov,
            "node",
            vec![
                (None, Tuple::from((0i64,))),
                (None, Tuple::from((1i64,))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let unreachable = db.get("unreachable").unwrap();
        assert!(!unreachable.contains(&Tuple::from((0i64, 1i64))));
        assert!(unreachable.contains(&Tuple::from((1i64, 0i64))));
        assert!(unreachable.contains(&Tuple::from((0i64, 0i64))));
    }

    #[test]
    fn negation_needs_an_algebra_that_can_negate() {
        let rules = vec![Rule::new(
            atom("q", &["x"]),
            vec![
                BodyLiteral::Atom(atom("base", &["x"])),
                BodyLiteral::Negated(atom("blocked", &["x"])),
            ],
        )];
        let prov = NaturalProvenance::default();
        let err = validate_program(&rules, &prov, &ForeignRegistry::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProvlogError::Config(ConfigError::NegationUnsupported { .. })
        ));
    }

    #[test]
    fn iteration_limit_reports_truncation() {
        let mut prov = UnitProvenance::default();
        let mut db: Database<UnitProvenance> = Database::default();
        db.insert_facts(&mut prov, "edge", chain_edges(20), true)
            .unwrap();
        let opts = EvaluationOptions {
            iter_limit: Some(3),
            early_discard: true,
        };
        let status = run(&mut db, &mut prov, &closure_rules(), &opts);
        assert!(matches!(status, RunStatus::Truncated { stratum: 0, .. }));
        // Partial results are still a sound under-approximation.
        let partial = db.get("path").unwrap().len();
        assert!(partial > 0);
        assert!(partial < 190);
    }

    #[test]
    fn compute_literal_binds_through_foreign_function() {
        // magnitude(y) :- reading(x), y = abs(x)
        let rules = vec![Rule::new(
            atom("magnitude", &["y"]),
            vec![
                BodyLiteral::Atom(atom("reading", &["x"])),
                BodyLiteral::Compute {
                    dst: "y".into(),
                    function: "abs".into(),
                    args: vec![var("x")],
                },
            ],
        )];
        let mut prov = UnitProvenance::default();
        let mut db: Database<UnitProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "reading",
            vec![
                (None, Tuple::from((-3i64,))),
                (None, Tuple::from((4i64,))),
                (None, Tuple::from((i64::MIN,))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let magnitude = db.get("magnitude").unwrap();
        assert!(magnitude.contains(&Tuple::from((3i64,))));
        assert!(magnitude.contains(&Tuple::from((4i64,))));
        // i64::MIN has no absolute value: dropped, not an error.
        assert_eq!(magnitude.len(), 2);
    }

    #[test]
    fn unknown_compute_function_is_rejected_up_front() {
        let rules = vec![Rule::new(
            atom("out", &["y"]),
            vec![
                BodyLiteral::Atom(atom("in", &["x"])),
                BodyLiteral::Compute {
                    dst: "y".into(),
                    function: "no_such_fn".into(),
                    args: vec![var("x")],
                },
            ],
        )];
        let err =
            validate_program(&rules, &UnitProvenance::default(), &ForeignRegistry::default())
                .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProvlogError::Runtime(RuntimeError::UnknownForeignFunction { .. })
        ));
    }

    #[test]
    fn foreign_predicate_generates_facts() {
        // within(x) :- bounds(lo, hi), range(lo, hi, x)
        let rules = vec![Rule::from_atoms(
            atom("within", &["x"]),
            vec![atom("bounds", &["lo", "hi"]), atom("range", &["lo", "hi", "x"])],
        )];
        let mut prov = UnitProvenance::default();
        let mut db: Database<UnitProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "bounds",
            vec![(None, Tuple::from((2i64, 5i64)))],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let within = db.get("within").unwrap();
        assert_eq!(within.len(), 3);
        assert!(within.contains(&Tuple::from((4i64,))));
    }

    #[test]
    fn repeated_runs_are_idempotent_even_for_counting() {
        let mut prov = NaturalProvenance::default();
        let mut db: Database<NaturalProvenance> = Database::default();
        db.insert_facts(&mut prov, "edge", chain_edges(4), true)
            .unwrap();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let first: Vec<_> = db
            .get("path")
            .unwrap()
            .iter()
            .map(|(t, c)| (t.clone(), *c))
            .collect();
        run(&mut db, &mut prov, &closure_rules(), &options());
        let second: Vec<_> = db
            .get("path")
            .unwrap()
            .iter()
            .map(|(t, c)| (t.clone(), *c))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn constants_in_body_atoms_filter() {
        let rules = vec![Rule::new(
            atom("from_zero", &["b"]),
            vec![BodyLiteral::Atom(Atom::new(
                "edge",
                vec![cst(0i64), var("b")],
            ))],
        )];
        let mut prov = UnitProvenance::default();
        let mut db: Database<UnitProvenance> = Database::default();
        db.insert_facts(
            &mut prov,
            "edge",
            vec![
                (None, Tuple::from((0i64, 1i64))),
                (None, Tuple::from((1i64, 2i64))),
            ],
            true,
        )
        .unwrap();
        run(&mut db, &mut prov, &rules, &options());
        let rel = db.get("from_zero").unwrap();
        assert_eq!(rel.len(), 1);
        assert!(rel.contains(&Tuple::from((1i64,))));
    }
}
