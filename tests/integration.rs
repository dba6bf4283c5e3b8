//! End-to-end scenarios: the same transitive-closure program evaluated
//! under different tag algebras.

use provlog::provenance::{
    MinMaxProbProvenance, ProofsProvenance, TopKProofsProvenance, TropicalProvenance,
    UnitProvenance,
};
use provlog::{var, Atom, Provenance, ProvlogError, Rule, RunStatus, RuntimeError, Session, Tuple};

fn atom(rel: &str, vars: &[&str]) -> Atom {
    Atom::new(rel, vars.iter().map(|v| var(*v)).collect())
}

/// Capture engine logs per test; `RUST_LOG=provlog=debug` shows the
/// per-iteration fixpoint trace on failures.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn closure_program<P: Provenance>(session: &mut Session<P>) {
    init_tracing();
    session
        .add_rule(Rule::from_atoms(
            atom("path", &["a", "b"]),
            vec![atom("edge", &["a", "b"])],
        ))
        .unwrap();
    session
        .add_rule(Rule::from_atoms(
            atom("path", &["a", "c"]),
            vec![atom("path", &["a", "b"]), atom("edge", &["b", "c"])],
        ))
        .unwrap();
}

fn edge(a: i64, b: i64) -> Tuple {
    Tuple::from((a, b))
}

#[test]
fn plain_reachability_on_a_chain() {
    let mut session = Session::new(UnitProvenance::default());
    closure_program(&mut session);
    session
        .add_plain_facts("edge", (0..4i64).map(|i| edge(i, i + 1)))
        .unwrap();

    let status = session.run().unwrap();
    assert!(status.is_converged());

    // Every ordered pair (i, j) with i < j on a 5-node chain.
    assert_eq!(session.relation_len("path").unwrap(), 10);
    assert!(session
        .computed_relation("path")
        .unwrap()
        .contains(&edge(0, 4)));
}

#[test]
fn confidence_scores_propagate_min_max() {
    let mut session = Session::new(MinMaxProbProvenance::default());
    closure_program(&mut session);
    session
        .add_tagged_facts(
            "edge",
            vec![
                (Some(0.9), edge(0, 1)),
                (Some(0.8), edge(1, 2)),
                (Some(0.6), edge(0, 2)),
                (Some(0.7), edge(2, 3)),
            ],
        )
        .unwrap();
    session.run().unwrap();

    // Best alternative into 2: the 0.9 * 0.8 chain beats the 0.6 shortcut
    // under (max, min).
    let p02 = session.recover_tuple("path", &edge(0, 2)).unwrap().unwrap();
    assert!((p02 - 0.8).abs() < 1e-12);

    // Weakest link from 1 to 3.
    let p13 = session.recover_tuple("path", &edge(1, 3)).unwrap().unwrap();
    assert!((p13 - 0.7).abs() < 1e-12);
}

#[test]
fn exact_probability_via_proof_counting() {
    let mut session = Session::new(ProofsProvenance::new());
    closure_program(&mut session);
    session
        .add_tagged_facts(
            "edge",
            vec![
                (Some(0.9), edge(0, 1)),
                (Some(0.8), edge(1, 2)),
                (Some(0.6), edge(0, 2)),
            ],
        )
        .unwrap();
    session.run().unwrap();

    // Two derivations of path(0, 2): the direct edge and the two-hop chain.
    // Inclusion–exclusion: 0.6 + 0.72 - 0.6 * 0.72 = 0.888.
    let p02 = session.recover_tuple("path", &edge(0, 2)).unwrap().unwrap();
    assert!((p02 - 0.888).abs() < 1e-9);

    // Single-derivation tuples are just the product of their base facts.
    let p12 = session.recover_tuple("path", &edge(1, 2)).unwrap().unwrap();
    assert!((p12 - 0.8).abs() < 1e-12);
}

#[test]
fn top_k_proofs_bound_the_exact_probability_from_below() {
    let edges = vec![
        (Some(0.9), edge(0, 1)),
        (Some(0.8), edge(1, 2)),
        (Some(0.6), edge(0, 2)),
        (Some(0.5), edge(0, 3)),
        (Some(0.9), edge(3, 2)),
    ];

    let mut exact = Session::new(ProofsProvenance::new());
    closure_program(&mut exact);
    exact.add_tagged_facts("edge", edges.clone()).unwrap();
    exact.run().unwrap();
    let p_exact = exact.recover_tuple("path", &edge(0, 2)).unwrap().unwrap();

    let mut bounded = Session::new(TopKProofsProvenance::new(1));
    closure_program(&mut bounded);
    bounded.add_tagged_facts("edge", edges).unwrap();
    bounded.run().unwrap();
    let p_bounded = bounded
        .recover_tuple("path", &edge(0, 2))
        .unwrap()
        .unwrap();

    assert!(p_bounded <= p_exact + 1e-12);
    // The heaviest single proof is the 0.9 * 0.8 chain.
    assert!((p_bounded - 0.72).abs() < 1e-12);
}

#[test]
fn shortest_paths_under_the_tropical_algebra() {
    let mut session = Session::new(TropicalProvenance::default());
    closure_program(&mut session);
    session
        .add_tagged_facts(
            "edge",
            vec![
                (Some(1.0), edge(0, 1)),
                (Some(2.0), edge(1, 2)),
                (Some(5.0), edge(0, 2)),
                (Some(1.0), edge(2, 3)),
            ],
        )
        .unwrap();
    session.run().unwrap();

    // min(5, 1 + 2) hops into 2, then one more unit to 3.
    let c03 = session.recover_tuple("path", &edge(0, 3)).unwrap().unwrap();
    assert!((c03 - 4.0).abs() < 1e-12);
}

#[test]
fn truncation_is_reported_and_partial_results_remain() {
    let mut session = Session::with_config(
        UnitProvenance::default(),
        provlog::SessionConfig {
            iter_limit: Some(3),
            ..provlog::SessionConfig::default()
        },
    )
    .unwrap();
    closure_program(&mut session);
    session
        .add_plain_facts("edge", (0..29i64).map(|i| edge(i, i + 1)))
        .unwrap();

    let status = session.run().unwrap();
    assert!(matches!(status, RunStatus::Truncated { stratum: 0, .. }));

    // The partial closure is a sound under-approximation.
    let partial = session.relation_len("path").unwrap();
    assert!(partial > 0);
    assert!(partial < 29 * 30 / 2);
    assert!(session
        .computed_relation("path")
        .unwrap()
        .contains(&edge(0, 1)));
}

#[test]
fn adding_facts_between_runs_grows_the_closure() {
    let mut session = Session::new_incremental(UnitProvenance::default());
    closure_program(&mut session);

    session.add_plain_facts("edge", [edge(0, 1)]).unwrap();
    session.run().unwrap();
    assert_eq!(session.relation_len("path").unwrap(), 1);

    session.add_plain_facts("edge", [edge(1, 2)]).unwrap();
    session.run().unwrap();
    assert_eq!(session.relation_len("path").unwrap(), 3);

    session.add_plain_facts("edge", [edge(2, 3)]).unwrap();
    session.run().unwrap();
    assert_eq!(session.relation_len("path").unwrap(), 6);
}

#[test]
fn querying_an_unknown_relation_is_an_error() {
    let mut session = Session::new(UnitProvenance::default());
    closure_program(&mut session);
    session.add_plain_facts("edge", [edge(0, 1)]).unwrap();
    session.run().unwrap();

    let err = session.computed_relation("paths").unwrap_err();
    assert!(matches!(
        err,
        ProvlogError::Runtime(RuntimeError::RelationNotFound { name }) if name == "paths"
    ));
}

#[test]
fn results_are_monotone_in_the_facts() {
    let mut small = Session::new(MinMaxProbProvenance::default());
    closure_program(&mut small);
    small
        .add_tagged_facts(
            "edge",
            vec![(Some(0.9), edge(0, 1)), (Some(0.8), edge(1, 2))],
        )
        .unwrap();
    small.run().unwrap();
    let before = small.recover_tuple("path", &edge(0, 2)).unwrap().unwrap();

    // Adding an alternative can only raise a (max, min) confidence.
    small
        .add_tagged_facts("edge", vec![(Some(0.95), edge(0, 2))])
        .unwrap();
    small.run().unwrap();
    let after = small.recover_tuple("path", &edge(0, 2)).unwrap().unwrap();
    assert!(after >= before);
    assert!((after - 0.95).abs() < 1e-12);
}
