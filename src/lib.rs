//! provlog: a provenance-generic Datalog engine.
//!
//! Rules are evaluated bottom-up to a fixpoint; every derived fact carries
//! a tag from a pluggable algebra (a [`Provenance`]), so the same program
//! can answer plain reachability, count derivations, propagate confidence
//! scores, or recover exact probabilities over full proof sets — just by
//! swapping the algebra the session runs over.
//!
//! ```
//! use provlog::provenance::MinMaxProbProvenance;
//! use provlog::{var, Atom, Rule, Session, Tuple};
//!
//! # fn main() -> provlog::ProvlogResult<()> {
//! let mut session = Session::new(MinMaxProbProvenance::default());
//! session.add_rule(Rule::from_atoms(
//!     Atom::new("path", vec![var("a"), var("b")]),
//!     vec![Atom::new("edge", vec![var("a"), var("b")])],
//! ))?;
//! session.add_rule(Rule::from_atoms(
//!     Atom::new("path", vec![var("a"), var("c")]),
//!     vec![
//!         Atom::new("path", vec![var("a"), var("b")]),
//!         Atom::new("edge", vec![var("b"), var("c")]),
//!     ],
//! ))?;
//! session.add_tagged_facts(
//!     "edge",
//!     vec![
//!         (Some(0.9), Tuple::from((0i64, 1i64))),
//!         (Some(0.8), Tuple::from((1i64, 2i64))),
//!     ],
//! )?;
//! assert!(session.run()?.is_converged());
//! let p = session.recover_tuple("path", &Tuple::from((0i64, 2i64)))?;
//! assert_eq!(p, Some(0.8));
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod foreign;
pub mod proofs;
pub mod provenance;
pub mod session;
pub mod store;
pub mod stratify;
pub mod tuple;
pub mod value;
pub mod wmc;

pub use ast::{cst, var, Atom, BodyLiteral, Rule, Term};
pub use error::{ConfigError, ProvlogError, ProvlogResult, RuntimeError, TypeError};
pub use evaluator::RunStatus;
pub use foreign::{ForeignFunction, ForeignPredicate, ForeignRegistry};
pub use proofs::Proofs;
pub use provenance::{DynInputTag, Provenance, ProvenanceKind};
pub use session::{Session, SessionConfig};
pub use tuple::{Tuple, TupleType};
pub use value::{Value, ValueType};
