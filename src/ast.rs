//! Rule AST: the compiled form handed to the engine by the front end.
//!
//! The surface-language parser is an external collaborator; embedders build
//! these values directly (the builder helpers keep that terse). A rule is a
//! head atom plus a conjunction of body literals: positive atoms, negated
//! atoms, and compute literals that bind a variable through a foreign
//! function.

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::value::Value;

/// A term inside an atom: a named variable or a constant value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Variable(String),
    Constant(Value),
}

/// Shorthand for a variable term.
pub fn var(name: impl Into<String>) -> Term {
    Term::Variable(name.into())
}

/// Shorthand for a constant term.
pub fn cst(value: impl Into<Value>) -> Term {
    Term::Constant(value.into())
}

/// A predicate pattern: relation name plus argument terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    pub relation: String,
    pub terms: Vec<Term>,
}

impl Atom {
    pub fn new(relation: impl Into<String>, terms: Vec<Term>) -> Self {
        Atom {
            relation: relation.into(),
            terms,
        }
    }

    /// The variables occurring in this atom, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(v) => Some(v.as_str()),
            Term::Constant(_) => None,
        })
    }
}

/// One conjunct of a rule body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyLiteral {
    /// A positive atom, joined against the relation's facts.
    Atom(Atom),
    /// A negated atom. Only checked, never binding; must depend on a
    /// strictly lower stratum.
    Negated(Atom),
    /// Bind `dst` to the result of a foreign function applied to `args`.
    /// A `None` return silently drops the candidate binding.
    Compute {
        dst: String,
        function: String,
        args: Vec<Term>,
    },
}

impl BodyLiteral {
    /// The variables this literal *binds* (negated atoms bind nothing).
    fn bound_variables(&self) -> Vec<&str> {
        match self {
            BodyLiteral::Atom(atom) => atom.variables().collect(),
            BodyLiteral::Negated(_) => Vec::new(),
            BodyLiteral::Compute { dst, .. } => vec![dst.as_str()],
        }
    }
}

/// A single rule: `head :- body₁, …, bodyₙ`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<BodyLiteral>,
}

impl Rule {
    pub fn new(head: Atom, body: Vec<BodyLiteral>) -> Self {
        Rule { head, body }
    }

    /// Build a rule from plain positive atoms (the common case).
    pub fn from_atoms(head: Atom, body: Vec<Atom>) -> Self {
        Rule {
            head,
            body: body.into_iter().map(BodyLiteral::Atom).collect(),
        }
    }

    /// Whether any body literal is negated.
    pub fn has_negation(&self) -> bool {
        self.body
            .iter()
            .any(|l| matches!(l, BodyLiteral::Negated(_)))
    }

    /// Positive body atoms.
    pub fn positive_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|l| match l {
            BodyLiteral::Atom(a) => Some(a),
            _ => None,
        })
    }

    /// Negated body atoms.
    pub fn negated_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|l| match l {
            BodyLiteral::Negated(a) => Some(a),
            _ => None,
        })
    }

    /// Range-restriction check: every head variable must be bound by a
    /// positive body atom or a compute destination.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let bound: Vec<&str> = self
            .body
            .iter()
            .flat_map(BodyLiteral::bound_variables)
            .collect();
        for head_var in self.head.variables() {
            if !bound.contains(&head_var) {
                return Err(RuntimeError::UnboundHeadVariable {
                    variable: head_var.to_string(),
                    relation: self.head.relation.clone(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{v}"),
            Term::Constant(c) => write!(f, "{c}"),
        }
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.relation)?;
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{t}")?;
        }
        write!(f, ")")
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} :- ", self.head)?;
        for (i, lit) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match lit {
                BodyLiteral::Atom(a) => write!(f, "{a}")?,
                BodyLiteral::Negated(a) => write!(f, "not {a}")?,
                BodyLiteral::Compute {
                    dst,
                    function,
                    args,
                } => {
                    write!(f, "{dst} = {function}(")?;
                    for (j, a) in args.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ")")?;
                }
            }
        }
        Ok(())
    }
}
