//! Tuples and relation schemas.
//!
//! A [`Tuple`] is an ordered, fixed-arity sequence of [`Value`]s with
//! structural equality — the unit of deduplication within a relation.
//! A [`TupleType`] is the declared (or inferred) column-type schema of a
//! relation; conformance checks report the exact offending position.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::TypeError;
use crate::value::{Value, ValueType};

/// An ordered, fixed-arity sequence of values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tuple(SmallVec<[Value; 3]>);

impl Tuple {
    /// Create a tuple from a sequence of values.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Tuple(values.into_iter().collect())
    }

    /// Number of values in the tuple.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Get the value at a position, if in range.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Iterate over the values.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// The tuple's runtime type, position by position.
    pub fn tuple_type(&self) -> TupleType {
        TupleType::new(self.0.iter().map(Value::value_type))
    }
}

impl std::ops::Index<usize> for Tuple {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Tuple(values.into_iter().collect())
    }
}

impl<A: Into<Value>> From<(A,)> for Tuple {
    fn from((a,): (A,)) -> Self {
        Tuple::new([a.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Tuple {
    fn from((a, b): (A, B)) -> Self {
        Tuple::new([a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Tuple {
    fn from((a, b, c): (A, B, C)) -> Self {
        Tuple::new([a.into(), b.into(), c.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>, D: Into<Value>> From<(A, B, C, D)> for Tuple {
    fn from((a, b, c, d): (A, B, C, D)) -> Self {
        Tuple::new([a.into(), b.into(), c.into(), d.into()])
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The column-type schema of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleType(Vec<ValueType>);

impl TupleType {
    /// Create a schema from a sequence of column types.
    pub fn new(types: impl IntoIterator<Item = ValueType>) -> Self {
        TupleType(types.into_iter().collect())
    }

    /// The declared arity.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// The column types.
    pub fn columns(&self) -> &[ValueType] {
        &self.0
    }

    /// Check a tuple against this schema.
    ///
    /// Returns the first mismatch (arity first, then position by position).
    pub fn check(&self, relation: &str, tuple: &Tuple) -> Result<(), TypeError> {
        if tuple.arity() != self.arity() {
            return Err(TypeError::ArityMismatch {
                relation: relation.to_string(),
                expected: self.arity(),
                actual: tuple.arity(),
            });
        }
        for (position, (expected, value)) in self.0.iter().zip(tuple.iter()).enumerate() {
            let actual = value.value_type();
            if actual != *expected {
                return Err(TypeError::ValueTypeMismatch {
                    relation: relation.to_string(),
                    position,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TupleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{t}")?;
        }
        write!(f, ")")
    }
}
