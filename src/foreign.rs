//! Foreign functions and predicates: the escape hatch into host Rust.
//!
//! A foreign *function* is a pure partial map from values to a value,
//! invoked through compute literals; returning `None` silently drops the
//! candidate binding (division by zero, a failed parse) rather than
//! aborting evaluation. A foreign *predicate* generates tagged tuples from
//! bound arguments, so external data sources can feed facts into a join.
//! Predicates yield [`DynInputTag`]s, keeping them independent of the
//! session's tag algebra.
//!
//! Both kinds live in a session-scoped [`ForeignRegistry`]; a handful of
//! builtins are registered out of the box.

use indexmap::IndexMap;

use crate::provenance::DynInputTag;
use crate::tuple::Tuple;
use crate::value::Value;

/// A pure host function callable from compute literals.
pub trait ForeignFunction {
    /// Name used in compute literals.
    fn name(&self) -> &str;

    /// Apply to fully bound arguments. `None` drops the binding.
    fn call(&self, args: &[Value]) -> Option<Value>;
}

/// A host-backed fact generator.
pub trait ForeignPredicate {
    fn name(&self) -> &str;

    /// Total number of argument positions.
    fn arity(&self) -> usize;

    /// How many leading positions must be bound before evaluation. The
    /// remaining positions are free and filled by the yielded tuples.
    fn num_bound(&self) -> usize;

    /// Yield the full tuples (bound prefix included) matching the bound
    /// prefix, each with a dynamic input tag.
    fn evaluate(&self, bound: &[Value]) -> Vec<(DynInputTag, Tuple)>;
}

/// Session-scoped lookup table for foreign functions and predicates.
pub struct ForeignRegistry {
    functions: IndexMap<String, Box<dyn ForeignFunction>>,
    predicates: IndexMap<String, Box<dyn ForeignPredicate>>,
}

impl std::fmt::Debug for ForeignRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ForeignRegistry {
    /// A registry pre-loaded with the builtins.
    fn default() -> Self {
        let mut registry = ForeignRegistry {
            functions: IndexMap::new(),
            predicates: IndexMap::new(),
        };
        registry.register_function(Box::new(Abs));
        registry.register_function(Box::new(StringConcat));
        registry.register_predicate(Box::new(Range));
        registry
    }
}

impl ForeignRegistry {
    /// An empty registry, without the builtins.
    pub fn empty() -> Self {
        ForeignRegistry {
            functions: IndexMap::new(),
            predicates: IndexMap::new(),
        }
    }

    /// Register a function, replacing any previous one of the same name.
    pub fn register_function(&mut self, function: Box<dyn ForeignFunction>) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn register_predicate(&mut self, predicate: Box<dyn ForeignPredicate>) {
        self.predicates
            .insert(predicate.name().to_string(), predicate);
    }

    pub fn function(&self, name: &str) -> Option<&dyn ForeignFunction> {
        self.functions.get(name).map(Box::as_ref)
    }

    pub fn predicate(&self, name: &str) -> Option<&dyn ForeignPredicate> {
        self.predicates.get(name).map(Box::as_ref)
    }
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

/// `abs(x)`: absolute value of any signed numeric.
struct Abs;

impl ForeignFunction for Abs {
    fn name(&self) -> &str {
        "abs"
    }

    fn call(&self, args: &[Value]) -> Option<Value> {
        match args {
            [Value::I8(v)] => Some(Value::I8(v.checked_abs()?)),
            [Value::I16(v)] => Some(Value::I16(v.checked_abs()?)),
            [Value::I32(v)] => Some(Value::I32(v.checked_abs()?)),
            [Value::I64(v)] => Some(Value::I64(v.checked_abs()?)),
            [Value::F32(v)] => Some(Value::F32(v.abs())),
            [Value::F64(v)] => Some(Value::F64(v.abs())),
            [u @ (Value::U8(_) | Value::U16(_) | Value::U32(_) | Value::U64(_))] => {
                Some(u.clone())
            }
            _ => None,
        }
    }
}

/// `string_concat(a, b, …)`: concatenate string arguments.
struct StringConcat;

impl ForeignFunction for StringConcat {
    fn name(&self) -> &str {
        "string_concat"
    }

    fn call(&self, args: &[Value]) -> Option<Value> {
        let mut out = String::new();
        for arg in args {
            match arg {
                Value::Str(s) => out.push_str(s),
                _ => return None,
            }
        }
        Some(Value::Str(out))
    }
}

/// `range(lo, hi, x)`: yields `x` in `lo..hi`. Bound positions: `lo`, `hi`.
struct Range;

impl ForeignPredicate for Range {
    fn name(&self) -> &str {
        "range"
    }

    fn arity(&self) -> usize {
        3
    }

    fn num_bound(&self) -> usize {
        2
    }

    fn evaluate(&self, bound: &[Value]) -> Vec<(DynInputTag, Tuple)> {
        let (lo, hi) = match bound {
            [Value::I64(lo), Value::I64(hi)] => (*lo, *hi),
            _ => return Vec::new(),
        };
        (lo..hi)
            .map(|x| (DynInputTag::None, Tuple::from((lo, hi, x))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_handles_signed_unsigned_and_overflow() {
        let registry = ForeignRegistry::default();
        let abs = registry.function("abs").unwrap();
        assert_eq!(abs.call(&[Value::I64(-4)]), Some(Value::I64(4)));
        assert_eq!(abs.call(&[Value::U32(7)]), Some(Value::U32(7)));
        assert_eq!(abs.call(&[Value::F64(-1.5)]), Some(Value::F64(1.5)));
        // i64::MIN has no absolute value: the binding is dropped.
        assert_eq!(abs.call(&[Value::I64(i64::MIN)]), None);
        assert_eq!(abs.call(&[Value::Str("nope".into())]), None);
    }

    #[test]
    fn string_concat_is_variadic() {
        let registry = ForeignRegistry::default();
        let concat = registry.function("string_concat").unwrap();
        assert_eq!(
            concat.call(&[Value::from("foo"), Value::from("bar")]),
            Some(Value::from("foobar"))
        );
        assert_eq!(concat.call(&[Value::from("a"), Value::I64(1)]), None);
    }

    #[test]
    fn range_yields_full_tuples() {
        let registry = ForeignRegistry::default();
        let range = registry.predicate("range").unwrap();
        let out = range.evaluate(&[Value::I64(0), Value::I64(3)]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].1, Tuple::from((0i64, 3i64, 2i64)));
        assert!(matches!(out[0].0, DynInputTag::None));
    }

    #[test]
    fn registration_replaces_by_name() {
        struct AlwaysZero;
        impl ForeignFunction for AlwaysZero {
            fn name(&self) -> &str {
                "abs"
            }
            fn call(&self, _args: &[Value]) -> Option<Value> {
                Some(Value::I64(0))
            }
        }
        let mut registry = ForeignRegistry::default();
        registry.register_function(Box::new(AlwaysZero));
        let abs = registry.function("abs").unwrap();
        assert_eq!(abs.call(&[Value::I64(-4)]), Some(Value::I64(0)));
    }

    #[test]
    fn unknown_names_are_absent() {
        let registry = ForeignRegistry::empty();
        assert!(registry.function("abs").is_none());
        assert!(registry.predicate("range").is_none());
    }
}
