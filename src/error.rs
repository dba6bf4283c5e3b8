//! Rich diagnostic error types for the provlog engine.
//!
//! Errors are split along the taxonomy callers need to reason about:
//! configuration errors (fatal, reported before any evaluation starts),
//! type errors (per offending fact, only when type checking is enabled),
//! and runtime errors (distinct conditions such as relation-not-found,
//! never conflated with "computed but empty"). Each variant carries a
//! miette `#[diagnostic]` with an error code and help text.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the provlog engine.
///
/// Each variant wraps a category-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum ProvlogError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors detected before any evaluation starts. Always fatal.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown provenance: {name}")]
    #[diagnostic(
        code(provlog::config::unknown_provenance),
        help(
            "Valid provenance names are: unit, bool, natural, tropical, \
             minmaxprob, addmultprob, proofs, topkproofs."
        )
    )]
    UnknownProvenance { name: String },

    #[error("schema conflict for relation `{relation}`: declared {declared}, redeclared {offered}")]
    #[diagnostic(
        code(provlog::config::schema_conflict),
        help(
            "A relation's arity and column types are fixed at first declaration \
             or insertion. Declare a new relation name instead of changing the \
             schema of an existing one."
        )
    )]
    SchemaConflict {
        relation: String,
        declared: String,
        offered: String,
    },

    #[error("provenance `{provenance}` does not support negation")]
    #[diagnostic(
        code(provlog::config::negation_unsupported),
        help(
            "The program contains a negated body atom but the active algebra's \
             `negate` returns None. Switch to an algebra with negation support \
             (bool, minmaxprob, addmultprob) or remove the negation."
        )
    )]
    NegationUnsupported { provenance: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(provlog::config::invalid),
        help("Check the SessionConfig fields. {message}")
    )]
    InvalidConfig { message: String },
}

// ---------------------------------------------------------------------------
// Type errors
// ---------------------------------------------------------------------------

/// Tuple/relation mismatches, reported only when type checking is enabled.
#[derive(Debug, Error, Diagnostic)]
pub enum TypeError {
    #[error("arity mismatch for relation `{relation}`: expected {expected}, got {actual}")]
    #[diagnostic(
        code(provlog::types::arity_mismatch),
        help(
            "Every tuple inserted into a relation must match the relation's \
             declared arity. Check the tuple construction at the call site."
        )
    )]
    ArityMismatch {
        relation: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "value type mismatch for relation `{relation}` at position {position}: \
         expected {expected}, got {actual}"
    )]
    #[diagnostic(
        code(provlog::types::value_mismatch),
        help(
            "The tuple's value at this position does not match the relation's \
             declared column type. Convert the value or fix the schema declaration."
        )
    )]
    ValueTypeMismatch {
        relation: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("{count} tuple(s) rejected for relation `{relation}`: {offenders}")]
    #[diagnostic(
        code(provlog::types::fact_batch),
        help(
            "Type checking is enabled and the batch contained ill-typed tuples. \
             No tuple from the batch was inserted. Fix the listed tuples, or \
             insert with type_check = false to skip offenders silently."
        )
    )]
    FactBatch {
        relation: String,
        count: usize,
        offenders: String,
    },
}

// ---------------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------------

/// Errors surfaced during program compilation or query.
#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("relation not found: `{name}`")]
    #[diagnostic(
        code(provlog::runtime::relation_not_found),
        help(
            "The relation was never declared, inserted into, or derived by a \
             rule head. A relation that was computed but holds zero facts is \
             *not* reported as not-found — it yields an empty iterator."
        )
    )]
    RelationNotFound { name: String },

    #[error("program is not stratifiable: negation on `{relation}` crosses a recursive cycle")]
    #[diagnostic(
        code(provlog::runtime::unstratifiable),
        help(
            "A rule may only depend *negatively* on relations computed in a \
             strictly lower stratum. Break the recursion through the negated \
             relation, or restructure the rules so the negation points outside \
             the cycle."
        )
    )]
    UnstratifiableProgram { relation: String },

    #[error("variable `{variable}` in the head of a rule for `{relation}` is never bound")]
    #[diagnostic(
        code(provlog::runtime::unbound_head_variable),
        help(
            "Every head variable must occur in a positive body atom or be the \
             destination of a compute literal. Negated atoms do not bind variables."
        )
    )]
    UnboundHeadVariable { variable: String, relation: String },

    #[error("unknown foreign function: `{name}`")]
    #[diagnostic(
        code(provlog::runtime::unknown_foreign_function),
        help(
            "A compute literal references a foreign function that was never \
             registered on this session. Call `register_function` before `run()`."
        )
    )]
    UnknownForeignFunction { name: String },
}

/// Convenience alias for functions returning provlog results.
pub type ProvlogResult<T> = std::result::Result<T, ProvlogError>;
