//! Sessions: the embedder-facing facade.
//!
//! A [`Session`] owns the tag algebra, the fact database, the rule set and
//! the foreign registry, and drives the evaluator. Facts and rules are
//! added between runs; a run brings every derived relation up to the
//! fixpoint (or reports truncation). Incremental sessions track which base
//! relations changed since the last run and skip strata outside the dirty
//! cone.

use indexmap::IndexSet;

use crate::ast::Rule;
use crate::error::{ConfigError, ProvlogResult, RuntimeError};
use crate::evaluator::{self, EvaluationOptions, RunStatus};
use crate::foreign::{ForeignFunction, ForeignPredicate, ForeignRegistry};
use crate::provenance::Provenance;
use crate::store::Database;
use crate::stratify::Stratification;
use crate::tuple::{Tuple, TupleType};

/// Evaluation settings, validated at session construction.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Per-stratum iteration cap. `None` iterates to convergence.
    pub iter_limit: Option<usize>,
    /// Honor the algebra's `discard` predicate during derivation. Purely a
    /// performance knob; recoverable results do not depend on it.
    pub early_discard: bool,
    /// Check fact batches against relation schemas on insertion.
    pub type_check: bool,
    /// Re-evaluate only the strata affected by facts added since the last
    /// converged run.
    pub incremental: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            iter_limit: None,
            early_discard: true,
            type_check: true,
            incremental: false,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.iter_limit == Some(0) {
            return Err(ConfigError::InvalidConfig {
                message: "iter_limit must be at least 1 when set".into(),
            });
        }
        Ok(())
    }
}

/// An evaluation session over one tag algebra.
#[derive(Debug)]
pub struct Session<P: Provenance> {
    config: SessionConfig,
    provenance: P,
    db: Database<P>,
    rules: Vec<Rule>,
    registry: ForeignRegistry,
    has_run: bool,
    rules_changed: bool,
    dirty: IndexSet<String>,
}

impl<P: Provenance> Session<P> {
    /// A session with default configuration.
    pub fn new(provenance: P) -> Self {
        tracing::info!(provenance = provenance.name(), "session created");
        Session {
            config: SessionConfig::default(),
            provenance,
            db: Database::default(),
            rules: Vec::new(),
            registry: ForeignRegistry::default(),
            has_run: false,
            rules_changed: false,
            dirty: IndexSet::new(),
        }
    }

    /// A session that re-evaluates only the strata affected by facts added
    /// since the previous run. Shorthand for `incremental: true` in the
    /// config.
    pub fn new_incremental(provenance: P) -> Self {
        let mut session = Session::new(provenance);
        session.config.incremental = true;
        session
    }

    /// A session with explicit configuration.
    pub fn with_config(provenance: P, config: SessionConfig) -> ProvlogResult<Self> {
        config.validate()?;
        let mut session = Session::new(provenance);
        session.config = config;
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The tag algebra, for inspection (e.g. the proofs fact table).
    pub fn provenance(&self) -> &P {
        &self.provenance
    }

    /// Declare a relation's schema ahead of insertion.
    pub fn add_relation(&mut self, name: &str, schema: TupleType) -> ProvlogResult<()> {
        self.db.declare(name, schema)?;
        Ok(())
    }

    /// Add a rule. Range restriction is checked immediately.
    pub fn add_rule(&mut self, rule: Rule) -> ProvlogResult<()> {
        rule.validate()?;
        self.rules.push(rule);
        self.rules_changed = true;
        Ok(())
    }

    /// Insert a batch of optionally tagged facts.
    ///
    /// With `type_check` the batch is validated atomically against the
    /// relation's schema; without it, ill-typed tuples are skipped with a
    /// warning. The session-level `type_check` setting is the usual choice.
    pub fn add_facts(
        &mut self,
        relation: &str,
        facts: Vec<(Option<P::InputTag>, Tuple)>,
        type_check: bool,
    ) -> ProvlogResult<()> {
        self.db
            .insert_facts(&mut self.provenance, relation, facts, type_check)?;
        self.dirty.insert(relation.to_string());
        Ok(())
    }

    /// Insert facts using the session's configured type-check setting.
    pub fn add_tagged_facts(
        &mut self,
        relation: &str,
        facts: Vec<(Option<P::InputTag>, Tuple)>,
    ) -> ProvlogResult<()> {
        let type_check = self.config.type_check;
        self.add_facts(relation, facts, type_check)
    }

    /// Insert untagged facts (every tag defaults to the algebra's notion of
    /// "unconditionally true").
    pub fn add_plain_facts(
        &mut self,
        relation: &str,
        tuples: impl IntoIterator<Item = Tuple>,
    ) -> ProvlogResult<()> {
        let facts = tuples.into_iter().map(|t| (None, t)).collect();
        self.add_tagged_facts(relation, facts)
    }

    pub fn register_function(&mut self, function: Box<dyn ForeignFunction>) {
        self.registry.register_function(function);
        self.rules_changed = true;
    }

    pub fn register_predicate(&mut self, predicate: Box<dyn ForeignPredicate>) {
        self.registry.register_predicate(predicate);
        self.rules_changed = true;
    }

    /// Evaluate to fixpoint (or to the iteration cap).
    ///
    /// Running twice without intervening changes yields identical content;
    /// incremental sessions skip strata the changes cannot reach.
    pub fn run(&mut self) -> ProvlogResult<RunStatus> {
        evaluator::validate_program(&self.rules, &self.provenance, &self.registry)?;
        let stratification = Stratification::compute(&self.rules)?;

        let affected = if self.config.incremental && self.has_run && !self.rules_changed {
            stratification.affected_strata(&self.dirty)
        } else {
            vec![true; stratification.strata.len()]
        };

        tracing::debug!(
            provenance = self.provenance.name(),
            rules = self.rules.len(),
            strata = stratification.strata.len(),
            "starting evaluation"
        );

        let options = EvaluationOptions {
            iter_limit: self.config.iter_limit,
            early_discard: self.config.early_discard,
        };
        let status = evaluator::evaluate(
            &mut self.db,
            &mut self.provenance,
            &self.registry,
            &stratification,
            &affected,
            &options,
        )?;

        // A truncated stratum never stops producing changes, so its inputs
        // stay dirty: the next run re-evaluates the same cone instead of
        // reporting a clean no-op over truncated content.
        if status.is_converged() {
            self.has_run = true;
            self.rules_changed = false;
            self.dirty.clear();
        }
        Ok(status)
    }

    fn known_relation(&self, name: &str) -> bool {
        self.db.contains(name) || self.rules.iter().any(|r| r.head.relation == name)
    }

    /// The tuples of a computed relation, in first-derivation order.
    ///
    /// A relation that was computed but holds zero facts yields an empty
    /// vector; an unknown name is an error.
    pub fn computed_relation(&self, name: &str) -> ProvlogResult<Vec<Tuple>> {
        if !self.known_relation(name) {
            return Err(RuntimeError::RelationNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self
            .db
            .get(name)
            .map(|r| r.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default())
    }

    /// The tuples of a relation with their recovered output tags.
    pub fn recover(&self, name: &str) -> ProvlogResult<Vec<(P::OutputTag, Tuple)>> {
        if !self.known_relation(name) {
            return Err(RuntimeError::RelationNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self
            .db
            .get(name)
            .map(|r| {
                r.iter()
                    .map(|(t, tag)| (self.provenance.recover_fn(tag), t.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Recovered output tag of one specific tuple, if derived.
    pub fn recover_tuple(&self, name: &str, tuple: &Tuple) -> ProvlogResult<Option<P::OutputTag>> {
        if !self.known_relation(name) {
            return Err(RuntimeError::RelationNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self
            .db
            .get(name)
            .and_then(|r| r.tag_of(tuple))
            .map(|tag| self.provenance.recover_fn(tag)))
    }

    /// Number of distinct tuples in a relation.
    pub fn relation_len(&self, name: &str) -> ProvlogResult<usize> {
        if !self.known_relation(name) {
            return Err(RuntimeError::RelationNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self.db.get(name).map(|r| r.len()).unwrap_or(0))
    }
}
