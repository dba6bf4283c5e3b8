//! Tagged tuple storage.
//!
//! A [`Relation`] is a deduplicating map from tuples to tags: inserting a
//! tuple that is already present merges the tags through the algebra's
//! `add` instead of storing a duplicate row. Storage is split the way the
//! semi-naive evaluator consumes it — a `stable` frontier of everything
//! derived so far and a `delta` of what changed in the latest iteration —
//! with candidate facts staged and committed once per iteration.
//!
//! Insertion order is preserved (`IndexMap`), so iteration over query
//! results is deterministic run to run.

use indexmap::IndexMap;

use crate::error::{ConfigError, ProvlogError, TypeError};
use crate::provenance::Provenance;
use crate::tuple::{Tuple, TupleType};

/// A single relation: schema plus tagged tuples.
///
/// Externally inserted facts are additionally kept in `base`, so derived
/// content can be rebuilt from scratch when a stratum is re-evaluated.
#[derive(Debug, Clone)]
pub struct Relation<P: Provenance> {
    schema: TupleType,
    base: IndexMap<Tuple, P::Tag>,
    stable: IndexMap<Tuple, P::Tag>,
    delta: IndexMap<Tuple, P::Tag>,
    prior: IndexMap<Tuple, P::Tag>,
    staged: IndexMap<Tuple, P::Tag>,
}

impl<P: Provenance> Relation<P> {
    pub fn new(schema: TupleType) -> Self {
        Relation {
            schema,
            base: IndexMap::new(),
            stable: IndexMap::new(),
            delta: IndexMap::new(),
            prior: IndexMap::new(),
            staged: IndexMap::new(),
        }
    }

    pub fn schema(&self) -> &TupleType {
        &self.schema
    }

    /// Number of distinct tuples derived so far.
    pub fn len(&self) -> usize {
        self.stable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stable.is_empty()
    }

    /// All tuples and their current tags, in first-derivation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Tuple, &P::Tag)> {
        self.stable.iter()
    }

    /// Tuples whose tag appeared or changed in the last committed iteration.
    ///
    /// The tag is that iteration's `add`-contribution, not the merged total:
    /// earlier contributions of a changed tuple have already flowed
    /// downstream, so joining the delta with the merged tag would count
    /// them again under a non-idempotent `add`.
    pub fn delta(&self) -> impl Iterator<Item = (&Tuple, &P::Tag)> {
        self.delta.iter()
    }

    pub fn tag_of(&self, tuple: &Tuple) -> Option<&P::Tag> {
        self.stable.get(tuple)
    }

    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.stable.contains_key(tuple)
    }

    /// Merge an externally inserted fact into both the base set and the
    /// stable frontier.
    pub fn insert_base(&mut self, prov: &P, tuple: Tuple, tag: P::Tag) {
        match self.base.get_mut(&tuple) {
            Some(old) => *old = prov.add(old, &tag),
            None => {
                self.base.insert(tuple.clone(), tag.clone());
            }
        }
        match self.stable.get_mut(&tuple) {
            Some(old) => *old = prov.add(old, &tag),
            None => {
                self.stable.insert(tuple, tag);
            }
        }
    }

    /// Stage a candidate fact produced during the current iteration.
    /// Duplicate candidates for the same tuple merge through `add`.
    pub fn stage(&mut self, prov: &P, tuple: Tuple, tag: P::Tag) {
        match self.staged.get_mut(&tuple) {
            Some(pending) => *pending = prov.add(pending, &tag),
            None => {
                self.staged.insert(tuple, tag);
            }
        }
    }

    /// Commit the staged candidates, replacing the delta. A tuple counts as
    /// changed when it is new, or when merging left its tag unsaturated.
    /// Returns whether anything changed.
    ///
    /// For a changed tuple the delta records the staged increment and
    /// `prior` records the pre-merge tag; the stable frontier holds the
    /// merged total.
    pub fn commit(&mut self, prov: &P) -> bool {
        self.delta.clear();
        self.prior.clear();
        for (tuple, tag) in std::mem::take(&mut self.staged) {
            match self.stable.get_mut(&tuple) {
                Some(old) => {
                    let merged = prov.add(old, &tag);
                    if !prov.saturated(old, &merged) {
                        self.prior.insert(tuple.clone(), old.clone());
                        *old = merged;
                        self.delta.insert(tuple, tag);
                    }
                }
                None => {
                    self.stable.insert(tuple.clone(), tag.clone());
                    self.delta.insert(tuple, tag);
                }
            }
        }
        !self.delta.is_empty()
    }

    /// Restart semi-naive evaluation with the whole stable frontier as the
    /// delta. Used to seed the first iteration of a stratum.
    pub fn seed_delta(&mut self) {
        self.delta = self.stable.clone();
        self.prior.clear();
    }

    pub fn clear_delta(&mut self) {
        self.delta.clear();
        self.prior.clear();
    }

    pub fn delta_contains(&self, tuple: &Tuple) -> bool {
        self.delta.contains_key(tuple)
    }

    /// The pre-merge tag of a tuple whose tag changed in the last committed
    /// iteration. `None` for unchanged tuples and for tuples that first
    /// appeared in that iteration.
    pub fn prior_tag(&self, tuple: &Tuple) -> Option<&P::Tag> {
        self.prior.get(tuple)
    }

    /// Discard derived content, keeping only externally inserted facts.
    /// Re-evaluating a stratum starts here so repeated runs agree.
    pub fn reset_to_base(&mut self) {
        self.stable = self.base.clone();
        self.delta.clear();
        self.prior.clear();
        self.staged.clear();
    }
}

/// The collection of relations a session evaluates over.
#[derive(Debug, Clone)]
pub struct Database<P: Provenance> {
    relations: IndexMap<String, Relation<P>>,
}

impl<P: Provenance> Default for Database<P> {
    fn default() -> Self {
        Database {
            relations: IndexMap::new(),
        }
    }
}

impl<P: Provenance> Database<P> {
    /// Declare a relation's schema up front. Redeclaring with the same
    /// schema is a no-op; with a different one, a [`ConfigError`].
    pub fn declare(&mut self, name: &str, schema: TupleType) -> Result<(), ConfigError> {
        match self.relations.get(name) {
            Some(existing) if *existing.schema() != schema => Err(ConfigError::SchemaConflict {
                relation: name.to_string(),
                declared: existing.schema().to_string(),
                offered: schema.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.relations.insert(name.to_string(), Relation::new(schema));
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Relation<P>> {
        self.relations.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Relation<P>> {
        self.relations.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &Relation<P>)> {
        self.relations.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Fetch the relation for a rule head, creating it with the schema of
    /// the first derived tuple.
    pub fn entry_for(&mut self, name: &str, tuple: &Tuple) -> &mut Relation<P> {
        self.relations
            .entry(name.to_string())
            .or_insert_with(|| Relation::new(tuple.tuple_type()))
    }

    /// Insert a batch of externally tagged facts.
    ///
    /// The batch is validated as a whole first. With `type_check` enabled an
    /// ill-typed batch is rejected atomically, every offender listed; with
    /// it disabled offenders are skipped with a warning and the rest are
    /// inserted.
    pub fn insert_facts(
        &mut self,
        prov: &mut P,
        name: &str,
        facts: Vec<(Option<P::InputTag>, Tuple)>,
        type_check: bool,
    ) -> Result<(), ProvlogError> {
        if facts.is_empty() {
            return Ok(());
        }

        // Relation schema: previously declared, or inferred from the first
        // tuple of the batch.
        let relation = self
            .relations
            .entry(name.to_string())
            .or_insert_with(|| Relation::new(facts[0].1.tuple_type()));
        let schema = relation.schema().clone();

        let mut offenders: Vec<(usize, TypeError)> = Vec::new();
        for (index, (_, tuple)) in facts.iter().enumerate() {
            if let Err(err) = schema.check(name, tuple) {
                offenders.push((index, err));
            }
        }

        if !offenders.is_empty() {
            if type_check {
                let listed = offenders
                    .iter()
                    .map(|(i, e)| format!("[{i}] {e}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(TypeError::FactBatch {
                    relation: name.to_string(),
                    count: offenders.len(),
                    offenders: listed,
                }
                .into());
            }
            tracing::warn!(
                relation = name,
                skipped = offenders.len(),
                "type checking disabled; skipping ill-typed tuples"
            );
        }

        let skip: Vec<usize> = offenders.iter().map(|(i, _)| *i).collect();
        for (index, (input, tuple)) in facts.into_iter().enumerate() {
            if skip.binary_search(&index).is_ok() {
                continue;
            }
            let tag = prov.tagging_fn(input);
            relation.insert_base(prov, tuple, tag);
        }
        Ok(())
    }
}
