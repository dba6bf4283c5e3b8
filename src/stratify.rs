//! Program stratification.
//!
//! Rules are grouped into strata evaluated bottom-up: each stratum is a set
//! of relations (and the rules defining them) that may depend positively on
//! each other and on lower strata, but negatively only on *strictly* lower
//! strata. A negative edge inside a recursive component makes the program
//! unstratifiable and is rejected before evaluation.
//!
//! Stratum numbering follows the classic scheme: the number only increases
//! across negative dependency edges, so positively-connected components
//! share a stratum and converge in a single fixpoint.

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::algo::tarjan_scc;

use crate::ast::Rule;
use crate::error::RuntimeError;

/// One evaluation unit: the relations defined here and the rules that
/// define them.
#[derive(Debug, Clone)]
pub struct Stratum {
    /// Relations whose facts are derived (or seeded) in this stratum.
    pub relations: IndexSet<String>,
    /// Rules whose head lives in this stratum.
    pub rules: Vec<Rule>,
}

/// The stratified program: strata in dependency order.
#[derive(Debug, Clone)]
pub struct Stratification {
    pub strata: Vec<Stratum>,
}

impl Stratification {
    /// Group the rules of a program into strata.
    ///
    /// Relations only mentioned in bodies (pure base relations) land in the
    /// lowest stratum they can; every head relation gets exactly one home.
    pub fn compute(rules: &[Rule]) -> Result<Self, RuntimeError> {
        let mut graph: DiGraph<String, bool> = DiGraph::new();
        let mut nodes: IndexMap<String, NodeIndex> = IndexMap::new();

        let mut node_of = |graph: &mut DiGraph<String, bool>, name: &str| -> NodeIndex {
            *nodes
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()))
        };

        // Dependency edges run body-relation -> head-relation, weighted by
        // whether the dependency is through a negated atom.
        for rule in rules {
            let head = node_of(&mut graph, &rule.head.relation);
            for atom in rule.positive_atoms() {
                let body = node_of(&mut graph, &atom.relation);
                graph.add_edge(body, head, false);
            }
            for atom in rule.negated_atoms() {
                let body = node_of(&mut graph, &atom.relation);
                graph.add_edge(body, head, true);
            }
        }

        // Tarjan yields components in reverse topological order; a negative
        // edge with both endpoints in one component is negation through
        // recursion.
        let sccs = tarjan_scc(&graph);
        let mut component_of = vec![0usize; graph.node_count()];
        for (id, scc) in sccs.iter().enumerate() {
            for &node in scc {
                component_of[node.index()] = id;
            }
        }
        for edge in graph.edge_indices() {
            if let (Some(true), Some((src, dst))) =
                (graph.edge_weight(edge).copied(), graph.edge_endpoints(edge))
            {
                if component_of[src.index()] == component_of[dst.index()] {
                    return Err(RuntimeError::UnstratifiableProgram {
                        relation: graph[src].clone(),
                    });
                }
            }
        }

        // Number each component: max over incoming edges, bumping only
        // across negative ones. Walking components in topological order
        // guarantees predecessors are already numbered.
        let mut level = vec![0usize; sccs.len()];
        for (id, scc) in sccs.iter().enumerate().rev() {
            for &node in scc {
                for edge in graph.edges_directed(node, petgraph::Direction::Incoming) {
                    let pred = component_of[petgraph::visit::EdgeRef::source(&edge).index()];
                    if pred == id {
                        continue;
                    }
                    let bump = usize::from(*petgraph::visit::EdgeRef::weight(&edge));
                    level[id] = level[id].max(level[pred] + bump);
                }
            }
        }

        let stratum_count = level.iter().copied().max().map_or(0, |m| m + 1);
        let mut strata: Vec<Stratum> = (0..stratum_count)
            .map(|_| Stratum {
                relations: IndexSet::new(),
                rules: Vec::new(),
            })
            .collect();

        // Components in topological order keeps relation iteration
        // deterministic inside each stratum.
        for (id, scc) in sccs.iter().enumerate().rev() {
            for &node in scc {
                strata[level[id]].relations.insert(graph[node].clone());
            }
        }
        for rule in rules {
            let id = component_of[nodes[&rule.head.relation].index()];
            strata[level[id]].rules.push(rule.clone());
        }

        Ok(Stratification { strata })
    }

    /// All relations the stratified program mentions.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.strata
            .iter()
            .flat_map(|s| s.relations.iter().map(String::as_str))
    }

    /// Which strata must be re-evaluated after the given base relations
    /// changed. Dirtiness propagates forward: a stratum that reads an
    /// affected relation derives affected relations itself.
    pub fn affected_strata(&self, dirty: &IndexSet<String>) -> Vec<bool> {
        let mut affected: IndexSet<&str> = dirty.iter().map(String::as_str).collect();
        let mut out = Vec::with_capacity(self.strata.len());
        for stratum in &self.strata {
            let touched = stratum.rules.iter().any(|rule| {
                rule.positive_atoms()
                    .chain(rule.negated_atoms())
                    .any(|a| affected.contains(a.relation.as_str()))
            }) || stratum.relations.iter().any(|r| affected.contains(r.as_str()));
            if touched {
                for rule in &stratum.rules {
                    affected.insert(rule.head.relation.as_str());
                }
            }
            out.push(touched);
        }
        out
    }
}
