//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from resource declarations. Edges come from
//! explicit `depends_on` entries and from references held in config
//! values. An edge points from the dependency to the dependent so that
//! walking it forward yields dependencies first.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{Graph, NodeIndex};
use sitestack_common::error::{Result, SiteStackError};

use crate::declaration::ResourceDeclaration;

/// Why one declaration depends on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Listed in `depends_on`.
    Explicit,
    /// Inferred from a reference held in the named option.
    Reference {
        /// Config option holding the reference.
        option: String,
    },
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "depends_on"),
            Self::Reference { option } => write!(f, "{option}"),
        }
    }
}

/// A validated dependency graph of declarations.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Internal petgraph representation; node weights are declaration names.
    graph: Graph<String, Dependency>,
    nodes: BTreeMap<String, NodeIndex>,
    declarations: BTreeMap<String, ResourceDeclaration>,
}

impl DependencyGraph {
    /// Builds the graph for a set of declarations.
    ///
    /// The inputs are cloned; nodes are inserted in name order so the
    /// internal layout does not depend on input order.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] on duplicate names and
    /// [`SiteStackError::DanglingReference`] if a dependency or reference
    /// names a declaration missing from the set.
    pub fn build(declarations: &[ResourceDeclaration]) -> Result<Self> {
        tracing::info!(count = declarations.len(), "building dependency graph");

        let mut by_name = BTreeMap::new();
        for decl in declarations {
            if by_name.insert(decl.name().to_owned(), decl.clone()).is_some() {
                return Err(SiteStackError::invalid_input(format!(
                    "duplicate declaration name: \"{}\"",
                    decl.name()
                )));
            }
        }

        let mut graph = Graph::new();
        let mut nodes = BTreeMap::new();
        for name in by_name.keys() {
            let idx = graph.add_node(name.clone());
            let _ = nodes.insert(name.clone(), idx);
        }

        for (name, decl) in &by_name {
            let dependent = nodes[name];
            for dep in decl.depends_on() {
                let dependency = lookup(&nodes, name, dep)?;
                let _ = graph.update_edge(dependency, dependent, Dependency::Explicit);
            }
            for (option, target) in decl.references() {
                let dependency = lookup(&nodes, name, target)?;
                tracing::debug!(from = %name, to = target, option, "inferred reference edge");
                let _ = graph.update_edge(
                    dependency,
                    dependent,
                    Dependency::Reference {
                        option: option.to_owned(),
                    },
                );
            }
        }

        Ok(Self {
            graph,
            nodes,
            declarations: by_name,
        })
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns whether the graph has no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Returns the declaration called `name`.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.declarations.get(name)
    }

    /// Iterates declarations in name order.
    pub fn declarations(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.declarations.values()
    }

    /// Returns the direct dependencies of `name`, sorted.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Returns the direct dependents of `name`, sorted.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Returns every edge as `(dependent, dependency, reason)`, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str, &Dependency)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (from, to) = self.graph.edge_endpoints(e)?;
                let reason = self.graph.edge_weight(e)?;
                Some((self.graph[to].as_str(), self.graph[from].as_str(), reason))
            })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        edges
    }

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        petgraph::dot::Dot::new(&self.graph).to_string()
    }

    /// Consumes the graph, returning its parts to the plan compiler.
    pub(crate) fn into_parts(
        self,
    ) -> (
        Graph<String, Dependency>,
        BTreeMap<String, ResourceDeclaration>,
    ) {
        (self.graph, self.declarations)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(name) else {
            return Vec::new();
        };
        let unique: HashSet<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        let mut names: Vec<&str> = unique.into_iter().map(|n| self.graph[n].as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn lookup(nodes: &BTreeMap<String, NodeIndex>, from: &str, target: &str) -> Result<NodeIndex> {
    nodes
        .get(target)
        .copied()
        .ok_or_else(|| SiteStackError::DanglingReference {
            from: from.to_owned(),
            missing: target.to_owned(),
        })
}
