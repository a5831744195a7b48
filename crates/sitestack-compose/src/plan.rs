//! Plan compilation.
//!
//! Orders a [`DependencyGraph`] so that every dependency precedes its
//! dependents. Among declarations that are ready at the same time the
//! lexicographically smallest name goes first, which makes the plan a
//! pure function of the graph.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::graph::{Graph, NodeIndex};
use serde::Serialize;
use sitestack_common::error::{Result, SiteStackError};

use crate::declaration::ResourceDeclaration;
use crate::graph::{Dependency, DependencyGraph};

/// One entry of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Zero-based position in the plan.
    pub position: usize,
    /// The declaration to apply.
    pub declaration: ResourceDeclaration,
    /// Direct dependencies, sorted by name.
    pub dependencies: Vec<String>,
}

impl PlanStep {
    /// Returns the declaration name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.declaration.name()
    }
}

/// A deterministic, dependency-respecting apply order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// Returns the ordered steps.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the declaration names in plan order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(PlanStep::name).collect()
    }

    /// Returns the step for `name`.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.name() == name)
    }

    /// Returns the position of `name` in the plan.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.step(name).map(|s| s.position)
    }

    /// Serializes the plan to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compiles a graph into a plan.
///
/// # Errors
///
/// Returns [`SiteStackError::CycleDetected`] listing every declaration on a
/// cycle if the graph is not acyclic. No partial plan is produced.
pub fn compile(graph: DependencyGraph) -> Result<Plan> {
    tracing::info!(count = graph.len(), "compiling plan");
    let (graph, mut declarations) = graph.into_parts();

    let order = stable_toposort(&graph)?;

    let mut steps = Vec::with_capacity(order.len());
    for (position, idx) in order.into_iter().enumerate() {
        let name = &graph[idx];
        let declaration = declarations
            .remove(name)
            .ok_or_else(|| SiteStackError::NotFound {
                kind: "declaration",
                id: name.clone(),
            })?;
        let mut dependencies: Vec<String> = graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| graph[n].clone())
            .collect();
        dependencies.sort_unstable();
        dependencies.dedup();
        tracing::debug!(position, name = %name, "planned");
        steps.push(PlanStep {
            position,
            declaration,
            dependencies,
        });
    }

    Ok(Plan { steps })
}

/// Builds the graph for `declarations` and compiles it.
///
/// # Errors
///
/// Returns any error of [`DependencyGraph::build`] or [`compile`].
pub fn compile_declarations(declarations: &[ResourceDeclaration]) -> Result<Plan> {
    compile(DependencyGraph::build(declarations)?)
}

/// Kahn's algorithm with a name-ordered ready set.
fn stable_toposort(graph: &Graph<String, Dependency>) -> Result<Vec<NodeIndex>> {
    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut ready: BTreeMap<&str, NodeIndex> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&n, _)| (graph[n].as_str(), n))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some((_, idx)) = ready.pop_first() {
        order.push(idx);
        for next in graph.neighbors_directed(idx, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    let _ = ready.insert(graph[next].as_str(), next);
                }
            }
        }
    }

    if order.len() < graph.node_count() {
        let names = cycle_members(graph);
        tracing::debug!(?names, "cycle detected");
        return Err(SiteStackError::CycleDetected { names });
    }
    Ok(order)
}

/// Names on a cycle: members of non-trivial strongly connected components
/// plus nodes with a self-loop.
fn cycle_members(graph: &Graph<String, Dependency>) -> Vec<String> {
    let mut names: Vec<String> = petgraph::algo::tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n)))
        .flatten()
        .map(|n| graph[n].clone())
        .collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(name: &str) -> ResourceDeclaration {
        ResourceDeclaration::storage_bucket(name)
            .option("bucket_name", format!("{name}-bucket"))
            .build()
            .expect("bucket")
    }

    fn node(name: &str, deps: &[&str]) -> ResourceDeclaration {
        deps.iter()
            .fold(
                ResourceDeclaration::identity(name).option("comment", name),
                |b, d| b.depends_on(*d),
            )
            .build()
            .expect("identity")
    }

    fn record(name: &str, target: &str) -> ResourceDeclaration {
        ResourceDeclaration::dns_record(name)
            .option("zone", "example.com")
            .option("record_name", "example.com")
            .reference("target", target)
            .build()
            .expect("record")
    }

    fn assert_edges_respected(plan: &Plan, decls: &[ResourceDeclaration]) {
        let graph = DependencyGraph::build(decls).expect("build");
        for (dependent, dependency, _) in graph.edges() {
            let a = plan.position_of(dependent).expect("dependent planned");
            let b = plan.position_of(dependency).expect("dependency planned");
            assert!(b < a, "{dependency} must precede {dependent}: {:?}", plan.names());
        }
    }

    #[test]
    fn empty_graph_compiles_to_empty_plan() {
        let plan = compile_declarations(&[]).expect("compile");
        assert!(plan.is_empty());
    }

    #[test]
    fn site_scenario_orders_bucket_cdn_then_records_by_name() {
        let decls = vec![
            record("dns-www", "cdn"),
            bucket("site"),
            record("dns-a", "cdn"),
            ResourceDeclaration::cdn_distribution("cdn")
                .reference("origin", "site")
                .depends_on("site")
                .build()
                .expect("cdn"),
        ];
        let plan = compile_declarations(&decls).expect("compile");
        assert_eq!(plan.names(), vec!["site", "cdn", "dns-a", "dns-www"]);
        assert_eq!(plan.step("cdn").expect("cdn").dependencies, vec!["site"]);
        assert_eq!(plan.position_of("dns-www"), Some(3));
    }

    #[test]
    fn ties_break_by_name() {
        let plan = compile_declarations(&[node("c", &[]), node("a", &[]), node("b", &[])])
            .expect("compile");
        assert_eq!(plan.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn ready_set_reopens_smaller_names() {
        // "a" only becomes ready after "z", and must then go before "y".
        let decls = vec![node("z", &[]), node("a", &["z"]), node("y", &["z"])];
        let plan = compile_declarations(&decls).expect("compile");
        assert_eq!(plan.names(), vec!["z", "a", "y"]);
    }

    #[test]
    fn diamond_dependency() {
        let decls = vec![
            node("a", &["b", "c"]),
            node("b", &["d"]),
            node("c", &["d"]),
            node("d", &[]),
        ];
        let plan = compile_declarations(&decls).expect("compile");
        assert_eq!(plan.names(), vec!["d", "b", "c", "a"]);
        assert_eq!(plan.step("a").expect("a").dependencies, vec!["b", "c"]);
        assert_edges_respected(&plan, &decls);
    }

    #[test]
    fn every_declaration_appears_once_and_edges_hold() {
        let decls = vec![
            node("api", &["db", "cache", "queue"]),
            node("cache", &["net"]),
            node("db", &["net", "volume"]),
            node("net", &[]),
            node("queue", &["net"]),
            node("volume", &[]),
            node("worker", &["queue", "db"]),
            node("zz-standalone", &[]),
        ];
        let plan = compile_declarations(&decls).expect("compile");
        assert_eq!(plan.len(), decls.len());
        let mut names = plan.names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), decls.len());
        for (i, step) in plan.steps().iter().enumerate() {
            assert_eq!(step.position, i);
        }
        assert_edges_respected(&plan, &decls);
    }

    #[test]
    fn recompiling_is_byte_identical() {
        let decls = vec![
            record("dns-a", "cdn"),
            record("dns-www", "cdn"),
            ResourceDeclaration::cdn_distribution("cdn")
                .reference("origin", "site")
                .build()
                .expect("cdn"),
            bucket("site"),
        ];
        let graph = DependencyGraph::build(&decls).expect("build");
        let first = compile(graph.clone()).expect("compile").to_json().expect("json");
        let second = compile(graph).expect("compile").to_json().expect("json");
        assert_eq!(first, second);

        let mut reversed = decls;
        reversed.reverse();
        let third = compile_declarations(&reversed)
            .expect("compile")
            .to_json()
            .expect("json");
        assert_eq!(first, third);
    }

    #[test]
    fn two_node_cycle_names_both() {
        let err = compile_declarations(&[node("a", &["b"]), node("b", &["a"])]).unwrap_err();
        match err {
            SiteStackError::CycleDetected { names } => assert_eq!(names, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn three_node_cycle_excludes_downstream_nodes() {
        let decls = vec![
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
            node("d", &["a"]),
            node("e", &[]),
        ];
        let err = compile_declarations(&decls).unwrap_err();
        match err {
            SiteStackError::CycleDetected { names } => assert_eq!(names, vec!["a", "b", "c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = compile_declarations(&[node("loop", &["loop"])]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
        assert!(msg.contains("loop"), "got: {msg}");
    }

    #[test]
    fn plan_json_preserves_config_payload() {
        let plan = compile_declarations(&[bucket("site")]).expect("compile");
        let json: serde_json::Value =
            serde_json::from_str(&plan.to_json().expect("json")).expect("parse");
        let step = &json["steps"][0];
        assert_eq!(step["position"], 0);
        assert_eq!(step["declaration"]["name"], "site");
        assert_eq!(step["declaration"]["kind"], "storage-bucket");
        assert_eq!(
            step["declaration"]["config"]["bucket_name"]["value"],
            "site-bucket"
        );
    }
}
