//! Canonical in-memory directed dependency graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Case-normalization policy for package names.
///
/// Applied uniformly at parse time: once a graph is built, every identity in
/// it has already been normalized. Never mix policies within one graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCase {
    /// Keep package names exactly as written in the manifest.
    #[default]
    Preserve,
    /// Upper-case every package name.
    Upper,
}

impl NameCase {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::Preserve => raw.to_string(),
            Self::Upper => raw.to_uppercase(),
        }
    }
}

/// A directed dependency graph: declared nodes in insertion order, each with
/// an ordered list of outgoing edges.
///
/// Built once by the manifest parser and read-only afterwards. Lookups never
/// fail: a name that only ever appeared as a dependency target is an implicit
/// leaf with no known dependencies of its own.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// Declared node identities, in first-declaration order.
    order: Vec<String>,
    /// Outgoing edges per declared node. Duplicates and self-edges are kept;
    /// edge order is observable output and must stay as inserted.
    adj: HashMap<String, Vec<String>>,
}

const NO_DEPS: &[String] = &[];

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node. A repeated declaration is a no-op; the original
    /// position in the insertion order is kept.
    pub fn add_node(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.adj.contains_key(&id) {
            self.order.push(id.clone());
            self.adj.insert(id, Vec::new());
        }
    }

    /// Add a directed edge `from → to`. Declares `from` if it is new; `to`
    /// stays an implicit leaf until it is declared itself.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        self.add_node(from.clone());
        if let Some(deps) = self.adj.get_mut(&from) {
            deps.push(to.into());
        }
    }

    /// Whether `id` has been declared (appeared as a key, not just a target).
    pub fn contains(&self, id: &str) -> bool {
        self.adj.contains_key(id)
    }

    /// Declared nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Total number of edges across all nodes.
    pub fn edge_count(&self) -> usize {
        self.adj.values().map(Vec::len).sum()
    }

    /// Ordered dependencies of `id`. Empty for unknown nodes — never an error.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.adj.get(id).map_or(NO_DEPS, Vec::as_slice)
    }

    /// Build the reverse graph: every edge `a → b` becomes `b → a`.
    ///
    /// Every original node is preserved even if it gains no incoming edges,
    /// and nodes that only appeared as dependency targets become declared, so
    /// reverse traversal from a leaf works.
    pub fn reversed(&self) -> Self {
        let mut rev = Self::new();
        for node in &self.order {
            rev.add_node(node.clone());
        }
        for node in &self.order {
            for dep in self.dependencies_of(node) {
                rev.add_edge(dep.clone(), node.clone());
            }
        }
        rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_multiset(graph: &DepGraph) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = graph
            .nodes()
            .flat_map(|n| {
                graph
                    .dependencies_of(n)
                    .iter()
                    .map(move |d| (n.to_string(), d.clone()))
            })
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn unknown_node_is_implicit_leaf() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "b");
        assert!(graph.contains("a"));
        assert!(!graph.contains("b"));
        assert!(graph.dependencies_of("b").is_empty());
        assert!(graph.dependencies_of("never-seen").is_empty());
    }

    #[test]
    fn edge_order_and_duplicates_preserved() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "c");
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        assert_eq!(graph.dependencies_of("a"), ["c", "b", "c"]);
    }

    #[test]
    fn self_edge_permitted() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "a");
        assert_eq!(graph.dependencies_of("a"), ["a"]);
    }

    #[test]
    fn redeclaration_keeps_position() {
        let mut graph = DepGraph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_node("a");
        let nodes: Vec<&str> = graph.nodes().collect();
        assert_eq!(nodes, ["a", "b"]);
    }

    #[test]
    fn reversed_declares_target_only_nodes() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "b");
        let rev = graph.reversed();
        assert!(rev.contains("b"));
        assert_eq!(rev.dependencies_of("b"), ["a"]);
        // "a" gained no incoming edges but is still present.
        assert!(rev.contains("a"));
        assert!(rev.dependencies_of("a").is_empty());
    }

    #[test]
    fn reversed_twice_round_trips_edge_multiset() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        graph.add_edge("b", "c");
        graph.add_edge("c", "a");
        graph.add_node("lonely");
        let round_trip = graph.reversed().reversed();
        assert_eq!(edge_multiset(&graph), edge_multiset(&round_trip));
    }

    #[test]
    fn name_case_policies() {
        assert_eq!(NameCase::Preserve.apply("OpenSSL"), "OpenSSL");
        assert_eq!(NameCase::Upper.apply("openssl"), "OPENSSL");
    }
}
