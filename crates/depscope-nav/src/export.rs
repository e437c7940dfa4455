//! Flatten a graph into a directed edge list for external renderers.

use depscope_core::graph::DepGraph;
use std::fmt::Write;

/// Directed `(from, to)` pairs: nodes in graph insertion order, dependencies
/// in edge order.
///
/// Forward mode draws `node → dependency`; with `reverse` every pair is
/// swapped at the point of emission (no reversed graph is materialized), so
/// the same data draws `dependency → node`.
pub fn edge_list(graph: &DepGraph, reverse: bool) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(graph.edge_count());
    for node in graph.nodes() {
        for dep in graph.dependencies_of(node) {
            if reverse {
                pairs.push((dep.clone(), node.to_string()));
            } else {
                pairs.push((node.to_string(), dep.clone()));
            }
        }
    }
    pairs
}

/// Plain-text edge list, one `from -> to` line per pair.
pub fn format_edges(graph: &DepGraph, reverse: bool) -> String {
    let mut out = String::new();
    for (from, to) in edge_list(graph, reverse) {
        writeln!(out, "{from} -> {to}").unwrap();
    }
    out
}

/// DOT (Graphviz) digraph over the pair list — the payload handed to an
/// external graph-image renderer.
pub fn export_dot(graph: &DepGraph, reverse: bool) -> String {
    let mut out = String::new();
    writeln!(out, "digraph deps {{").unwrap();
    writeln!(out, "  rankdir=LR;").unwrap();
    writeln!(out, "  node [shape=box, fontsize=10];").unwrap();
    for (from, to) in edge_list(graph, reverse) {
        writeln!(out, "  \"{}\" -> \"{}\";", from, to).unwrap();
    }
    writeln!(out, "}}").unwrap();
    out
}
