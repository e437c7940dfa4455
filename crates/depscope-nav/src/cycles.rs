//! Cycle detection via three-color depth-first search.
//!
//! Nodes are UNVISITED, ON-STACK (an ancestor on the current DFS path), or
//! DONE (fully explored, no cycle through it). An edge into an ON-STACK node
//! is a back-edge and proves a cycle. The walk uses an explicit stack of
//! (node, next-child) frames so deep chains cannot overflow the call stack.

use depscope_core::graph::DepGraph;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    OnStack,
    Done,
}

/// Result of a whole-graph cycle check.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub has_cycle: bool,
    /// The first cycle found, as the node sequence along the path (not
    /// closed; the first node is implied to follow the last).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
    /// Human-readable form: `A -> B -> A`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    pub summary: String,
}

/// Whether any directed cycle exists anywhere in the graph.
///
/// Every declared node is tried as a DFS root, so disconnected components
/// are covered; the DONE coloring makes repeated roots cheap. This is the
/// strong guarantee — a cycle may exist that no particular start node
/// reaches, see [`cycle_reachable_from`].
pub fn has_cycle(graph: &DepGraph) -> bool {
    first_cycle(graph).is_some()
}

/// The first cycle found anywhere in the graph, scanning roots in node
/// insertion order. `None` on a DAG.
pub fn first_cycle(graph: &DepGraph) -> Option<Vec<String>> {
    let mut color: HashMap<&str, Color> = HashMap::new();
    for node in graph.nodes() {
        if let Some(cycle) = dfs_from(graph, node, &mut color) {
            return Some(cycle);
        }
    }
    None
}

/// Whether a walk from `start` can run into a node already on its own path.
///
/// Weaker than [`has_cycle`]: only cycles reachable from `start` count. This
/// is the guarantee the tree renderer relies on — it only needs recursion
/// along the printed path to terminate.
pub fn cycle_reachable_from(graph: &DepGraph, start: &str) -> bool {
    let mut color = HashMap::new();
    dfs_from(graph, start, &mut color).is_some()
}

/// Run the whole-graph check and wrap it in a serializable report.
pub fn detect(graph: &DepGraph) -> CycleReport {
    let cycle = first_cycle(graph);
    let representation = cycle.as_deref().map(format_cycle);
    let summary = match &representation {
        Some(repr) => format!("cyclic dependency detected: {repr}"),
        None => "no cyclic dependencies detected".to_string(),
    };
    CycleReport {
        has_cycle: cycle.is_some(),
        cycle,
        representation,
        summary,
    }
}

/// Format a cycle as `A -> B -> A`, closing it back to its first node.
pub fn format_cycle(cycle: &[String]) -> String {
    if cycle.is_empty() {
        return String::new();
    }
    let mut out = cycle.join(" -> ");
    out.push_str(" -> ");
    out.push_str(&cycle[0]);
    out
}

/// Iterative DFS from `start`. Returns the active-path segment that forms a
/// cycle on the first back-edge, or `None` if the subtree is acyclic.
/// `color` is shared across roots so DONE nodes are never re-explored.
fn dfs_from<'a>(
    graph: &'a DepGraph,
    start: &'a str,
    color: &mut HashMap<&'a str, Color>,
) -> Option<Vec<String>> {
    if color.get(start).copied().unwrap_or(Color::Unvisited) != Color::Unvisited {
        return None;
    }

    // Each frame is (node, index of the next dependency to try).
    let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];
    color.insert(start, Color::OnStack);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let deps = graph.dependencies_of(node);

        if next >= deps.len() {
            color.insert(node, Color::Done);
            stack.pop();
            continue;
        }
        frame.1 += 1;

        let dep = deps[next].as_str();
        match color.get(dep).copied().unwrap_or(Color::Unvisited) {
            Color::OnStack => {
                // Back-edge: the cycle is the active path from `dep` down to
                // `node`. Everything ON-STACK lives in this stack, so the
                // position scan always succeeds.
                if let Some(pos) = stack.iter().position(|&(n, _)| n == dep) {
                    return Some(stack[pos..].iter().map(|&(n, _)| n.to_string()).collect());
                }
            }
            Color::Done => {}
            Color::Unvisited => {
                color.insert(dep, Color::OnStack);
                stack.push((dep, 0));
            }
        }
    }
    None
}
