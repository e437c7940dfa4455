//! ASCII dependency tree rendering.
//!
//! Depth-first descent from a root, tracking the *active path* only: a node
//! met again via a different branch is shared structure and renders again in
//! full, while a node already on its own ancestor path is a true cycle and
//! renders as a marker without recursing. The descent uses an explicit frame
//! stack so pathological chain depth cannot overflow the call stack.

use depscope_core::graph::DepGraph;
use serde::Serialize;
use std::collections::HashSet;

/// Marker text appended to a node that closes a cycle.
pub const CYCLE_MARKER: &str = "(cycle detected)";

/// One row of the rendered tree, in print order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    /// 0 for the root, +1 per nesting level.
    pub depth: usize,
    pub label: String,
    /// True when this node is an ancestor on the active path; its subtree is
    /// not descended into.
    pub cycle: bool,
}

/// Flatten the dependency tree from `root` into rows in print order.
///
/// A DAG with shared substructure duplicates the shared subtree per parent;
/// that is the contract ("tree view of a possibly-cyclic graph"), not a bug.
pub fn render_rows(graph: &DepGraph, root: &str) -> Vec<TreeRow> {
    let mut rows = vec![TreeRow {
        depth: 0,
        label: root.to_string(),
        cycle: false,
    }];

    let mut on_path: HashSet<&str> = HashSet::new();
    on_path.insert(root);
    // Each frame is (node, index of the next dependency to print).
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let deps = graph.dependencies_of(node);

        if next >= deps.len() {
            on_path.remove(node);
            stack.pop();
            continue;
        }
        frame.1 += 1;

        let dep = deps[next].as_str();
        if on_path.contains(dep) {
            rows.push(TreeRow {
                depth: stack.len(),
                label: dep.to_string(),
                cycle: true,
            });
        } else {
            rows.push(TreeRow {
                depth: stack.len(),
                label: dep.to_string(),
                cycle: false,
            });
            on_path.insert(dep);
            stack.push((dep, 0));
        }
    }
    rows
}

/// Render the tree from `root` with box-drawing branches.
pub fn render(graph: &DepGraph, root: &str) -> String {
    format_rows(&render_rows(graph, root))
}

/// Draw rows with `├─`/`└─` connectors and `│` continuation lines.
///
/// Whether a row gets `├─` or `└─` depends on a later sibling existing at
/// the same depth before the branch closes, so this is a second pass over
/// the already-flattened rows.
pub fn format_rows(rows: &[TreeRow]) -> String {
    let mut out = String::new();
    // open[d] == true while the most recent row at depth d still has a
    // sibling coming after it.
    let mut open: Vec<bool> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let label = if row.cycle {
            format!("{} {}", row.label, CYCLE_MARKER)
        } else {
            row.label.clone()
        };

        if row.depth == 0 {
            out.push_str(&label);
            out.push('\n');
            open.clear();
            continue;
        }

        open.truncate(row.depth);
        let has_later_sibling = rows[i + 1..]
            .iter()
            .find(|r| r.depth <= row.depth)
            .is_some_and(|r| r.depth == row.depth);
        if open.len() < row.depth {
            open.resize(row.depth, false);
        }
        open[row.depth - 1] = has_later_sibling;

        for &level_open in &open[..row.depth - 1] {
            out.push_str(if level_open { "│  " } else { "   " });
        }
        out.push_str(if has_later_sibling { "├─ " } else { "└─ " });
        out.push_str(&label);
        out.push('\n');
    }
    out
}
