//! Breadth-first reachability ordering.

use depscope_core::graph::DepGraph;
use std::collections::{HashSet, VecDeque};

/// Breadth-first traversal from `start`: each reachable node exactly once,
/// in first-visit order, `start` first.
///
/// A node is marked visited when dequeued, not when enqueued — re-enqueueing
/// an already-visited node is a no-op at dequeue time, which is what makes
/// the traversal terminate on cyclic graphs without any cycle pre-check.
/// A `start` that was never declared still yields `[start]`: it is its own
/// implicit leaf.
pub fn bfs(graph: &DepGraph, start: &str) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut order = Vec::new();

    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        if !visited.insert(node) {
            continue;
        }
        order.push(node.to_string());
        for dep in graph.dependencies_of(node) {
            queue.push_back(dep);
        }
    }
    order
}

/// Breadth-first traversal over the reversed graph: who depends on `start`,
/// transitively.
pub fn bfs_reverse(graph: &DepGraph, start: &str) -> Vec<String> {
    let reversed = graph.reversed();
    bfs(&reversed, start)
}
