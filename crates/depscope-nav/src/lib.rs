//! Read-only analyses over a built dependency graph: breadth-first
//! traversal, cycle detection, ASCII tree rendering, and edge-list export.
//!
//! Every operation here is a total function over an immutable
//! [`depscope_core::graph::DepGraph`] and terminates on cyclic input.

pub mod cycles;
pub mod export;
pub mod traverse;
pub mod tree;
