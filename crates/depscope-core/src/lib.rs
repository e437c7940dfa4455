//! Core types for the depscope dependency graph engine.
//!
//! Provides the canonical graph model ([`graph::DepGraph`]), manifest parsing
//! for the supported input formats ([`manifest`]), run configuration, and the
//! typed error taxonomy shared by every consumer.

pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
