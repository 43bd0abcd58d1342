//! Lineage graph engine
//!
//! This crate handles:
//! - Building a directed graph from nodes and connections
//! - Upstream/downstream traversal, optionally depth-bounded
//! - Subgraph extraction around focus nodes
//! - Cycle detection and path enumeration
//! - Imputing placeholder nodes for dangling `select_from` references

pub mod graph;
pub mod cycles;
pub mod paths;
pub mod resolver;

pub use graph::{LineageGraph, Subgraph};
pub use resolver::{find_missing, impute, ImputationStats, Resolver};
