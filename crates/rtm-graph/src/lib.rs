//! RTM Trace Graph
//!
//! The traceability DAG: schema-driven construction, validation and
//! metrics rollup.
//!
//! # Core Concepts
//!
//! - [`GraphSchema`]: declarative relationship table; the builder is a
//!   generic interpreter over it, so new relationship kinds are new table
//!   rows, not new code paths
//! - [`TraceGraph`] / [`TraceNode`]: arena-backed DAG with typed payloads
//!   and three restartable traversal orders
//! - [`GraphBuilder`]: resolves records into nodes and edges, then runs
//!   the validation checks; always returns a graph plus diagnostics
//! - [`compute_metrics`]: leaf-to-root rollup over deduplicated descendant
//!   sets (no double counting under shared DAG ancestry)
//!
//! # Two-phase lifecycle
//!
//! A build constructs and validates the graph, the rollup pass attaches
//! metrics, and from then on the graph is read-only; concurrent readers
//! need no locking.

#![warn(unreachable_pub)]

mod builder;
mod checks;
mod graph;
mod node;
mod rollup;
mod schema;
mod traversal;

pub use builder::{BuildInput, BuildOptions, GraphBuilder};
pub use graph::{NodeKey, TraceGraph};
pub use node::{AssertionNode, EdgeRef, NodeIdx, NodeKind, NodeMetrics, NodePayload, TraceNode};
pub use rollup::compute_metrics;
pub use schema::{
    EdgeDirection, GraphSchema, LevelRule, RelationSpec, SchemaError, TargetField,
};
pub use traversal::{LevelOrder, PostOrder, PreOrder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
