//! RTM Core - the build pipeline
//!
//! The single entry point external consumers use: hand in a document
//! corpus, the external verification records and a schema; receive one
//! immutable [`TraceGraph`] with its [`ValidationResult`] attached.
//!
//! ```text
//! parse (parallel per document)
//!   -> merge (document order, duplicate detection downstream)
//!   -> build graph (schema-driven linking + validation checks)
//!   -> metrics rollup
//! ```
//!
//! A build always returns a graph plus diagnostics, never a bare failure
//! for imperfect input; the only fatal error is a malformed schema.
//!
//! # Example
//!
//! ```
//! use rtm_core::{build_trace, PipelineOptions, SourceDocument};
//! use rtm_graph::GraphSchema;
//! use rtm_record::RecordSet;
//!
//! let documents = vec![SourceDocument::new(
//!     "specs/auth.rtm",
//!     "# REQ-p00001 Authentication (product)\nAssertions:\n  A. Users authenticate.\n",
//! )];
//! let graph = build_trace(
//!     &documents,
//!     RecordSet::new(),
//!     &GraphSchema::standard(),
//!     PipelineOptions::default(),
//! )
//! .expect("standard schema is valid");
//! assert_eq!(graph.roots().len(), 1);
//! ```
//!
//! [`TraceGraph`]: rtm_graph::TraceGraph
//! [`ValidationResult`]: rtm_record::ValidationResult

#![warn(unreachable_pub)]

mod pipeline;

pub use pipeline::{build_trace, PipelineOptions, SourceDocument};

// Re-exports for consumers that only depend on rtm-core
pub use rtm_graph::{
    compute_metrics, GraphBuilder, GraphSchema, NodeKind, SchemaError, TraceGraph, TraceNode,
};
pub use rtm_record::{
    CheckKind, Diagnostic, RecordSet, Severity, ValidationResult,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving an RTM build
    pub use crate::{build_trace, PipelineOptions, SourceDocument};
    pub use rtm_graph::{GraphSchema, NodeKind, TraceGraph};
    pub use rtm_ident::{ReqId, ReqLevel};
    pub use rtm_record::{CheckKind, RecordSet, Severity};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
