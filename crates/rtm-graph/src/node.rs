//! Graph nodes
//!
//! Nodes live in an index-addressable arena ([`crate::TraceGraph`]) and
//! refer to each other by [`NodeIdx`], so multi-parent DAG shapes need no
//! shared-ownership tricks and a finished graph is safe to read
//! concurrently.

use rtm_ident::ReqId;
use rtm_record::{CodeRef, Journey, Requirement, SourceLocation, TestRef, TestResult};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Arena index of a node
pub type NodeIdx = usize;

/// One labelled edge endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Index of the node on the other end
    pub target: NodeIdx,
    /// Index of the relation in the schema table that created the edge
    pub relation: usize,
}

/// The closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A requirement block
    Requirement,
    /// A single assertion within a requirement
    Assertion,
    /// A code reference
    Code,
    /// A test definition
    Test,
    /// A test execution result
    TestResult,
    /// A user journey (non-normative)
    Journey,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Requirement => "requirement",
            NodeKind::Assertion => "assertion",
            NodeKind::Code => "code",
            NodeKind::Test => "test",
            NodeKind::TestResult => "test-result",
            NodeKind::Journey => "journey",
        };
        f.write_str(s)
    }
}

/// An assertion hoisted into its own node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionNode {
    /// Assertion-scoped identifier (owner id plus this label)
    pub id: ReqId,
    /// Label within the owning requirement
    pub label: char,
    /// Obligation text
    pub text: String,
    /// Explicit marker suppressing the coverage-gap check
    pub waived: bool,
}

/// The one populated payload of a node, matching its kind exactly
///
/// Consumers match exhaustively; there is no "wrong field read for this
/// kind" state to get into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodePayload {
    /// Requirement payload
    Requirement(Requirement),
    /// Assertion payload
    Assertion(AssertionNode),
    /// Code reference payload
    Code(CodeRef),
    /// Test definition payload
    Test(TestRef),
    /// Test result payload
    TestResult(TestResult),
    /// Journey payload
    Journey(Journey),
}

impl NodePayload {
    /// Kind of this payload
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Requirement(_) => NodeKind::Requirement,
            NodePayload::Assertion(_) => NodeKind::Assertion,
            NodePayload::Code(_) => NodeKind::Code,
            NodePayload::Test(_) => NodeKind::Test,
            NodePayload::TestResult(_) => NodeKind::TestResult,
            NodePayload::Journey(_) => NodeKind::Journey,
        }
    }
}

/// Metrics attached to a node by the rollup pass
///
/// All counts are over the node itself plus its distinct descendants
/// through rollup-eligible edges; shared DAG ancestry is counted once.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Assertions in the subtree
    pub assertions_total: usize,
    /// Assertions with at least one covering edge
    pub assertions_covered: usize,
    /// Distinct tests in the subtree
    pub tests_total: usize,
    /// Test results that passed
    pub results_passed: usize,
    /// Test results that failed
    pub results_failed: usize,
    /// Test results that were skipped
    pub results_skipped: usize,
    /// Test results with unknown outcome
    pub results_unknown: usize,
    /// Code references in the subtree
    pub code_refs: usize,
    /// `assertions_covered / assertions_total` as a percentage; 0 when
    /// there are no assertions
    pub coverage_pct: f64,
    /// `results_passed / all results` as a percentage; 0 when there are
    /// no results
    pub pass_rate_pct: f64,
}

impl NodeMetrics {
    /// Total test results of any status
    #[inline]
    #[must_use]
    pub fn results_total(&self) -> usize {
        self.results_passed + self.results_failed + self.results_skipped + self.results_unknown
    }
}

/// A node in the trace graph
///
/// Mutated only while the builder attaches edges and the rollup pass
/// attaches metrics; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    /// Arena index of this node
    pub idx: NodeIdx,
    /// Display label (identifier text, test id, file:line, ...)
    pub label: String,
    /// Source location, when one is known
    pub location: Option<SourceLocation>,
    /// The typed payload
    pub payload: NodePayload,
    pub(crate) parents: Vec<EdgeRef>,
    pub(crate) children: Vec<EdgeRef>,
    pub(crate) metrics: Option<NodeMetrics>,
}

impl TraceNode {
    pub(crate) fn new(
        idx: NodeIdx,
        label: String,
        location: Option<SourceLocation>,
        payload: NodePayload,
    ) -> Self {
        Self {
            idx,
            label,
            location,
            payload,
            parents: Vec::new(),
            children: Vec::new(),
            metrics: None,
        }
    }

    /// Kind of this node
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    /// Parent edges (a node may have several parents)
    #[inline]
    #[must_use]
    pub fn parents(&self) -> &[EdgeRef] {
        &self.parents
    }

    /// Child edges
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[EdgeRef] {
        &self.children
    }

    /// Rollup metrics; `None` before the rollup pass or on conflicting
    /// nodes
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> Option<&NodeMetrics> {
        self.metrics.as_ref()
    }

    /// The requirement payload, when this is a requirement node
    #[inline]
    #[must_use]
    pub fn as_requirement(&self) -> Option<&Requirement> {
        match &self.payload {
            NodePayload::Requirement(req) => Some(req),
            _ => None,
        }
    }

    /// The assertion payload, when this is an assertion node
    #[inline]
    #[must_use]
    pub fn as_assertion(&self) -> Option<&AssertionNode> {
        match &self.payload {
            NodePayload::Assertion(a) => Some(a),
            _ => None,
        }
    }

    /// True for a requirement node marked conflicting by the builder
    #[inline]
    #[must_use]
    pub fn is_conflicting(&self) -> bool {
        matches!(&self.payload, NodePayload::Requirement(req) if req.conflicting)
    }
}
