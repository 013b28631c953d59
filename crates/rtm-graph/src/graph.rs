//! The owning graph container
//!
//! An arena of [`TraceNode`]s with an identifier index for O(1) lookup,
//! a root set, the conflict list and the graph-wide validation result.

use crate::node::{EdgeRef, NodeIdx, NodeKind, NodePayload, TraceNode};
use crate::traversal::{LevelOrder, PostOrder, PreOrder};
use indexmap::IndexMap;
use rtm_ident::ReqId;
use rtm_record::{SourceLocation, ValidationResult};

/// Index key of a node
///
/// Assertion-scoped and whole-requirement identifiers index different
/// nodes; the distinction is load-bearing for coverage rollup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// Whole-requirement identifier
    Requirement(ReqId),
    /// Assertion-scoped identifier (exactly one label)
    Assertion(ReqId),
    /// Code reference key (`file:line`)
    Code(String),
    /// Qualified test id
    Test(String),
    /// Test result key (`test_id#ordinal`)
    Result(String),
    /// Journey name
    Journey(String),
}

impl NodeKey {
    /// The key a requirement-space identifier resolves through
    #[must_use]
    pub fn for_id(id: &ReqId) -> Self {
        if id.is_assertion_scoped() {
            NodeKey::Assertion(id.clone())
        } else {
            NodeKey::Requirement(id.clone())
        }
    }
}

/// The traceability DAG
///
/// Built once per build from fresh inputs; after the metrics pass it is
/// read-only and safe to share across concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct TraceGraph {
    nodes: Vec<TraceNode>,
    index: IndexMap<NodeKey, NodeIdx>,
    roots: Vec<NodeIdx>,
    conflicts: Vec<NodeIdx>,
    validation: ValidationResult,
}

impl TraceGraph {
    /// Create an empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes (conflicting nodes included)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph holds no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node to the arena
    pub(crate) fn insert(
        &mut self,
        label: String,
        location: Option<SourceLocation>,
        payload: NodePayload,
    ) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes.push(TraceNode::new(idx, label, location, payload));
        idx
    }

    /// Index a node under its key
    ///
    /// Returns the previously-indexed node on a clash (first claimant
    /// wins; the caller decides what a clash means for its kind).
    pub(crate) fn index_node(&mut self, key: NodeKey, idx: NodeIdx) -> Result<(), NodeIdx> {
        match self.index.get(&key) {
            Some(&existing) => Err(existing),
            None => {
                self.index.insert(key, idx);
                Ok(())
            }
        }
    }

    /// Record a conflicting node for the explicit conflict accessor
    pub(crate) fn push_conflict(&mut self, idx: NodeIdx) {
        self.conflicts.push(idx);
    }

    /// Link `child` under `parent` for the given schema relation
    ///
    /// Idempotent: attaching the same (edge, relation) twice is a no-op,
    /// because assertion-scoped and whole-requirement references may
    /// independently produce the same edge.
    pub(crate) fn link(&mut self, parent: NodeIdx, child: NodeIdx, relation: usize) {
        let edge_down = EdgeRef {
            target: child,
            relation,
        };
        if self.nodes[parent].children.contains(&edge_down) {
            return;
        }
        self.nodes[parent].children.push(edge_down);
        self.nodes[child].parents.push(EdgeRef {
            target: parent,
            relation,
        });
    }

    /// Compute and store the root set: parentless, non-conflicting nodes
    pub(crate) fn seal_roots(&mut self) {
        self.roots = self
            .nodes
            .iter()
            .filter(|n| n.parents.is_empty() && !n.is_conflicting())
            .map(|n| n.idx)
            .collect();
    }

    /// Node by arena index
    ///
    /// # Panics
    /// Panics on an out-of-range index; indices are only produced by this
    /// graph.
    #[inline]
    #[must_use]
    pub fn node(&self, idx: NodeIdx) -> &TraceNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut TraceNode {
        &mut self.nodes[idx]
    }

    /// All nodes in arena order
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &TraceNode> {
        self.nodes.iter()
    }

    /// Nodes of one kind, in arena order
    pub fn nodes_by_kind(&self, kind: NodeKind) -> impl Iterator<Item = &TraceNode> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    /// Look up a node index by key
    #[inline]
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<NodeIdx> {
        self.index.get(key).copied()
    }

    /// Look up a node by identifier
    ///
    /// Whole-requirement identifiers resolve to requirement nodes;
    /// single-label assertion-scoped identifiers resolve to assertion
    /// nodes. Conflicting claimants are not indexed and do not resolve.
    #[must_use]
    pub fn find_by_id(&self, id: &ReqId) -> Option<&TraceNode> {
        self.find(&NodeKey::for_id(id)).map(|idx| &self.nodes[idx])
    }

    /// Traversal entry points: parentless, non-conflicting nodes
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    /// Nodes excluded from indexing because a prior claimant took their
    /// identifier; addressable only through this accessor
    #[inline]
    #[must_use]
    pub fn conflicts(&self) -> &[NodeIdx] {
        &self.conflicts
    }

    /// The graph-wide validation result
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub(crate) fn validation_mut(&mut self) -> &mut ValidationResult {
        &mut self.validation
    }

    /// Pre-order traversal from the root set
    ///
    /// Every call produces an independent, restartable iterator; each
    /// reachable node is yielded exactly once even when several paths
    /// lead to it.
    #[must_use]
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder::from_roots(self)
    }

    /// Pre-order traversal from one node
    #[must_use]
    pub fn pre_order_from(&self, start: NodeIdx) -> PreOrder<'_> {
        PreOrder::from_node(self, start)
    }

    /// Post-order traversal from the root set (children before parents)
    #[must_use]
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::from_roots(self)
    }

    /// Post-order traversal from one node
    #[must_use]
    pub fn post_order_from(&self, start: NodeIdx) -> PostOrder<'_> {
        PostOrder::from_node(self, start)
    }

    /// Level-order (breadth-first) traversal from the root set
    #[must_use]
    pub fn level_order(&self) -> LevelOrder<'_> {
        LevelOrder::from_roots(self)
    }

    /// Level-order traversal from one node
    #[must_use]
    pub fn level_order_from(&self, start: NodeIdx) -> LevelOrder<'_> {
        LevelOrder::from_node(self, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AssertionNode;
    use rtm_ident::ReqLevel;
    use rtm_record::Requirement;

    fn req_payload(seq: u32) -> NodePayload {
        NodePayload::Requirement(Requirement::new(
            ReqId::new(ReqLevel::Product, seq),
            format!("Req {seq}"),
            SourceLocation::new("a.rtm", 1),
        ))
    }

    #[test]
    fn insert_and_find() {
        let mut graph = TraceGraph::new();
        let id = ReqId::new(ReqLevel::Product, 1);
        let idx = graph.insert("REQ-p00001".to_string(), None, req_payload(1));
        graph
            .index_node(NodeKey::Requirement(id.clone()), idx)
            .unwrap();

        assert_eq!(graph.len(), 1);
        let found = graph.find_by_id(&id).unwrap();
        assert_eq!(found.idx, idx);
        assert_eq!(found.kind(), NodeKind::Requirement);
    }

    #[test]
    fn index_clash_reports_first_claimant() {
        let mut graph = TraceGraph::new();
        let id = ReqId::new(ReqLevel::Product, 1);
        let first = graph.insert("a".to_string(), None, req_payload(1));
        let second = graph.insert("b".to_string(), None, req_payload(1));

        graph
            .index_node(NodeKey::Requirement(id.clone()), first)
            .unwrap();
        let clash = graph.index_node(NodeKey::Requirement(id), second);
        assert_eq!(clash, Err(first));
    }

    #[test]
    fn link_is_idempotent() {
        let mut graph = TraceGraph::new();
        let a = graph.insert("a".to_string(), None, req_payload(1));
        let b = graph.insert("b".to_string(), None, req_payload(2));

        graph.link(a, b, 0);
        graph.link(a, b, 0);

        assert_eq!(graph.node(a).children().len(), 1);
        assert_eq!(graph.node(b).parents().len(), 1);

        // A different relation over the same pair is a distinct edge.
        graph.link(a, b, 1);
        assert_eq!(graph.node(a).children().len(), 2);
    }

    #[test]
    fn scoped_and_whole_keys_are_distinct() {
        let id = ReqId::new(ReqLevel::Product, 1);
        let scoped = id.clone().with_label('A');
        assert_ne!(NodeKey::for_id(&id), NodeKey::for_id(&scoped));
    }

    #[test]
    fn roots_are_parentless_nodes() {
        let mut graph = TraceGraph::new();
        let a = graph.insert("a".to_string(), None, req_payload(1));
        let b = graph.insert("b".to_string(), None, req_payload(2));
        let c = graph.insert("c".to_string(), None, req_payload(3));
        graph.link(a, b, 0);
        graph.seal_roots();

        assert_eq!(graph.roots(), &[a, c]);
    }

    #[test]
    fn nodes_by_kind_filters() {
        let mut graph = TraceGraph::new();
        graph.insert("r".to_string(), None, req_payload(1));
        let scoped = ReqId::new(ReqLevel::Product, 1).with_label('A');
        graph.insert(
            "a".to_string(),
            None,
            NodePayload::Assertion(AssertionNode {
                id: scoped,
                label: 'A',
                text: "x".to_string(),
                waived: false,
            }),
        );

        assert_eq!(graph.nodes_by_kind(NodeKind::Requirement).count(), 1);
        assert_eq!(graph.nodes_by_kind(NodeKind::Assertion).count(), 1);
        assert_eq!(graph.nodes_by_kind(NodeKind::Test).count(), 0);
    }
}
