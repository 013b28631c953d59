//! Traversal orders
//!
//! Three lazy, finite, restartable walks over the graph. Every call to a
//! `TraceGraph` traversal method builds an independent iterator, with no
//! shared cursor state. Each reachable node is yielded exactly once, so
//! DAG shapes with shared descendants do not repeat nodes.
//!
//! Level-order uses a `VecDeque` FIFO with O(1) dequeue; removing from
//! the front of a plain `Vec` degrades to O(n²) on deep hierarchies.

use crate::graph::TraceGraph;
use crate::node::NodeIdx;
use std::collections::{HashSet, VecDeque};

/// Depth-first, parents before children
pub struct PreOrder<'a> {
    graph: &'a TraceGraph,
    stack: Vec<NodeIdx>,
    visited: HashSet<NodeIdx>,
}

impl<'a> PreOrder<'a> {
    pub(crate) fn from_roots(graph: &'a TraceGraph) -> Self {
        let mut stack: Vec<NodeIdx> = graph.roots().to_vec();
        stack.reverse();
        Self {
            graph,
            stack,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn from_node(graph: &'a TraceGraph, start: NodeIdx) -> Self {
        Self {
            graph,
            stack: vec![start],
            visited: HashSet::new(),
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.stack.pop() {
            if !self.visited.insert(idx) {
                continue;
            }
            let children = self.graph.node(idx).children();
            for edge in children.iter().rev() {
                if !self.visited.contains(&edge.target) {
                    self.stack.push(edge.target);
                }
            }
            return Some(idx);
        }
        None
    }
}

/// Depth-first, children before parents
///
/// The order the rollup engine needs: a node is yielded only after every
/// reachable descendant has been.
pub struct PostOrder<'a> {
    graph: &'a TraceGraph,
    /// (node, children already expanded)
    stack: Vec<(NodeIdx, bool)>,
    visited: HashSet<NodeIdx>,
}

impl<'a> PostOrder<'a> {
    pub(crate) fn from_roots(graph: &'a TraceGraph) -> Self {
        let mut stack: Vec<(NodeIdx, bool)> =
            graph.roots().iter().map(|&idx| (idx, false)).collect();
        stack.reverse();
        Self {
            graph,
            stack,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn from_node(graph: &'a TraceGraph, start: NodeIdx) -> Self {
        Self {
            graph,
            stack: vec![(start, false)],
            visited: HashSet::new(),
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, expanded)) = self.stack.pop() {
            if expanded {
                return Some(idx);
            }
            if !self.visited.insert(idx) {
                continue;
            }
            self.stack.push((idx, true));
            let children = self.graph.node(idx).children();
            for edge in children.iter().rev() {
                if !self.visited.contains(&edge.target) {
                    self.stack.push((edge.target, false));
                }
            }
        }
        None
    }
}

/// Breadth-first, shallower nodes before deeper ones
pub struct LevelOrder<'a> {
    graph: &'a TraceGraph,
    queue: VecDeque<NodeIdx>,
    visited: HashSet<NodeIdx>,
}

impl<'a> LevelOrder<'a> {
    pub(crate) fn from_roots(graph: &'a TraceGraph) -> Self {
        Self {
            graph,
            queue: graph.roots().iter().copied().collect(),
            visited: HashSet::new(),
        }
    }

    pub(crate) fn from_node(graph: &'a TraceGraph, start: NodeIdx) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(start);
        Self {
            graph,
            queue,
            visited: HashSet::new(),
        }
    }
}

impl Iterator for LevelOrder<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.queue.pop_front() {
            if !self.visited.insert(idx) {
                continue;
            }
            for edge in self.graph.node(idx).children() {
                if !self.visited.contains(&edge.target) {
                    self.queue.push_back(edge.target);
                }
            }
            return Some(idx);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodePayload;
    use rtm_ident::{ReqId, ReqLevel};
    use rtm_record::{Requirement, SourceLocation};

    /// a -> (b -> d, c -> d): a diamond sharing d
    fn diamond() -> (TraceGraph, [NodeIdx; 4]) {
        let mut graph = TraceGraph::new();
        let mut add = |seq: u32, name: &str| {
            graph.insert(
                name.to_string(),
                None,
                NodePayload::Requirement(Requirement::new(
                    ReqId::new(ReqLevel::Product, seq),
                    name,
                    SourceLocation::new("a.rtm", 1),
                )),
            )
        };
        let a = add(1, "a");
        let b = add(2, "b");
        let c = add(3, "c");
        let d = add(4, "d");
        graph.link(a, b, 0);
        graph.link(a, c, 0);
        graph.link(b, d, 0);
        graph.link(c, d, 0);
        graph.seal_roots();
        (graph, [a, b, c, d])
    }

    #[test]
    fn pre_order_visits_each_node_once() {
        let (graph, [a, b, c, d]) = diamond();
        let order: Vec<NodeIdx> = graph.pre_order().collect();
        assert_eq!(order, vec![a, b, d, c]);
    }

    #[test]
    fn post_order_finishes_children_first() {
        let (graph, [a, b, c, d]) = diamond();
        let order: Vec<NodeIdx> = graph.post_order().collect();
        assert_eq!(order, vec![d, b, c, a]);

        let pos = |idx: NodeIdx| order.iter().position(|&n| n == idx).unwrap();
        assert!(pos(d) < pos(b));
        assert!(pos(b) < pos(a));
        assert!(pos(c) < pos(a));
    }

    #[test]
    fn level_order_is_breadth_first() {
        let (graph, [a, b, c, d]) = diamond();
        let order: Vec<NodeIdx> = graph.level_order().collect();
        assert_eq!(order, vec![a, b, c, d]);
    }

    #[test]
    fn traversals_are_restartable() {
        let (graph, _) = diamond();
        let first: Vec<NodeIdx> = graph.level_order().collect();
        let second: Vec<NodeIdx> = graph.level_order().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn traversal_from_interior_node() {
        let (graph, [_, b, _, d]) = diamond();
        let order: Vec<NodeIdx> = graph.pre_order_from(b).collect();
        assert_eq!(order, vec![b, d]);
    }

    #[test]
    fn empty_graph_traversals_are_empty() {
        let graph = TraceGraph::new();
        assert_eq!(graph.pre_order().count(), 0);
        assert_eq!(graph.post_order().count(), 0);
        assert_eq!(graph.level_order().count(), 0);
    }
}
