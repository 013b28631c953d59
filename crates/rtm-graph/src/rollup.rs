//! Metrics rollup
//!
//! A single post-build pass that attaches [`NodeMetrics`] to every
//! non-conflicting node.
//!
//! Because the graph is a DAG, a descendant can be reachable from an
//! ancestor through more than one path; summing child metrics upward
//! would count it once per path. The engine instead computes, per node,
//! the *set of distinct descendants* reachable through rollup-eligible
//! edges (memoized leaves-to-roots, each node's set built by unioning
//! its children's already-finished sets plus the children themselves)
//! and derives every count from that deduplicated set.

use crate::checks::is_covered_assertion;
use crate::graph::TraceGraph;
use crate::node::{NodeIdx, NodeMetrics, NodePayload};
use crate::schema::GraphSchema;
use rtm_record::TestStatus;
use std::collections::HashSet;
use tracing::debug;

/// Node state during the memoizing post-order walk
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Compute and attach metrics to every non-conflicting node
///
/// Runs once, after validation. A node's own metrics are fully computed
/// before any ancestor consumes them; conflicting nodes keep `None`.
pub fn compute_metrics(graph: &mut TraceGraph, schema: &GraphSchema) {
    let n = graph.len();

    // Rollup-eligible child lists, with conflicting nodes cut out.
    let rollup_children: Vec<Vec<NodeIdx>> = (0..n)
        .map(|idx| {
            if graph.node(idx).is_conflicting() {
                return Vec::new();
            }
            graph
                .node(idx)
                .children()
                .iter()
                .filter(|e| schema.rolls_up(e.relation))
                .filter(|e| !graph.node(e.target).is_conflicting())
                .map(|e| e.target)
                .collect()
        })
        .collect();

    let covered: Vec<bool> = (0..n)
        .map(|idx| is_covered_assertion(graph, schema, idx))
        .collect();

    // Memoized distinct-descendant sets, post-order (children first).
    let mut descendants: Vec<Option<HashSet<NodeIdx>>> = vec![None; n];
    let mut mark = vec![Mark::Unvisited; n];

    for start in 0..n {
        if mark[start] != Mark::Unvisited {
            continue;
        }
        let mut stack: Vec<(NodeIdx, usize)> = vec![(start, 0)];
        mark[start] = Mark::InProgress;

        while let Some(frame) = stack.last_mut() {
            let (node, pos) = (frame.0, frame.1);
            let kids = &rollup_children[node];

            if pos < kids.len() {
                frame.1 += 1;
                let child = kids[pos];
                if mark[child] == Mark::Unvisited {
                    mark[child] = Mark::InProgress;
                    stack.push((child, 0));
                }
                // An in-progress child is a back-edge; the cycle check
                // already reported it, rollup stays best-effort.
            } else {
                let mut set = HashSet::new();
                for &child in kids {
                    if mark[child] == Mark::Done {
                        set.insert(child);
                        if let Some(child_set) = &descendants[child] {
                            set.extend(child_set.iter().copied());
                        }
                    }
                }
                descendants[node] = Some(set);
                mark[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    for idx in 0..n {
        if graph.node(idx).is_conflicting() {
            continue;
        }
        let Some(set) = &descendants[idx] else {
            continue;
        };
        let metrics = derive_metrics(graph, &covered, idx, set);
        graph.node_mut(idx).metrics = Some(metrics);
    }

    debug!(nodes = n, "metrics rollup complete");
}

/// Derive all counts from `{node} ∪ descendants`
fn derive_metrics(
    graph: &TraceGraph,
    covered: &[bool],
    idx: NodeIdx,
    descendants: &HashSet<NodeIdx>,
) -> NodeMetrics {
    let mut metrics = NodeMetrics::default();

    for &member in descendants.iter().chain(std::iter::once(&idx)) {
        match &graph.node(member).payload {
            NodePayload::Assertion(_) => {
                metrics.assertions_total += 1;
                if covered[member] {
                    metrics.assertions_covered += 1;
                }
            }
            NodePayload::Test(_) => metrics.tests_total += 1,
            NodePayload::TestResult(result) => match result.status {
                TestStatus::Passed => metrics.results_passed += 1,
                TestStatus::Failed => metrics.results_failed += 1,
                TestStatus::Skipped => metrics.results_skipped += 1,
                TestStatus::Unknown => metrics.results_unknown += 1,
            },
            NodePayload::Code(_) => metrics.code_refs += 1,
            NodePayload::Requirement(_) | NodePayload::Journey(_) => {}
        }
    }

    metrics.coverage_pct = percentage(metrics.assertions_covered, metrics.assertions_total);
    metrics.pass_rate_pct = percentage(metrics.results_passed, metrics.results_total());
    metrics
}

/// `part / total` as a percentage, defined as 0 when `total` is zero
#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
