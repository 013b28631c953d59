//! Structural validation checks
//!
//! Each check is independent and appends to the shared diagnostic list;
//! none of them aborts the build. Conflicting nodes are excluded
//! throughout; they are already diagnosed as duplicates.

use crate::graph::TraceGraph;
use crate::node::{NodeIdx, NodeKind, NodePayload};
use crate::schema::GraphSchema;
use rtm_record::{CheckKind, Diagnostic, Severity};
use std::collections::HashSet;

/// Run the full validation suite
pub(crate) fn run(
    graph: &TraceGraph,
    schema: &GraphSchema,
    strict_digest: bool,
    diags: &mut Vec<Diagnostic>,
) {
    check_cycles(graph, schema, diags);
    check_orphans(graph, schema, diags);
    check_levels(graph, schema, diags);
    check_coverage(graph, schema, diags);
    check_digests(graph, strict_digest, diags);
}

/// Three-color depth-first cycle detection over rollup-eligible edges
///
/// A back-edge to an in-progress node is a cycle; the diagnostic carries
/// the full cycle path. Detection continues after a finding, so several
/// independent cycles each get reported.
fn check_cycles(graph: &TraceGraph, schema: &GraphSchema, diags: &mut Vec<Diagnostic>) {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    let mut color = vec![Color::White; graph.len()];

    for start in 0..graph.len() {
        if color[start] != Color::White || graph.node(start).is_conflicting() {
            continue;
        }
        // (node, next child edge position)
        let mut stack: Vec<(NodeIdx, usize)> = vec![(start, 0)];
        color[start] = Color::Grey;

        while let Some(frame) = stack.last_mut() {
            let (node, pos) = (frame.0, frame.1);
            let children = graph.node(node).children();

            if pos < children.len() {
                frame.1 += 1;
                let edge = children[pos];
                if !schema.rolls_up(edge.relation) {
                    continue;
                }
                let child = edge.target;
                match color[child] {
                    Color::White => {
                        color[child] = Color::Grey;
                        stack.push((child, 0));
                    }
                    Color::Grey => {
                        if let Some(cycle_start) =
                            stack.iter().position(|&(n, _)| n == child)
                        {
                            let mut path: Vec<&str> = stack[cycle_start..]
                                .iter()
                                .map(|&(n, _)| graph.node(n).label.as_str())
                                .collect();
                            path.push(graph.node(child).label.as_str());
                            diags.push(Diagnostic::error(
                                CheckKind::Cycle,
                                format!(
                                    "cycle through rollup relationships: {}",
                                    path.join(" -> ")
                                ),
                            ));
                        }
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }
}

/// Orphan detection
///
/// A node is an orphan when its kind can gain a mandatory parent through
/// some orphan-satisfying relation, it has no parent through any of
/// them, and it is not a declared root (a top-level requirement).
fn check_orphans(graph: &TraceGraph, schema: &GraphSchema, diags: &mut Vec<Diagnostic>) {
    let orphan_relations: Vec<usize> = schema
        .relations
        .iter()
        .enumerate()
        .filter(|(_, r)| r.satisfies_orphan)
        .map(|(i, _)| i)
        .collect();
    let checked_kinds: HashSet<NodeKind> = orphan_relations
        .iter()
        .flat_map(|&i| schema.relation(i).child_kinds().iter().copied())
        .collect();

    for node in graph.nodes() {
        if node.is_conflicting() || !checked_kinds.contains(&node.kind()) {
            continue;
        }
        if node
            .as_requirement()
            .is_some_and(|r| r.id.level().is_top())
        {
            continue; // declared root
        }
        let has_mandatory_parent = node
            .parents()
            .iter()
            .any(|e| orphan_relations.contains(&e.relation));
        if has_mandatory_parent {
            continue;
        }

        let expected: Vec<&str> = orphan_relations
            .iter()
            .map(|&i| schema.relation(i))
            .filter(|r| r.child_kinds().contains(&node.kind()))
            .map(|r| r.name.as_str())
            .collect();
        let mut diag = Diagnostic::warning(
            CheckKind::Orphan,
            format!(
                "'{}' is not reachable through a mandatory relationship (expected one of: {})",
                node.label,
                expected.join(", ")
            ),
        );
        if let Some(req) = node.as_requirement() {
            diag = diag.with_id(req.id.clone());
        }
        if let Some(location) = &node.location {
            diag = diag.with_location(location.clone());
        }
        diags.push(diag);
    }
}

/// Level-constraint evaluation per level-checked edge
fn check_levels(graph: &TraceGraph, schema: &GraphSchema, diags: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        let Some(child) = node.as_requirement() else {
            continue;
        };
        if child.conflicting {
            continue;
        }
        for edge in node.parents() {
            let rel = schema.relation(edge.relation);
            if !rel.level_checked {
                continue;
            }
            let parent = graph.node(edge.target);
            let parent_level = match &parent.payload {
                NodePayload::Requirement(r) => r.id.level(),
                NodePayload::Assertion(a) => a.id.level(),
                _ => continue,
            };
            if !schema.level_allowed(child.id.level(), parent_level) {
                diags.push(
                    Diagnostic::warning(
                        CheckKind::LevelConstraint,
                        format!(
                            "'{}' ({}) may not {} '{}' ({})",
                            node.label,
                            child.id.level(),
                            rel.name,
                            parent.label,
                            parent_level
                        ),
                    )
                    .with_id(child.id.clone())
                    .with_location(child.location.clone()),
                );
            }
        }
    }
}

/// Assertion coverage gaps
///
/// An assertion is covered when any rollup-eligible edge lands on it
/// (a validating code/test reference or an implementing requirement).
/// The explicit waived marker suppresses the gap.
fn check_coverage(graph: &TraceGraph, schema: &GraphSchema, diags: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        let Some(assertion) = node.as_assertion() else {
            continue;
        };
        if assertion.waived {
            continue;
        }
        if is_covered_assertion(graph, schema, node.idx) {
            continue;
        }
        let mut diag = Diagnostic::warning(
            CheckKind::CoverageGap,
            format!("assertion '{}' has no validating reference", node.label),
        )
        .with_id(assertion.id.clone());
        if let Some(location) = &node.location {
            diag = diag.with_location(location.clone());
        }
        diags.push(diag);
    }
}

/// Shared with the rollup engine's covered-assertion count
pub(crate) fn is_covered_assertion(
    graph: &TraceGraph,
    schema: &GraphSchema,
    idx: NodeIdx,
) -> bool {
    graph
        .node(idx)
        .children()
        .iter()
        .any(|e| schema.rolls_up(e.relation))
}

/// Digest comparison: recomputing the content digest must reproduce the
/// stored one
///
/// Informational by default; error severity under the strict policy.
fn check_digests(graph: &TraceGraph, strict: bool, diags: &mut Vec<Diagnostic>) {
    let severity = if strict { Severity::Error } else { Severity::Info };
    for node in graph.nodes() {
        let Some(req) = node.as_requirement() else {
            continue;
        };
        if req.conflicting || !req.digest_mismatch() {
            continue;
        }
        let declared = req
            .declared_digest
            .map(|d| d.to_string())
            .unwrap_or_default();
        diags.push(
            Diagnostic::new(
                severity,
                CheckKind::DigestMismatch,
                format!(
                    "stored digest {declared} disagrees with computed {}; content was edited without regenerating it",
                    req.computed_digest
                ),
            )
            .with_id(req.id.clone())
            .with_location(req.location.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildInput, BuildOptions, GraphBuilder};
    use rtm_ident::{ReqId, ReqLevel};
    use rtm_record::{
        Assertion, ContentDigest, RecordSet, Reference, Requirement, SourceLocation, TestRef,
    };

    fn req(seq: u32, level: ReqLevel) -> Requirement {
        Requirement::new(
            ReqId::new(level, seq),
            format!("Req {seq}"),
            SourceLocation::new("specs/doc.rtm", seq * 10),
        )
    }

    fn implements(req: Requirement, target: ReqId) -> Requirement {
        let line = req.location.line + 1;
        req.with_reference(Reference::new("implements", target, line))
    }

    fn build(requirements: Vec<Requirement>) -> TraceGraph {
        build_with(requirements, RecordSet::new(), BuildOptions::default())
    }

    fn build_with(
        requirements: Vec<Requirement>,
        records: RecordSet,
        options: BuildOptions,
    ) -> TraceGraph {
        GraphBuilder::new(GraphSchema::standard())
            .build(BuildInput {
                requirements,
                records,
                options,
                ..BuildInput::default()
            })
            .expect("standard schema is valid")
    }

    #[test]
    fn implements_cycle_reported_with_path() {
        let a = implements(req(1, ReqLevel::Development), ReqId::new(ReqLevel::Development, 2));
        let b = implements(req(2, ReqLevel::Development), ReqId::new(ReqLevel::Development, 3));
        let c = implements(req(3, ReqLevel::Development), ReqId::new(ReqLevel::Development, 1));

        let graph = build(vec![a, b, c]);
        let cycles: Vec<_> = graph.validation().from_check(CheckKind::Cycle).collect();
        assert_eq!(cycles.len(), 1);

        let message = &cycles[0].message;
        assert!(message.contains("REQ-d00001"));
        assert!(message.contains("REQ-d00002"));
        assert!(message.contains("REQ-d00003"));
        assert!(message.contains(" -> "));
    }

    #[test]
    fn acyclic_input_reports_no_cycles() {
        let parent = req(1, ReqLevel::Product);
        let child = implements(req(2, ReqLevel::Development), ReqId::new(ReqLevel::Product, 1));
        let graph = build(vec![parent, child]);
        assert_eq!(graph.validation().from_check(CheckKind::Cycle).count(), 0);
        assert_eq!(
            graph.validation().from_check(CheckKind::DuplicateId).count(),
            0
        );
    }

    #[test]
    fn non_rollup_relations_do_not_cycle() {
        // refines does not roll up, so a refines loop is not a cycle
        // finding (it never feeds rollup).
        let a = req(1, ReqLevel::Development)
            .with_reference(Reference::new("refines", ReqId::new(ReqLevel::Development, 2), 11));
        let b = req(2, ReqLevel::Development)
            .with_reference(Reference::new("refines", ReqId::new(ReqLevel::Development, 1), 21));
        let graph = build(vec![a, b]);
        assert_eq!(graph.validation().from_check(CheckKind::Cycle).count(), 0);
    }

    #[test]
    fn orphan_reported_exactly_once() {
        let orphan = req(7, ReqLevel::Development);
        let graph = build(vec![orphan]);

        let orphans: Vec<_> = graph.validation().from_check(CheckKind::Orphan).collect();
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].message.contains("REQ-d00007"));
        assert!(orphans[0].message.contains("implements"));
    }

    #[test]
    fn top_level_requirement_is_a_declared_root_not_an_orphan() {
        let graph = build(vec![req(1, ReqLevel::Product)]);
        assert_eq!(graph.validation().from_check(CheckKind::Orphan).count(), 0);
    }

    #[test]
    fn unreferencing_test_is_an_orphan() {
        let mut records = RecordSet::new();
        records
            .test_refs
            .push(TestRef::new("tests/a.rs", 1, "floating", None, vec![]));
        let graph = build_with(vec![], records, BuildOptions::default());
        assert_eq!(graph.validation().from_check(CheckKind::Orphan).count(), 1);
    }

    #[test]
    fn same_level_implements_violates_levels() {
        let parent = req(1, ReqLevel::Development);
        let child = implements(req(2, ReqLevel::Development), ReqId::new(ReqLevel::Development, 1));
        let graph = build(vec![parent, child]);

        let violations: Vec<_> = graph
            .validation()
            .from_check(CheckKind::LevelConstraint)
            .collect();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("development"));
    }

    #[test]
    fn upward_implements_respects_levels() {
        let product = req(1, ReqLevel::Product);
        let operational = implements(req(2, ReqLevel::Operational), ReqId::new(ReqLevel::Product, 1));
        let development =
            implements(req(3, ReqLevel::Development), ReqId::new(ReqLevel::Operational, 2));
        let graph = build(vec![product, operational, development]);
        assert_eq!(
            graph
                .validation()
                .from_check(CheckKind::LevelConstraint)
                .count(),
            0
        );
    }

    #[test]
    fn uncovered_assertion_reported_waived_suppressed() {
        let requirement = req(1, ReqLevel::Product)
            .with_assertion(Assertion::new('A', "uncovered", 11))
            .with_assertion(Assertion::new('B', "waived", 12).waived());
        let graph = build(vec![requirement]);

        let gaps: Vec<_> = graph
            .validation()
            .from_check(CheckKind::CoverageGap)
            .collect();
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].message.contains("REQ-p00001-A"));
    }

    #[test]
    fn implemented_assertion_is_covered() {
        let parent = req(1, ReqLevel::Product).with_assertion(Assertion::new('A', "a", 11));
        let child = implements(
            req(2, ReqLevel::Development),
            ReqId::new(ReqLevel::Product, 1).with_label('A'),
        );
        let graph = build(vec![parent, child]);
        assert_eq!(graph.validation().from_check(CheckKind::CoverageGap).count(), 0);
    }

    #[test]
    fn digest_mismatch_info_by_default_error_when_strict() {
        let mut requirement = req(1, ReqLevel::Product);
        requirement.declared_digest = Some(ContentDigest::compute(b"stale"));

        let graph = build(vec![requirement.clone()]);
        let mismatches: Vec<_> = graph
            .validation()
            .from_check(CheckKind::DigestMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].severity, Severity::Info);

        let strict = build_with(
            vec![requirement],
            RecordSet::new(),
            BuildOptions { strict_digest: true },
        );
        assert!(strict
            .validation()
            .from_check(CheckKind::DigestMismatch)
            .all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn matching_digest_is_silent() {
        let mut requirement = req(1, ReqLevel::Product);
        requirement.declared_digest = Some(requirement.computed_digest);
        let graph = build(vec![requirement]);
        assert_eq!(
            graph
                .validation()
                .from_check(CheckKind::DigestMismatch)
                .count(),
            0
        );
    }
}
