//! The graph builder
//!
//! A generic interpreter over the [`GraphSchema`]: node creation, field
//! resolution and edge linking are driven entirely by the relation table.
//! Imperfect input never aborts a build: every problem becomes a
//! diagnostic and the caller always receives a graph.

use crate::checks;
use crate::graph::{NodeKey, TraceGraph};
use crate::node::{AssertionNode, NodeIdx, NodePayload};
use crate::schema::{EdgeDirection, GraphSchema, RelationSpec, SchemaError, TargetField};
use rtm_ident::ReqId;
use rtm_record::{
    CheckKind, Diagnostic, RecordSet, Requirement, SourceLocation,
};
use std::collections::HashMap;
use tracing::{debug, debug_span};

/// Caller-supplied build policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Escalate digest mismatches from Info to Error severity
    pub strict_digest: bool,
}

/// Everything a build consumes
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    /// Merged requirement set, in document order
    pub requirements: Vec<Requirement>,
    /// External verification records
    pub records: RecordSet,
    /// Diagnostics carried in from earlier phases (document parsing);
    /// they precede the builder's own findings in the validation result
    pub diagnostics: Vec<Diagnostic>,
    /// Build policy
    pub options: BuildOptions,
}

/// Builds a [`TraceGraph`] from requirements and external records
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    schema: GraphSchema,
}

impl GraphBuilder {
    /// Create a builder over the given schema
    #[inline]
    #[must_use]
    pub fn new(schema: GraphSchema) -> Self {
        Self { schema }
    }

    /// The schema this builder interprets
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// Build the graph and run the validation suite
    ///
    /// # Errors
    /// Fails only on a malformed schema (programming-contract violation).
    /// Imperfect input data is returned as diagnostics on the graph.
    pub fn build(&self, input: BuildInput) -> Result<TraceGraph, SchemaError> {
        self.schema.validate()?;
        let span = debug_span!("build_graph");
        let _guard = span.enter();

        let mut graph = TraceGraph::new();
        let mut diags = input.diagnostics;

        self.add_requirements(&mut graph, input.requirements, &mut diags);
        let results_by_test = add_records(&mut graph, input.records);
        self.resolve_relations(&mut graph, &results_by_test, &mut diags);
        graph.seal_roots();

        checks::run(&graph, &self.schema, input.options.strict_digest, &mut diags);

        debug!(
            nodes = graph.len(),
            roots = graph.roots().len(),
            conflicts = graph.conflicts().len(),
            diagnostics = diags.len(),
            "graph built"
        );
        graph.validation_mut().extend(diags);
        Ok(graph)
    }

    /// Step 1: one node per requirement, one child node per assertion
    ///
    /// Later claimants of a taken identifier are marked conflicting,
    /// kept for diagnostics, and excluded from the index (and therefore
    /// from resolution, traversal and rollup).
    fn add_requirements(
        &self,
        graph: &mut TraceGraph,
        requirements: Vec<Requirement>,
        diags: &mut Vec<Diagnostic>,
    ) {
        for mut req in requirements {
            let key = NodeKey::Requirement(req.id.clone());
            if let Some(existing) = graph.find(&key) {
                let first_seen = graph.node(existing).location.clone();
                let id = req.id.clone();
                let location = req.location.clone();
                req.conflicting = true;
                let idx = graph.insert(
                    id.to_string(),
                    Some(location.clone()),
                    NodePayload::Requirement(req),
                );
                graph.push_conflict(idx);

                let mut message = format!("identifier '{id}' is already claimed");
                if let Some(first) = first_seen {
                    message.push_str(&format!(" (first seen at {first})"));
                }
                diags.push(
                    Diagnostic::error(CheckKind::DuplicateId, message)
                        .with_id(id)
                        .with_location(location),
                );
                continue;
            }

            let id = req.id.clone();
            let path = req.location.path.clone();
            let location = req.location.clone();
            let assertions = req.assertions.clone();
            let idx = graph.insert(
                id.to_string(),
                Some(location),
                NodePayload::Requirement(req),
            );
            let _ = graph.index_node(key, idx);

            for assertion in assertions {
                let scoped = id.clone().with_label(assertion.label);
                let node = AssertionNode {
                    id: scoped.clone(),
                    label: assertion.label,
                    text: assertion.text,
                    waived: assertion.waived,
                };
                let assertion_idx = graph.insert(
                    scoped.to_string(),
                    Some(SourceLocation::new(path.clone(), assertion.line)),
                    NodePayload::Assertion(node),
                );
                let _ = graph.index_node(NodeKey::Assertion(scoped), assertion_idx);
            }
        }
    }

    /// Step 3: interpret every schema relation into edges
    ///
    /// Resolution reads the finished node set, so it is collected first
    /// and linked after; unresolved targets become broken-link
    /// diagnostics, never silent drops.
    fn resolve_relations(
        &self,
        graph: &mut TraceGraph,
        results_by_test: &HashMap<String, Vec<NodeIdx>>,
        diags: &mut Vec<Diagnostic>,
    ) {
        let mut edges: Vec<(NodeIdx, NodeIdx, usize)> = Vec::new();

        for (rel_idx, rel) in self.schema.relations.iter().enumerate() {
            for idx in 0..graph.len() {
                let node = graph.node(idx);
                if !rel.source_kinds.contains(&node.kind()) || node.is_conflicting() {
                    continue;
                }

                match &rel.field {
                    TargetField::Reference(verb) => {
                        let Some(req) = node.as_requirement() else {
                            continue;
                        };
                        for reference in req.references_for(verb) {
                            let location =
                                SourceLocation::new(req.location.path.clone(), reference.line);
                            resolve_id_target(
                                graph,
                                rel,
                                rel_idx,
                                idx,
                                &reference.target,
                                Some(location),
                                &mut edges,
                                diags,
                            );
                        }
                    }
                    TargetField::RecordTargets => {
                        let (targets, location) = match &node.payload {
                            NodePayload::Code(code) => (
                                code.targets.clone(),
                                Some(SourceLocation::new(code.file.clone(), code.line)),
                            ),
                            NodePayload::Test(test) => (
                                test.targets.clone(),
                                Some(SourceLocation::new(test.file.clone(), test.line)),
                            ),
                            NodePayload::Journey(journey) => (journey.targets.clone(), None),
                            _ => continue,
                        };
                        for target in &targets {
                            resolve_id_target(
                                graph,
                                rel,
                                rel_idx,
                                idx,
                                target,
                                location.clone(),
                                &mut edges,
                                diags,
                            );
                        }
                    }
                    TargetField::OwnAssertions => {
                        let Some(req) = node.as_requirement() else {
                            continue;
                        };
                        for assertion in &req.assertions {
                            let scoped = req.id.clone().with_label(assertion.label);
                            let location =
                                SourceLocation::new(req.location.path.clone(), assertion.line);
                            resolve_id_target(
                                graph,
                                rel,
                                rel_idx,
                                idx,
                                &scoped,
                                Some(location),
                                &mut edges,
                                diags,
                            );
                        }
                    }
                    TargetField::ResultsOfTest => {
                        let NodePayload::Test(test) = &node.payload else {
                            continue;
                        };
                        if let Some(result_idxs) = results_by_test.get(&test.id) {
                            for &result_idx in result_idxs {
                                // Down: the test owns its results.
                                edges.push((idx, result_idx, rel_idx));
                            }
                        }
                    }
                }
            }
        }

        for (parent, child, relation) in edges {
            graph.link(parent, child, relation);
        }
    }
}

/// Step 2: one node per external record
///
/// Test results are keyed to their owning test for the `produced-by`
/// resolver; everything else stands alone until relations are resolved.
fn add_records(graph: &mut TraceGraph, records: RecordSet) -> HashMap<String, Vec<NodeIdx>> {
    for code in records.code_refs {
        let key = NodeKey::Code(code.key());
        let label = code.symbol.clone().unwrap_or_else(|| code.key());
        let location = SourceLocation::new(code.file.clone(), code.line);
        let idx = graph.insert(label, Some(location), NodePayload::Code(code));
        let _ = graph.index_node(key, idx);
    }

    for test in records.test_refs {
        let key = NodeKey::Test(test.id.clone());
        let label = test.id.clone();
        let location = SourceLocation::new(test.file.clone(), test.line);
        let idx = graph.insert(label, Some(location), NodePayload::Test(test));
        let _ = graph.index_node(key, idx);
    }

    let mut results_by_test: HashMap<String, Vec<NodeIdx>> = HashMap::new();
    let mut ordinals: HashMap<String, usize> = HashMap::new();
    for result in records.test_results {
        let ordinal = {
            let counter = ordinals.entry(result.test_id.clone()).or_insert(0);
            let current = *counter;
            *counter += 1;
            current
        };
        let key = NodeKey::Result(format!("{}#{ordinal}", result.test_id));
        let label = format!("{} [{}]", result.test_id, result.status);
        let test_id = result.test_id.clone();
        let idx = graph.insert(label, None, NodePayload::TestResult(result));
        let _ = graph.index_node(key, idx);
        results_by_test.entry(test_id).or_default().push(idx);
    }

    for journey in records.journeys {
        let key = NodeKey::Journey(journey.name.clone());
        let label = journey.name.clone();
        let idx = graph.insert(label, None, NodePayload::Journey(journey));
        let _ = graph.index_node(key, idx);
    }

    results_by_test
}

/// Resolve one identifier-shaped target through the index
///
/// Assertion-scoped identifiers resolve each label to its assertion
/// node; whole-requirement identifiers resolve to the requirement node.
#[allow(clippy::too_many_arguments)]
fn resolve_id_target(
    graph: &TraceGraph,
    rel: &RelationSpec,
    rel_idx: usize,
    source_idx: NodeIdx,
    target: &ReqId,
    location: Option<SourceLocation>,
    edges: &mut Vec<(NodeIdx, NodeIdx, usize)>,
    diags: &mut Vec<Diagnostic>,
) {
    if target.is_assertion_scoped() {
        let base = target.requirement_id();
        for &label in target.labels() {
            let scoped = base.clone().with_label(label);
            match graph.find(&NodeKey::Assertion(scoped.clone())) {
                Some(target_idx) => accept_target(
                    graph, rel, rel_idx, source_idx, target_idx, &scoped, &location, edges, diags,
                ),
                None => {
                    let message = if graph.find(&NodeKey::Requirement(base.clone())).is_some() {
                        format!(
                            "{} reference to '{scoped}': assertion '{label}' does not exist on '{base}'",
                            rel.name
                        )
                    } else {
                        format!("{} reference to '{scoped}' does not resolve", rel.name)
                    };
                    diags.push(attach(
                        Diagnostic::error(CheckKind::BrokenLink, message).with_id(scoped),
                        &location,
                    ));
                }
            }
        }
    } else {
        match graph.find(&NodeKey::Requirement(target.clone())) {
            Some(target_idx) => accept_target(
                graph, rel, rel_idx, source_idx, target_idx, target, &location, edges, diags,
            ),
            None => {
                let message = format!("{} reference to '{target}' does not resolve", rel.name);
                diags.push(attach(
                    Diagnostic::error(CheckKind::BrokenLink, message).with_id(target.clone()),
                    &location,
                ));
            }
        }
    }
}

/// Kind-check a resolved target and queue the edge in the declared
/// direction
#[allow(clippy::too_many_arguments)]
fn accept_target(
    graph: &TraceGraph,
    rel: &RelationSpec,
    rel_idx: usize,
    source_idx: NodeIdx,
    target_idx: NodeIdx,
    target_id: &ReqId,
    location: &Option<SourceLocation>,
    edges: &mut Vec<(NodeIdx, NodeIdx, usize)>,
    diags: &mut Vec<Diagnostic>,
) {
    let kind = graph.node(target_idx).kind();
    if !rel.target_kinds.contains(&kind) {
        let message = format!(
            "{} reference to '{target_id}' resolves to a {kind} node, which the schema does not permit",
            rel.name
        );
        diags.push(attach(
            Diagnostic::error(CheckKind::BrokenLink, message).with_id(target_id.clone()),
            location,
        ));
        return;
    }
    match rel.direction {
        EdgeDirection::Up => edges.push((target_idx, source_idx, rel_idx)),
        EdgeDirection::Down => edges.push((source_idx, target_idx, rel_idx)),
    }
}

/// Attach an optional location to a diagnostic
fn attach(diagnostic: Diagnostic, location: &Option<SourceLocation>) -> Diagnostic {
    match location {
        Some(location) => diagnostic.with_location(location.clone()),
        None => diagnostic,
    }
}
