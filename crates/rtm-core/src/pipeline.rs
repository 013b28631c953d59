//! The parse -> merge -> build -> rollup pipeline
//!
//! Documents have no cross-document dependency, so parsing fans out to
//! worker threads; merging needs the global identifier view and stays
//! sequential. Merged results keep document order, so identical inputs
//! produce identical graphs.

use rayon::prelude::*;
use rtm_graph::{
    compute_metrics, BuildInput, BuildOptions, GraphBuilder, GraphSchema, SchemaError, TraceGraph,
};
use rtm_parser::{DocumentParser, ParsedDocument};
use rtm_record::RecordSet;
use serde::{Deserialize, Serialize};
use tracing::{debug_span, info};

/// One fully-read document handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document path, recorded on every extracted element
    pub path: String,
    /// Full document text
    pub text: String,
}

impl SourceDocument {
    /// Create a document
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Pipeline policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Parse documents on parallel workers (merging stays sequential)
    pub parallel: bool,
    /// Escalate digest mismatches to error severity
    pub strict_digest: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            strict_digest: false,
        }
    }
}

/// Run a full build: parse every document, merge, build the graph, roll
/// up metrics
///
/// The returned graph is final and immutable; a rebuild starts from
/// scratch with a fresh call.
///
/// # Errors
/// Fails only on a malformed schema. Every data problem is a diagnostic
/// on the returned graph.
pub fn build_trace(
    documents: &[SourceDocument],
    records: RecordSet,
    schema: &GraphSchema,
    options: PipelineOptions,
) -> Result<TraceGraph, SchemaError> {
    let parsed = parse_documents(documents, options.parallel);

    let mut requirements = Vec::new();
    let mut diagnostics = Vec::new();
    for document in parsed {
        requirements.extend(document.requirements);
        diagnostics.extend(document.diagnostics);
    }

    let record_count = records.len();
    let builder = GraphBuilder::new(schema.clone());
    let mut graph = builder.build(BuildInput {
        requirements,
        records,
        diagnostics,
        options: BuildOptions {
            strict_digest: options.strict_digest,
        },
    })?;

    {
        let span = debug_span!("rollup");
        let _guard = span.enter();
        compute_metrics(&mut graph, schema);
    }

    info!(
        documents = documents.len(),
        records = record_count,
        nodes = graph.len(),
        diagnostics = graph.validation().len(),
        "trace build complete"
    );
    Ok(graph)
}

/// Parse all documents, in document order
///
/// Each document parses independently; the parallel path still collects
/// results positionally, so output order never depends on scheduling.
fn parse_documents(documents: &[SourceDocument], parallel: bool) -> Vec<ParsedDocument> {
    let span = debug_span!("parse_documents", count = documents.len());
    let _guard = span.enter();

    let parser = DocumentParser::new();
    if parallel {
        documents
            .par_iter()
            .map(|doc| parser.parse(&doc.text, &doc.path))
            .collect()
    } else {
        documents
            .iter()
            .map(|doc| parser.parse(&doc.text, &doc.path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rtm_ident::{ReqId, ReqLevel};
    use rtm_record::CheckKind;

    fn doc(path: &str, text: &str) -> SourceDocument {
        SourceDocument::new(path, text)
    }

    fn build(documents: &[SourceDocument]) -> TraceGraph {
        build_trace(
            documents,
            RecordSet::new(),
            &GraphSchema::standard(),
            PipelineOptions::default(),
        )
        .expect("standard schema is valid")
    }

    #[test]
    fn parse_diagnostics_precede_build_diagnostics() {
        let documents = [
            doc(
                "specs/a.rtm",
                "# REQ-p00001 A (product)\nImpliments: REQ-p00099\n",
            ),
        ];
        let graph = build(&documents);

        let checks: Vec<CheckKind> = graph
            .validation()
            .diagnostics()
            .iter()
            .map(|d| d.check)
            .collect();
        let parse_pos = checks.iter().position(|c| *c == CheckKind::Parse);
        let broken_pos = checks.iter().position(|c| *c == CheckKind::BrokenLink);
        assert!(parse_pos.is_some());
        assert!(broken_pos.is_some());
        assert!(parse_pos < broken_pos);
    }

    #[test]
    fn parallel_and_serial_parses_agree() {
        let documents = [
            doc("specs/a.rtm", "# REQ-p00001 A (product)\nBody a.\n"),
            doc(
                "specs/b.rtm",
                "# REQ-d00001 B (development)\nImplements: REQ-p00001\n",
            ),
            doc("specs/c.rtm", "# REQ_broken Bad header\n"),
        ];
        let schema = GraphSchema::standard();

        let parallel = build_trace(
            &documents,
            RecordSet::new(),
            &schema,
            PipelineOptions {
                parallel: true,
                strict_digest: false,
            },
        )
        .unwrap();
        let serial = build_trace(
            &documents,
            RecordSet::new(),
            &schema,
            PipelineOptions {
                parallel: false,
                strict_digest: false,
            },
        )
        .unwrap();

        assert_eq!(parallel.len(), serial.len());
        assert_eq!(
            parallel.validation().diagnostics(),
            serial.validation().diagnostics()
        );
    }

    #[test]
    fn cross_document_references_resolve() {
        let documents = [
            doc("specs/a.rtm", "# REQ-p00001 Root (product)\n"),
            doc(
                "specs/b.rtm",
                "# REQ-d00001 Impl (development)\nImplements: REQ-p00001\n",
            ),
        ];
        let graph = build(&documents);

        assert_eq!(
            graph.validation().from_check(CheckKind::BrokenLink).count(),
            0
        );
        let root = graph.find_by_id(&ReqId::new(ReqLevel::Product, 1)).unwrap();
        assert_eq!(root.children().len(), 1);
    }
}
