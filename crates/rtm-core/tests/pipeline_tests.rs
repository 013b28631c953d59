use rtm_core::prelude::*;
use rtm_record::{RecordSet, TestRef};
use rtm_test_utils as fixtures;

fn build(documents: &[SourceDocument], records: RecordSet) -> TraceGraph {
    build_trace(
        documents,
        records,
        &GraphSchema::standard(),
        PipelineOptions::default(),
    )
    .expect("standard schema is valid")
}

// Two documents: doc1 defines REQ-p00001 ("Auth") with assertion A and no
// references; doc2 defines REQ-d00001 implementing REQ-p00001-A, plus a
// test reference validating REQ-d00001. The finished graph holds exactly
// the four expected nodes, full coverage on the root, and no diagnostics.
#[test]
fn two_document_scenario_builds_clean() {
    fixtures::init_test_logging();

    let documents: Vec<SourceDocument> = fixtures::sample_documents()
        .into_iter()
        .map(|(path, text)| SourceDocument::new(path, text))
        .collect();

    let mut records = RecordSet::new();
    records.test_refs.push(TestRef::new(
        "tests/hashing.rs",
        14,
        "kdf_applied",
        None,
        vec![ReqId::new(ReqLevel::Development, 1)],
    ));

    let graph = build(&documents, records);

    assert_eq!(graph.len(), 4); // 2 requirements + 1 assertion + 1 test
    assert_eq!(graph.nodes_by_kind(NodeKind::Requirement).count(), 2);
    assert_eq!(graph.nodes_by_kind(NodeKind::Assertion).count(), 1);
    assert_eq!(graph.nodes_by_kind(NodeKind::Test).count(), 1);

    // The product requirement is the single root.
    assert_eq!(graph.roots().len(), 1);
    let root = graph.node(graph.roots()[0]);
    assert_eq!(root.label, "REQ-p00001");

    assert!(
        graph.validation().is_clean(),
        "expected a clean build, got: {:?}",
        graph.validation().diagnostics()
    );

    let metrics = root.metrics().expect("metrics attached after rollup");
    assert_eq!(metrics.assertions_total, 1);
    assert_eq!(metrics.assertions_covered, 1);
    assert_eq!(metrics.coverage_pct, 100.0);
    assert_eq!(metrics.tests_total, 1);
}

// Two documents both define REQ-p00002: exactly one duplicate-identifier
// diagnostic, the first-seen node stays addressable, the second is
// conflicting and excluded from traversal and rollup.
#[test]
fn duplicate_identifier_scenario() {
    let documents = [
        SourceDocument::new(
            "specs/first.rtm",
            "# REQ-p00002 First claimant (product)\nBody.\n",
        ),
        SourceDocument::new(
            "specs/second.rtm",
            "# REQ-p00002 Second claimant (product)\nBody.\n",
        ),
    ];
    let graph = build(&documents, RecordSet::new());

    let duplicates: Vec<_> = graph
        .validation()
        .from_check(CheckKind::DuplicateId)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].severity, Severity::Error);

    let indexed = graph
        .find_by_id(&ReqId::new(ReqLevel::Product, 2))
        .expect("first claimant stays addressable");
    assert_eq!(
        indexed.as_requirement().unwrap().title,
        "First claimant"
    );

    assert_eq!(graph.conflicts().len(), 1);
    let conflicting = graph.node(graph.conflicts()[0]);
    assert!(conflicting.is_conflicting());
    assert!(conflicting.metrics().is_none());

    let traversed: Vec<_> = graph.pre_order().collect();
    assert!(!traversed.contains(&conflicting.idx));
}

// Assertion-scoped coverage: with assertions A and B and only A targeted
// by a validating test, B is the one coverage gap and requirement-level
// coverage is 50%.
#[test]
fn assertion_scoped_coverage_scenario() {
    let documents = [SourceDocument::new(
        "specs/auth.rtm",
        "\
# REQ-p00001 Auth (product, active)
Assertions:
  A. Passwords are hashed.
  B. Sessions expire.
",
    )];
    let mut records = RecordSet::new();
    records.test_refs.push(TestRef::new(
        "tests/auth.rs",
        3,
        "hashing_works",
        None,
        vec![ReqId::new(ReqLevel::Product, 1).with_label('A')],
    ));

    let graph = build(&documents, records);

    let gaps: Vec<_> = graph
        .validation()
        .from_check(CheckKind::CoverageGap)
        .collect();
    assert_eq!(gaps.len(), 1);
    assert_eq!(
        gaps[0].id.as_ref().map(ToString::to_string).as_deref(),
        Some("REQ-p00001-B")
    );

    let metrics = graph
        .find_by_id(&ReqId::new(ReqLevel::Product, 1))
        .unwrap()
        .metrics()
        .unwrap();
    assert_eq!(metrics.coverage_pct, 50.0);
}

// An orphaned requirement (no Implements/Addresses, not a declared root)
// is reported exactly once.
#[test]
fn orphan_scenario() {
    let documents = [SourceDocument::new(
        "specs/floating.rtm",
        "# REQ-d00009 Floating (development)\nBody.\n",
    )];
    let graph = build(&documents, RecordSet::new());

    assert_eq!(graph.validation().from_check(CheckKind::Orphan).count(), 1);
}

// A reference to a nonexistent identifier produces exactly one
// broken-link diagnostic naming the identifier and the source line.
#[test]
fn broken_link_scenario() {
    let documents = [SourceDocument::new(
        "specs/impl.rtm",
        "\
# REQ-d00001 Impl (development)
Implements: REQ-p00042
",
    )];
    let graph = build(&documents, RecordSet::new());

    let broken: Vec<_> = graph
        .validation()
        .from_check(CheckKind::BrokenLink)
        .collect();
    assert_eq!(broken.len(), 1);
    assert!(broken[0].message.contains("REQ-p00042"));
    let location = broken[0].location.as_ref().expect("anchored to source");
    assert_eq!(location.path, "specs/impl.rtm");
    assert_eq!(location.line, 2);
}

// A waived assertion is not reported as a gap.
#[test]
fn waived_assertion_scenario() {
    let documents = [SourceDocument::new(
        "specs/waived.rtm",
        "\
# REQ-p00001 Waived (product)
Assertions:
  A. Verified by manual inspection. [waived]
",
    )];
    let graph = build(&documents, RecordSet::new());
    assert_eq!(
        graph.validation().from_check(CheckKind::CoverageGap).count(),
        0
    );
}
