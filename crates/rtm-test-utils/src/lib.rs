//! Testing utilities for the RTM workspace
//!
//! Shared fixtures and test logging setup.

#![allow(missing_docs)]

use once_cell::sync::OnceCell;
use rtm_ident::{ReqId, ReqLevel};
use rtm_record::{
    Assertion, CodeRef, RecordSet, Reference, Requirement, SourceLocation, TestRef, TestResult,
    TestStatus,
};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Initialise tracing for tests, once per process (`RUST_LOG` respected)
pub fn init_test_logging() {
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn req_id(level: ReqLevel, seq: u32) -> ReqId {
    ReqId::new(level, seq)
}

pub fn requirement(level: ReqLevel, seq: u32) -> Requirement {
    Requirement::new(
        ReqId::new(level, seq),
        format!("Requirement {seq}"),
        SourceLocation::new("specs/fixture.rtm", seq * 10),
    )
}

pub fn requirement_with_assertions(
    level: ReqLevel,
    seq: u32,
    labels: &[char],
) -> Requirement {
    let mut req = requirement(level, seq);
    for (offset, &label) in labels.iter().enumerate() {
        let line = req.location.line + 1 + u32::try_from(offset).unwrap_or(0);
        req = req.with_assertion(Assertion::new(
            label,
            format!("assertion {label}"),
            line,
        ));
    }
    req
}

pub fn implements(req: Requirement, target: ReqId) -> Requirement {
    let line = req.location.line + 5;
    req.with_reference(Reference::new("implements", target, line))
}

pub fn validating_test(name: &str, line: u32, targets: Vec<ReqId>) -> TestRef {
    TestRef::new("tests/fixture.rs", line, name, None, targets)
}

pub fn passing_result(test_id: &str) -> TestResult {
    TestResult::new(test_id, TestStatus::Passed).with_duration_ms(3)
}

pub fn failing_result(test_id: &str) -> TestResult {
    TestResult::new(test_id, TestStatus::Failed).with_message("assertion failed")
}

pub fn validating_code(file: &str, line: u32, targets: Vec<ReqId>) -> CodeRef {
    CodeRef::new(file, line, targets)
}

/// A small healthy record set validating the given identifier
pub fn records_validating(target: ReqId) -> RecordSet {
    let mut records = RecordSet::new();
    records
        .test_refs
        .push(validating_test("validates_target", 1, vec![target.clone()]));
    records
        .test_results
        .push(passing_result("validates_target"));
    records
        .code_refs
        .push(validating_code("src/fixture.rs", 10, vec![target]));
    records
}

/// A two-document corpus: a product root with one assertion, and a
/// development requirement implementing that assertion
pub fn sample_documents() -> Vec<(String, String)> {
    vec![
        (
            "specs/product.rtm".to_string(),
            "\
# REQ-p00001 Auth (product, active)
Users must authenticate.
Assertions:
  A. Passwords are stored hashed.
"
            .to_string(),
        ),
        (
            "specs/development.rtm".to_string(),
            "\
# REQ-d00001 Password hashing (development, active)
Hash passwords with a modern KDF.
Implements: REQ-p00001-A
"
            .to_string(),
        ),
    ]
}
