//! External verification records
//!
//! Code references, test definitions, test execution results and user
//! journeys arrive as plain structured records from format adapters
//! (JUnit XML, JSON reports, source scans) that live outside this core.

use rtm_ident::ReqId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A code location that validates one or more requirements/assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRef {
    /// Source file path
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// Symbol at the location, when the adapter resolved one
    pub symbol: Option<String>,
    /// Identifiers this code claims to validate
    pub targets: Vec<ReqId>,
}

impl CodeRef {
    /// Create a code reference
    #[inline]
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, targets: Vec<ReqId>) -> Self {
        Self {
            file: file.into(),
            line,
            symbol: None,
            targets,
        }
    }

    /// Attach the resolved symbol name
    #[inline]
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Stable key used to index the code node
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// A test definition that validates one or more requirements/assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRef {
    /// Qualified test identifier (`suite::name` when a suite exists)
    pub id: String,
    /// Test source file
    pub file: String,
    /// 1-based line of the definition
    pub line: u32,
    /// Bare test name
    pub name: String,
    /// Owning class or suite, when the framework has one
    pub suite: Option<String>,
    /// Identifiers this test claims to validate
    pub targets: Vec<ReqId>,
}

impl TestRef {
    /// Create a test reference; the qualified id is derived from suite
    /// and name
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        line: u32,
        name: impl Into<String>,
        suite: Option<String>,
        targets: Vec<ReqId>,
    ) -> Self {
        let name = name.into();
        let id = match &suite {
            Some(suite) => format!("{suite}::{name}"),
            None => name.clone(),
        };
        Self {
            id,
            file: file.into(),
            line,
            name,
            suite,
            targets,
        }
    }
}

/// Outcome of one test execution, keyed to its [`TestRef`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Qualified id of the test that produced this result
    pub test_id: String,
    /// Execution outcome
    pub status: TestStatus,
    /// Wall-clock duration, when the adapter reports one
    pub duration_ms: Option<u64>,
    /// Failure message or skip reason
    pub message: Option<String>,
}

impl TestResult {
    /// Create a result for the given test
    #[inline]
    #[must_use]
    pub fn new(test_id: impl Into<String>, status: TestStatus) -> Self {
        Self {
            test_id: test_id.into(),
            status,
            duration_ms: None,
            message: None,
        }
    }

    /// Attach a duration
    #[inline]
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attach a message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Test execution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Ran and passed
    Passed,
    /// Ran and failed
    Failed,
    /// Deliberately not run
    Skipped,
    /// Adapter could not determine the outcome
    Unknown,
}

impl Display for TestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A non-normative user journey addressing requirements
///
/// Journeys document intent; they contribute no coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    /// Journey name
    pub name: String,
    /// Acting persona
    pub actor: String,
    /// What the actor is trying to achieve
    pub goal: String,
    /// Ordered narrative steps
    pub steps: Vec<String>,
    /// Identifiers the journey addresses
    pub targets: Vec<ReqId>,
}

impl Journey {
    /// Create a journey
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        actor: impl Into<String>,
        goal: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            actor: actor.into(),
            goal: goal.into(),
            steps: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Append a step
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append an addressed identifier
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: ReqId) -> Self {
        self.targets.push(target);
        self
    }
}

/// The four external record collections handed to a build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Code references
    pub code_refs: Vec<CodeRef>,
    /// Test definitions
    pub test_refs: Vec<TestRef>,
    /// Test execution results
    pub test_results: Vec<TestResult>,
    /// User journeys
    pub journeys: Vec<Journey>,
}

impl RecordSet {
    /// Create an empty record set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count across all four collections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.code_refs.len() + self.test_refs.len() + self.test_results.len() + self.journeys.len()
    }

    /// True when no records are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtm_ident::{ReqId, ReqLevel};

    #[test]
    fn test_ref_qualified_id() {
        let plain = TestRef::new("tests/auth.rs", 10, "login_works", None, vec![]);
        assert_eq!(plain.id, "login_works");

        let suited = TestRef::new(
            "tests/auth.rs",
            10,
            "login_works",
            Some("AuthSuite".to_string()),
            vec![],
        );
        assert_eq!(suited.id, "AuthSuite::login_works");
    }

    #[test]
    fn code_ref_key_is_file_and_line() {
        let code = CodeRef::new("src/auth.rs", 42, vec![ReqId::new(ReqLevel::Product, 1)]);
        assert_eq!(code.key(), "src/auth.rs:42");
    }

    #[test]
    fn test_result_builder() {
        let result = TestResult::new("AuthSuite::login_works", TestStatus::Failed)
            .with_duration_ms(12)
            .with_message("assertion failed");
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.duration_ms, Some(12));
    }

    #[test]
    fn record_set_len() {
        let mut records = RecordSet::new();
        assert!(records.is_empty());
        records.code_refs.push(CodeRef::new("src/a.rs", 1, vec![]));
        records
            .journeys
            .push(Journey::new("checkout", "shopper", "buy a thing"));
        assert_eq!(records.len(), 2);
    }
}
