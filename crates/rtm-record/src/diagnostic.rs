//! Diagnostics and the validation result
//!
//! Every build phase recovers locally and reports what it found here;
//! nothing in the parse/build/validate pipeline aborts on imperfect input.

use crate::location::SourceLocation;
use rtm_ident::ReqId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; no action required
    Info,
    /// Something is wrong but the graph is still usable
    Warning,
    /// The graph is structurally incorrect at this point
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Which check produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    /// Document parser: malformed block, reference or line
    Parse,
    /// Two non-conflicting requirements claim one identifier
    DuplicateId,
    /// A cycle through rollup-eligible edges
    Cycle,
    /// A non-root node with no mandatory parent relationship
    Orphan,
    /// A reference whose target does not resolve
    BrokenLink,
    /// An edge violating the level hierarchy rules
    LevelConstraint,
    /// An assertion with no validating edge
    CoverageGap,
    /// Declared content digest disagrees with the recomputed one
    DigestMismatch,
}

impl Display for CheckKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckKind::Parse => "parse",
            CheckKind::DuplicateId => "duplicate-id",
            CheckKind::Cycle => "cycle",
            CheckKind::Orphan => "orphan",
            CheckKind::BrokenLink => "broken-link",
            CheckKind::LevelConstraint => "level-constraint",
            CheckKind::CoverageGap => "coverage-gap",
            CheckKind::DigestMismatch => "digest-mismatch",
        };
        f.write_str(s)
    }
}

/// One finding from a parse or validation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the finding
    pub severity: Severity,
    /// The check that produced it
    pub check: CheckKind,
    /// The identifier involved, when one applies
    pub id: Option<ReqId>,
    /// Human-readable description
    pub message: String,
    /// Where in the sources the finding is anchored
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Create a diagnostic
    #[inline]
    #[must_use]
    pub fn new(severity: Severity, check: CheckKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            check,
            id: None,
            message: message.into(),
            location: None,
        }
    }

    /// Create an error-severity diagnostic
    #[inline]
    #[must_use]
    pub fn error(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, check, message)
    }

    /// Create a warning-severity diagnostic
    #[inline]
    #[must_use]
    pub fn warning(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, check, message)
    }

    /// Create an info-severity diagnostic
    #[inline]
    #[must_use]
    pub fn info(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, check, message)
    }

    /// Attach the involved identifier
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: ReqId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach a source location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.check)?;
        if let Some(id) = &self.id {
            write!(f, " {id}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics for one build
///
/// Checks append independently; the order reflects pipeline phase order
/// and is stable across identical builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Create an empty result
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append many diagnostics
    #[inline]
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// All diagnostics in report order
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of a given severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Diagnostics from a given check
    pub fn from_check(&self, check: CheckKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.check == check)
    }

    /// True when any error-severity diagnostic is present
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.with_severity(Severity::Error).next().is_some()
    }

    /// True when no diagnostics were reported at all
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True when empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtm_ident::{ReqId, ReqLevel};

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::warning(CheckKind::Orphan, "no mandatory parent")
            .with_id(ReqId::new(ReqLevel::Development, 3))
            .with_location(SourceLocation::new("specs/x.rtm", 9));
        let text = d.to_string();
        assert!(text.contains("warning"));
        assert!(text.contains("orphan"));
        assert!(text.contains("REQ-d00003"));
        assert!(text.contains("specs/x.rtm:9"));
    }

    #[test]
    fn result_filters() {
        let mut result = ValidationResult::new();
        result.push(Diagnostic::error(CheckKind::Cycle, "cycle found"));
        result.push(Diagnostic::warning(CheckKind::Orphan, "orphan found"));
        result.push(Diagnostic::warning(CheckKind::Orphan, "another orphan"));

        assert!(result.has_errors());
        assert!(!result.is_clean());
        assert_eq!(result.with_severity(Severity::Warning).count(), 2);
        assert_eq!(result.from_check(CheckKind::Orphan).count(), 2);
        assert_eq!(result.from_check(CheckKind::BrokenLink).count(), 0);
    }

    #[test]
    fn clean_result() {
        let result = ValidationResult::new();
        assert!(result.is_clean());
        assert!(!result.has_errors());
        assert_eq!(result.len(), 0);
    }
}
