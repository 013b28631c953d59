//! Requirement records
//!
//! The parsed form of one requirement block: identifier, header fields,
//! body, assertions and outbound references. Produced by the document
//! parser, consumed by the graph builder; immutable during a build.

use crate::digest::ContentDigest;
use crate::location::SourceLocation;
use rtm_ident::ReqId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Lifecycle status of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReqStatus {
    /// Normative and in force
    Active,
    /// Under authoring, not yet normative
    Draft,
    /// Kept for history, superseded
    Deprecated,
    /// Withdrawn entirely
    Retired,
}

impl ReqStatus {
    /// Keyword form used in document headers
    #[inline]
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            ReqStatus::Active => "active",
            ReqStatus::Draft => "draft",
            ReqStatus::Deprecated => "deprecated",
            ReqStatus::Retired => "retired",
        }
    }
}

impl Default for ReqStatus {
    fn default() -> Self {
        ReqStatus::Active
    }
}

impl Display for ReqStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ReqStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ReqStatus::Active),
            "draft" => Ok(ReqStatus::Draft),
            "deprecated" => Ok(ReqStatus::Deprecated),
            "retired" => Ok(ReqStatus::Retired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Status keyword not in the closed set
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// A single testable obligation within a requirement
///
/// Not independently addressable outside its requirement except through
/// the assertion-scoped identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Single uppercase label, unique within the requirement
    pub label: char,
    /// Obligation text
    pub text: String,
    /// 1-based line in the source document
    pub line: u32,
    /// Explicit marker suppressing the coverage-gap diagnostic
    pub waived: bool,
}

impl Assertion {
    /// Create an assertion
    #[inline]
    #[must_use]
    pub fn new(label: char, text: impl Into<String>, line: u32) -> Self {
        Self {
            label,
            text: text.into(),
            line,
            waived: false,
        }
    }

    /// Mark the assertion as waived (expected coverage gap)
    #[inline]
    #[must_use]
    pub fn waived(mut self) -> Self {
        self.waived = true;
        self
    }
}

/// An outbound reference from a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Relationship verb, lowercased (`implements`, `refines`, `addresses`)
    pub relation: String,
    /// Target identifier, possibly assertion-scoped
    pub target: ReqId,
    /// 1-based line of the reference in the source document
    pub line: u32,
}

impl Reference {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(relation: impl Into<String>, target: ReqId, line: u32) -> Self {
        Self {
            relation: relation.into(),
            target,
            line,
        }
    }
}

/// A parsed requirement block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Identifier claimed by this block
    pub id: ReqId,
    /// Header title
    pub title: String,
    /// Lifecycle status from the header
    pub status: ReqStatus,
    /// Free-text body
    pub body: String,
    /// Non-normative rationale, when present
    pub rationale: Option<String>,
    /// Ordered assertion list
    pub assertions: Vec<Assertion>,
    /// Outbound references, tagged with their relationship verb
    pub references: Vec<Reference>,
    /// Digest stored in the document, when present
    pub declared_digest: Option<ContentDigest>,
    /// Digest recomputed from the parsed content
    pub computed_digest: ContentDigest,
    /// Block location in the source document
    pub location: SourceLocation,
    /// Free-form tags from the header section
    pub tags: Vec<String>,
    /// Classification from the document path (first directory component)
    pub category: Option<String>,
    /// Set by the builder when this block claims an already-taken
    /// identifier; conflicting requirements are kept for diagnostics but
    /// excluded from indexing, traversal and rollup
    pub conflicting: bool,
}

impl Requirement {
    /// Create a requirement with the given header fields
    ///
    /// The computed digest starts from empty content; the parser refreshes
    /// it once body and assertions are in place.
    #[must_use]
    pub fn new(id: ReqId, title: impl Into<String>, location: SourceLocation) -> Self {
        let title = title.into();
        let computed_digest = ContentDigest::of_requirement(&title, "", &[]);
        Self {
            id,
            title,
            status: ReqStatus::default(),
            body: String::new(),
            rationale: None,
            assertions: Vec::new(),
            references: Vec::new(),
            declared_digest: None,
            computed_digest,
            location,
            tags: Vec::new(),
            category: None,
            conflicting: false,
        }
    }

    /// Set the status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ReqStatus) -> Self {
        self.status = status;
        self
    }

    /// Append an assertion
    #[inline]
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self.refresh_digest();
        self
    }

    /// Append a reference
    #[inline]
    #[must_use]
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    /// Replace the body text
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.refresh_digest();
        self
    }

    /// Recompute the content digest from current title, body and assertions
    pub fn refresh_digest(&mut self) {
        self.computed_digest =
            ContentDigest::of_requirement(&self.title, &self.body, &self.assertions);
    }

    /// Look up an assertion by label
    #[inline]
    #[must_use]
    pub fn assertion(&self, label: char) -> Option<&Assertion> {
        self.assertions.iter().find(|a| a.label == label)
    }

    /// True when the declared digest is present and disagrees with the
    /// recomputed one (signals an edit without digest regeneration)
    #[inline]
    #[must_use]
    pub fn digest_mismatch(&self) -> bool {
        self.declared_digest
            .is_some_and(|declared| declared != self.computed_digest)
    }

    /// References carrying the given relationship verb
    pub fn references_for<'a>(
        &'a self,
        relation: &'a str,
    ) -> impl Iterator<Item = &'a Reference> + 'a {
        self.references.iter().filter(move |r| r.relation == relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtm_ident::ReqLevel;

    fn sample() -> Requirement {
        Requirement::new(
            ReqId::new(ReqLevel::Product, 1),
            "Authentication",
            SourceLocation::new("specs/auth.rtm", 1),
        )
        .with_body("Users must authenticate before access.")
        .with_assertion(Assertion::new('A', "Passwords are hashed", 4))
    }

    #[test]
    fn status_keywords_round_trip() {
        for status in [
            ReqStatus::Active,
            ReqStatus::Draft,
            ReqStatus::Deprecated,
            ReqStatus::Retired,
        ] {
            assert_eq!(status.keyword().parse::<ReqStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<ReqStatus>().is_err());
    }

    #[test]
    fn builder_refreshes_digest() {
        let req = sample();
        let expected =
            ContentDigest::of_requirement(&req.title, &req.body, &req.assertions);
        assert_eq!(req.computed_digest, expected);
    }

    #[test]
    fn digest_mismatch_detection() {
        let mut req = sample();
        assert!(!req.digest_mismatch());

        req.declared_digest = Some(req.computed_digest);
        assert!(!req.digest_mismatch());

        req.body.push_str(" Edited.");
        req.refresh_digest();
        assert!(req.digest_mismatch());
    }

    #[test]
    fn assertion_lookup_by_label() {
        let req = sample();
        assert!(req.assertion('A').is_some());
        assert!(req.assertion('B').is_none());
    }

    #[test]
    fn references_filtered_by_relation() {
        let target = ReqId::new(ReqLevel::Product, 2);
        let req = sample()
            .with_reference(Reference::new("implements", target.clone(), 7))
            .with_reference(Reference::new("refines", target, 8));

        assert_eq!(req.references_for("implements").count(), 1);
        assert_eq!(req.references_for("addresses").count(), 0);
    }

    #[test]
    fn waived_assertion_marker() {
        let a = Assertion::new('A', "manual review only", 3).waived();
        assert!(a.waived);
    }
}
