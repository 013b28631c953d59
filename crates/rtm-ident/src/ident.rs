//! Requirement identifiers
//!
//! Provides [`ReqId`], the parsed form of the compact identifier syntax:
//!
//! ```text
//! [NAMESPACE:]REQ-<level-code><sequence>[-<labels>]
//!
//! REQ-p00001          whole requirement, product level
//! REQ-d00042-A        assertion A of a development requirement
//! CAL:REQ-o00007-ABC  cross-repository reference, three assertions
//! ```
//!
//! Parsing never panics; every failure is returned as an [`IdParseError`]
//! carrying a corrected identifier when the mistake is a recognized one.

use crate::level::ReqLevel;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter, Write as _};
use std::str::FromStr;

/// Maximum digits in a sequence number (canonical width)
const SEQ_WIDTH: usize = 5;

/// A parsed requirement identifier
///
/// Two identifiers with equal namespace, level and sequence but different
/// assertion labels name the same requirement at different granularity;
/// they compare unequal so that partial references never satisfy
/// whole-requirement coverage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReqId {
    /// Cross-repository namespace (e.g. `CAL`), if any
    namespace: Option<String>,

    /// Hierarchy level encoded in the identifier
    level: ReqLevel,

    /// Sequence number, formatted fixed-width
    sequence: u32,

    /// Assertion labels; empty means the whole requirement
    labels: SmallVec<[char; 4]>,
}

impl ReqId {
    /// Create a whole-requirement identifier
    #[inline]
    #[must_use]
    pub fn new(level: ReqLevel, sequence: u32) -> Self {
        Self {
            namespace: None,
            level,
            sequence,
            labels: SmallVec::new(),
        }
    }

    /// Attach a cross-repository namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Scope to a single assertion label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: char) -> Self {
        let upper = label.to_ascii_uppercase();
        if !self.labels.contains(&upper) {
            self.labels.push(upper);
            self.labels.sort_unstable();
        }
        self
    }

    /// Cross-repository namespace, if any
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Hierarchy level
    #[inline]
    #[must_use]
    pub fn level(&self) -> ReqLevel {
        self.level
    }

    /// Sequence number
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Assertion labels, normalized (sorted, deduplicated)
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[char] {
        &self.labels
    }

    /// True when this identifier names one or more assertions rather than
    /// the whole requirement
    #[inline]
    #[must_use]
    pub fn is_assertion_scoped(&self) -> bool {
        !self.labels.is_empty()
    }

    /// The whole-requirement identifier this one refers to
    /// (label scope stripped)
    #[inline]
    #[must_use]
    pub fn requirement_id(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            level: self.level,
            sequence: self.sequence,
            labels: SmallVec::new(),
        }
    }

    /// Parse an identifier, attaching a repair suggestion to recognized
    /// authoring mistakes (wrong separators, wrong prefix/level case)
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        match Self::parse_strict(text) {
            Ok(id) => Ok(id),
            Err(mut err) => {
                if err.suggestion().is_none() {
                    if let Some(fixed) = repair(text) {
                        err.set_suggestion(fixed);
                    }
                }
                Err(err)
            }
        }
    }

    /// Parse the canonical grammar only; no suggestion machinery
    fn parse_strict(text: &str) -> Result<Self, IdParseError> {
        let t = text.trim();
        if t.is_empty() {
            return Err(IdParseError::Empty);
        }

        let (namespace, rest) = match t.find(':') {
            Some(pos) => {
                let ns = &t[..pos];
                if !valid_namespace(ns) {
                    return Err(IdParseError::BadNamespace {
                        found: ns.to_string(),
                    });
                }
                (Some(ns.to_string()), &t[pos + 1..])
            }
            None => (None, t),
        };

        let rest = rest.strip_prefix("REQ").ok_or_else(|| IdParseError::MissingPrefix {
            found: rest.to_string(),
            suggestion: None,
        })?;

        let mut chars = rest.chars();
        match chars.next() {
            Some('-') => {}
            Some(c) => {
                return Err(IdParseError::BadSeparator {
                    found: c,
                    suggestion: None,
                })
            }
            None => {
                return Err(IdParseError::Truncated {
                    expected: "level code",
                })
            }
        }

        let level_char = chars.next().ok_or(IdParseError::Truncated {
            expected: "level code",
        })?;
        let level = ReqLevel::parse_code(level_char).map_err(|_| IdParseError::BadLevel {
            found: level_char,
            suggestion: None,
        })?;

        let tail = chars.as_str();
        let digit_end = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        let digits = &tail[..digit_end];
        if digits.is_empty() || digits.len() > SEQ_WIDTH {
            return Err(IdParseError::BadSequence {
                found: digits.to_string(),
                suggestion: None,
            });
        }
        let sequence: u32 = digits.parse().map_err(|_| IdParseError::BadSequence {
            found: digits.to_string(),
            suggestion: None,
        })?;

        let tail = &tail[digit_end..];
        let labels = if tail.is_empty() {
            SmallVec::new()
        } else if let Some(raw) = tail.strip_prefix('-') {
            if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(IdParseError::BadLabels {
                    found: raw.to_string(),
                    suggestion: None,
                });
            }
            normalize_labels(raw)
        } else if let Some(c) = tail.chars().next() {
            if matches!(c, '_' | '.' | ':') {
                return Err(IdParseError::BadSeparator {
                    found: c,
                    suggestion: None,
                });
            }
            return Err(IdParseError::TrailingInput {
                found: tail.to_string(),
            });
        } else {
            SmallVec::new()
        };

        Ok(Self {
            namespace,
            level,
            sequence,
            labels,
        })
    }
}

impl Display for ReqId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}:")?;
        }
        write!(f, "REQ-{}{:05}", self.level.code(), self.sequence)?;
        if !self.labels.is_empty() {
            f.write_char('-')?;
            for label in &self.labels {
                f.write_char(*label)?;
            }
        }
        Ok(())
    }
}

impl FromStr for ReqId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ReqId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ReqId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ReqIdVisitor;

        impl serde::de::Visitor<'_> for ReqIdVisitor {
            type Value = ReqId;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a requirement identifier string")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(ReqIdVisitor)
    }
}

/// Namespace: uppercase ASCII, leading letter
fn valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Uppercase, sort and deduplicate an assertion label run
fn normalize_labels(raw: &str) -> SmallVec<[char; 4]> {
    let mut labels: SmallVec<[char; 4]> =
        raw.chars().map(|c| c.to_ascii_uppercase()).collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// Rebuild a canonical identifier from common authoring mistakes
///
/// Handles wrong separators (`_`, `.`, `/`, `:` after the prefix; `.` or
/// `/` before it), a miscased `req` prefix and a miscased level code.
/// Returns `None` when the text is not recognizably an identifier.
fn repair(text: &str) -> Option<String> {
    let t = text.trim();
    let upper = t.to_ascii_uppercase();
    let req_pos = upper.find("REQ")?;

    let namespace = {
        let raw = t[..req_pos].trim_end_matches(|c: char| matches!(c, ':' | '.' | '/' | '-' | '_'));
        if raw.is_empty() {
            None
        } else {
            let ns = raw.to_ascii_uppercase();
            if !valid_namespace(&ns) {
                return None;
            }
            Some(ns)
        }
    };

    let mut chars = t[req_pos + 3..].chars().peekable();
    if matches!(chars.peek(), Some('-' | '_' | '.' | ':' | ' ')) {
        chars.next();
    }

    let level = ReqLevel::parse_code(chars.next()?.to_ascii_lowercase()).ok()?;

    let mut digits = String::new();
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    if digits.is_empty() || digits.len() > SEQ_WIDTH {
        return None;
    }
    let sequence: u32 = digits.parse().ok()?;

    let labels = match chars.peek() {
        None => SmallVec::new(),
        Some('-' | '_' | '.' | ':') => {
            chars.next();
            let raw: String = chars.collect();
            if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            normalize_labels(&raw)
        }
        Some(_) => return None,
    };

    let mut id = ReqId::new(level, sequence);
    id.namespace = namespace;
    id.labels = labels;
    Some(id.to_string())
}

/// Identifier parse failure
///
/// Every variant that corresponds to a recognized mistake carries the
/// corrected identifier text, retrievable through
/// [`suggestion`](IdParseError::suggestion).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// Nothing to parse
    #[error("empty identifier")]
    Empty,

    /// The `REQ` prefix is missing or miswritten
    #[error("missing 'REQ' prefix in '{found}'")]
    MissingPrefix {
        /// The text where the prefix was expected
        found: String,
        /// Corrected identifier, when recognizable
        suggestion: Option<String>,
    },

    /// A separator other than `-` (or `:` for namespaces)
    #[error("expected '-' separator, found '{found}'")]
    BadSeparator {
        /// The character found
        found: char,
        /// Corrected identifier, when recognizable
        suggestion: Option<String>,
    },

    /// Unknown or miscased level code
    #[error("unknown level code '{found}'")]
    BadLevel {
        /// The character found
        found: char,
        /// Corrected identifier, when recognizable
        suggestion: Option<String>,
    },

    /// Sequence number missing, non-numeric or too wide
    #[error("invalid sequence '{found}' (expected 1 to 5 digits)")]
    BadSequence {
        /// The text found in sequence position
        found: String,
        /// Corrected identifier, when recognizable
        suggestion: Option<String>,
    },

    /// Assertion label run contains non-letters
    #[error("invalid assertion labels '{found}'")]
    BadLabels {
        /// The text found in label position
        found: String,
        /// Corrected identifier, when recognizable
        suggestion: Option<String>,
    },

    /// Namespace is not uppercase ASCII with a leading letter
    #[error("invalid namespace '{found}'")]
    BadNamespace {
        /// The namespace text found
        found: String,
    },

    /// Unconsumed text after a complete identifier
    #[error("trailing input '{found}' after identifier")]
    TrailingInput {
        /// The leftover text
        found: String,
    },

    /// Input ended before the grammar was satisfied
    #[error("identifier ends early (expected {expected})")]
    Truncated {
        /// What the parser was looking for
        expected: &'static str,
    },
}

impl IdParseError {
    /// Corrected identifier text, when the mistake is a recognized one
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            IdParseError::MissingPrefix { suggestion, .. }
            | IdParseError::BadSeparator { suggestion, .. }
            | IdParseError::BadLevel { suggestion, .. }
            | IdParseError::BadSequence { suggestion, .. }
            | IdParseError::BadLabels { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }

    fn set_suggestion(&mut self, fixed: String) {
        match self {
            IdParseError::MissingPrefix { suggestion, .. }
            | IdParseError::BadSeparator { suggestion, .. }
            | IdParseError::BadLevel { suggestion, .. }
            | IdParseError::BadSequence { suggestion, .. }
            | IdParseError::BadLabels { suggestion, .. } => *suggestion = Some(fixed),
            _ => {}
        }
    }
}
