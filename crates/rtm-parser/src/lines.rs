//! Line recognizers
//!
//! Classifies one raw document line at a time. Tolerant by construction:
//! anything unrecognized is body text, and reference verbs within edit
//! distance 2 of a known verb are still recognized (the parser reports
//! the misspelling separately).

use once_cell::sync::Lazy;
use regex::Regex;
use rtm_ident::nearest_keyword;

/// Canonical reference verbs in document surface form
pub(crate) const REFERENCE_VERBS: &[&str] = &["Implements", "Refines", "Addresses"];

/// Marker suffix that waives the coverage-gap check for an assertion
pub(crate) const WAIVED_MARKER: &str = "[waived]";

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\s+(\S+)(?:\s+(.*?))?\s*$").expect("header regex")
});
static HEADER_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\(([^)]*)\)\s*$").expect("header meta regex"));
static DIGEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)Digest:\s*(\S+)\s*$").expect("digest regex"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)Tags:\s*(.*)$").expect("tags regex"));
static RATIONALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)Rationale:\s*(.*)$").expect("rationale regex"));
static ASSERTIONS_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)Assertions:\s*$").expect("assertions regex"));
static LETTERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(?([A-Za-z])[.)]\s+(.*)$").expect("lettered item regex"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").expect("numbered item regex"));
static BULLETED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").expect("bulleted item regex"));
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+):\s*(.*)$").expect("reference regex"));

/// One classified document line
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// `# <id> <title> (<meta>)`, which starts a requirement block
    Header {
        id_text: &'a str,
        title: String,
        meta: Option<String>,
    },
    /// `Digest: <hex>`
    Digest(&'a str),
    /// `Tags: a, b`
    Tags(&'a str),
    /// `Rationale: ...`
    Rationale(&'a str),
    /// `Assertions:`
    AssertionsStart,
    /// A reference line with a recognized (or near-miss) verb
    Reference {
        verb: &'a str,
        /// Canonical verb when the written one is miscased or misspelled
        corrected: Option<&'static str>,
        targets: &'a str,
    },
    /// Blank line
    Blank,
    /// Anything else
    Text(&'a str),
}

/// An assertion-list item in one of the tolerated authoring styles
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AssertionItem<'a> {
    /// `A. text` / `A) text` / `(A) text`
    Lettered { label: char, text: &'a str },
    /// `1. text` or `- text`; the label is positional
    Unlabelled { text: &'a str },
}

/// Classify a line outside the assertion-item context
pub(crate) fn classify(raw: &str) -> Line<'_> {
    if raw.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(caps) = HEADER.captures(raw) {
        let id_text = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());
        let (title, meta) = match HEADER_META.captures(rest) {
            Some(meta_caps) => (
                meta_caps.get(1).map_or("", |m| m.as_str()).to_string(),
                Some(meta_caps.get(2).map_or("", |m| m.as_str()).to_string()),
            ),
            None => (rest.to_string(), None),
        };
        return Line::Header {
            id_text,
            title,
            meta,
        };
    }
    if let Some(caps) = DIGEST.captures(raw) {
        if let Some(m) = caps.get(1) {
            return Line::Digest(m.as_str());
        }
    }
    if let Some(caps) = TAGS.captures(raw) {
        if let Some(m) = caps.get(1) {
            return Line::Tags(m.as_str());
        }
    }
    if let Some(caps) = RATIONALE.captures(raw) {
        if let Some(m) = caps.get(1) {
            return Line::Rationale(m.as_str());
        }
    }
    if ASSERTIONS_START.is_match(raw) {
        return Line::AssertionsStart;
    }
    if let Some(caps) = REFERENCE.captures(raw) {
        let verb = caps.get(1).map_or("", |m| m.as_str());
        let targets = caps.get(2).map_or("", |m| m.as_str());
        if let Some(corrected) = match_verb(verb) {
            return Line::Reference {
                verb,
                corrected,
                targets,
            };
        }
    }
    Line::Text(raw)
}

/// Classify a line as an assertion-list item, if it is one
pub(crate) fn classify_assertion_item(raw: &str) -> Option<AssertionItem<'_>> {
    if let Some(caps) = LETTERED_ITEM.captures(raw) {
        let label = caps.get(1)?.as_str().chars().next()?;
        return Some(AssertionItem::Lettered {
            label: label.to_ascii_uppercase(),
            text: caps.get(2)?.as_str(),
        });
    }
    if let Some(caps) = NUMBERED_ITEM.captures(raw) {
        return Some(AssertionItem::Unlabelled {
            text: caps.get(1)?.as_str(),
        });
    }
    if let Some(caps) = BULLETED_ITEM.captures(raw) {
        return Some(AssertionItem::Unlabelled {
            text: caps.get(1)?.as_str(),
        });
    }
    None
}

/// Match a written verb against the reference verb table
///
/// Returns `Some(None)` for an exact canonical match, `Some(Some(canon))`
/// for a miscased or misspelled (edit distance <= 2) match, and `None`
/// when the word is not a reference verb at all.
fn match_verb(verb: &str) -> Option<Option<&'static str>> {
    for canonical in REFERENCE_VERBS {
        if verb == *canonical {
            return Some(None);
        }
    }
    for canonical in REFERENCE_VERBS {
        if verb.eq_ignore_ascii_case(canonical) {
            return Some(Some(canonical));
        }
    }
    let lower = verb.to_ascii_lowercase();
    let lowered: Vec<String> = REFERENCE_VERBS.iter().map(|v| v.to_ascii_lowercase()).collect();
    let candidates: Vec<&str> = lowered.iter().map(String::as_str).collect();
    if let Some(found) = nearest_keyword(&lower, &candidates, 2) {
        let idx = candidates.iter().position(|c| *c == found)?;
        return Some(Some(REFERENCE_VERBS[idx]));
    }
    None
}
