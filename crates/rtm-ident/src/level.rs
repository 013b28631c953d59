//! Requirement hierarchy levels
//!
//! Provides [`ReqLevel`], the closed set of levels a requirement can live
//! at, with single-character codes (used inside identifiers) and full
//! keywords (used in document headers).

use crate::suggest::nearest_keyword;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Hierarchy level of a requirement
///
/// Levels form a fixed top-down order: Product > Operational > Development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReqLevel {
    /// Product-level requirement (top of the hierarchy, declared root)
    Product,
    /// Operational-level requirement
    Operational,
    /// Development-level requirement
    Development,
}

/// Full keyword table, used for header parsing and suggestions
const KEYWORDS: &[(&str, ReqLevel)] = &[
    ("product", ReqLevel::Product),
    ("operational", ReqLevel::Operational),
    ("development", ReqLevel::Development),
];

/// Known shorthand mistakes mapped to their correction
const KEYWORD_FIXES: &[(&str, ReqLevel)] = &[
    ("prod", ReqLevel::Product),
    ("prd", ReqLevel::Product),
    ("ops", ReqLevel::Operational),
    ("op", ReqLevel::Operational),
    ("oper", ReqLevel::Operational),
    ("dev", ReqLevel::Development),
    ("devel", ReqLevel::Development),
];

impl ReqLevel {
    /// Single-character code used inside identifiers
    #[inline]
    #[must_use]
    pub fn code(self) -> char {
        match self {
            ReqLevel::Product => 'p',
            ReqLevel::Operational => 'o',
            ReqLevel::Development => 'd',
        }
    }

    /// Full keyword used in document headers
    #[inline]
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            ReqLevel::Product => "product",
            ReqLevel::Operational => "operational",
            ReqLevel::Development => "development",
        }
    }

    /// Whether this is the top of the hierarchy (declared-root level)
    #[inline]
    #[must_use]
    pub fn is_top(self) -> bool {
        matches!(self, ReqLevel::Product)
    }

    /// Parse a single-character level code
    ///
    /// Uppercase codes are a known mistake and yield the lowercase
    /// correction in the error.
    pub fn parse_code(c: char) -> Result<Self, LevelParseError> {
        match c {
            'p' => Ok(ReqLevel::Product),
            'o' => Ok(ReqLevel::Operational),
            'd' => Ok(ReqLevel::Development),
            'P' | 'O' | 'D' => Err(LevelParseError::WrongCaseCode {
                found: c,
                suggestion: c.to_ascii_lowercase(),
            }),
            other => Err(LevelParseError::UnknownCode { found: other }),
        }
    }

    /// Parse a full level keyword
    ///
    /// Case-insensitive. Known shorthands (`dev`, `prod`, `ops`, ...) and
    /// near-misses (edit distance <= 2 to a keyword) are rejected with the
    /// corrected keyword attached.
    pub fn parse_keyword(s: &str) -> Result<Self, LevelParseError> {
        let lower = s.to_ascii_lowercase();
        for (kw, level) in KEYWORDS {
            if lower == *kw {
                return Ok(*level);
            }
        }
        for (fix, level) in KEYWORD_FIXES {
            if lower == *fix {
                return Err(LevelParseError::UnknownKeyword {
                    found: s.to_string(),
                    suggestion: Some(level.keyword().to_string()),
                });
            }
        }
        let candidates: Vec<&str> = KEYWORDS.iter().map(|(kw, _)| *kw).collect();
        let suggestion = nearest_keyword(&lower, &candidates, 2).map(str::to_string);
        Err(LevelParseError::UnknownKeyword {
            found: s.to_string(),
            suggestion,
        })
    }
}

impl Display for ReqLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Errors from level code/keyword parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelParseError {
    /// Level code exists but has the wrong case
    #[error("level code '{found}' has the wrong case (expected '{suggestion}')")]
    WrongCaseCode {
        /// The character found
        found: char,
        /// The lowercase correction
        suggestion: char,
    },

    /// Level code is not in the closed set
    #[error("unknown level code '{found}' (expected one of 'p', 'o', 'd')")]
    UnknownCode {
        /// The character found
        found: char,
    },

    /// Level keyword is not in the closed set
    #[error("unknown level keyword '{found}'")]
    UnknownKeyword {
        /// The keyword found
        found: String,
        /// Corrected keyword, when one is close enough
        suggestion: Option<String>,
    },
}

impl LevelParseError {
    /// Corrected text, when the mistake is a known one
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            LevelParseError::WrongCaseCode { suggestion, .. } => Some(suggestion.to_string()),
            LevelParseError::UnknownKeyword { suggestion, .. } => suggestion.clone(),
            LevelParseError::UnknownCode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for level in [ReqLevel::Product, ReqLevel::Operational, ReqLevel::Development] {
            assert_eq!(ReqLevel::parse_code(level.code()).unwrap(), level);
        }
    }

    #[test]
    fn keyword_round_trip() {
        for level in [ReqLevel::Product, ReqLevel::Operational, ReqLevel::Development] {
            assert_eq!(ReqLevel::parse_keyword(level.keyword()).unwrap(), level);
        }
    }

    #[test]
    fn keyword_is_case_insensitive() {
        assert_eq!(ReqLevel::parse_keyword("Product").unwrap(), ReqLevel::Product);
        assert_eq!(ReqLevel::parse_keyword("DEVELOPMENT").unwrap(), ReqLevel::Development);
    }

    #[test]
    fn uppercase_code_suggests_lowercase() {
        let err = ReqLevel::parse_code('P').unwrap_err();
        assert_eq!(err.suggestion().as_deref(), Some("p"));
    }

    #[test]
    fn unknown_code_has_no_suggestion() {
        let err = ReqLevel::parse_code('x').unwrap_err();
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn shorthand_keyword_suggests_full_form() {
        let err = ReqLevel::parse_keyword("dev").unwrap_err();
        assert_eq!(err.suggestion().as_deref(), Some("development"));

        let err = ReqLevel::parse_keyword("prod").unwrap_err();
        assert_eq!(err.suggestion().as_deref(), Some("product"));
    }

    #[test]
    fn near_miss_keyword_suggests_by_distance() {
        let err = ReqLevel::parse_keyword("produkt").unwrap_err();
        assert_eq!(err.suggestion().as_deref(), Some("product"));
    }

    #[test]
    fn far_keyword_has_no_suggestion() {
        let err = ReqLevel::parse_keyword("banana").unwrap_err();
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn level_ordering_is_top_down() {
        assert!(ReqLevel::Product < ReqLevel::Operational);
        assert!(ReqLevel::Operational < ReqLevel::Development);
        assert!(ReqLevel::Product.is_top());
        assert!(!ReqLevel::Development.is_top());
    }
}
