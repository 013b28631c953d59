//! Source locations for diagnostics and downstream tooling

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A position in a source document or code file
///
/// Lines are 1-based throughout the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Document or file path as handed to the parser
    pub path: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based end line, when the element spans several lines
    pub end_line: Option<u32>,
}

impl SourceLocation {
    /// Create a single-line location
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
            end_line: None,
        }
    }

    /// Set the end line of a multi-line span
    #[inline]
    #[must_use]
    pub fn with_end_line(mut self, end_line: u32) -> Self {
        self.end_line = Some(end_line);
        self
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.end_line {
            Some(end) if end != self.line => write!(f, "{}:{}-{}", self.path, self.line, end),
            _ => write!(f, "{}:{}", self.path, self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_single_line() {
        let loc = SourceLocation::new("specs/auth.rtm", 12);
        assert_eq!(loc.to_string(), "specs/auth.rtm:12");
    }

    #[test]
    fn display_span() {
        let loc = SourceLocation::new("specs/auth.rtm", 12).with_end_line(20);
        assert_eq!(loc.to_string(), "specs/auth.rtm:12-20");
    }
}
