//! Content digests for silent-edit detection
//!
//! Provides [`ContentDigest`], a strongly-typed 8-byte digest over
//! normalized requirement content. Authors store the digest in the
//! document; the builder recomputes it and reports mismatches.

use crate::requirement::Assertion;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Digest width in bytes (16 hex characters)
const DIGEST_LEN: usize = 8;

/// An 8-byte content digest (BLAKE3 prefix)
///
/// Short by design: it guards against accidental silent edits, not
/// adversarial collisions. Immutable and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    /// Create a digest from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Compute the digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..DIGEST_LEN]);
        Self(bytes)
    }

    /// Compute the digest of a requirement's normalized content
    ///
    /// The normalization rule is shared with authoring tooling: trimmed
    /// title, trimmed non-blank body lines, then one `label:text` line per
    /// assertion, all joined with `\n`.
    #[must_use]
    pub fn of_requirement(title: &str, body: &str, assertions: &[Assertion]) -> Self {
        let mut normalized = String::new();
        normalized.push_str(title.trim());
        for line in body.lines() {
            let line = line.trim();
            if !line.is_empty() {
                normalized.push('\n');
                normalized.push_str(line);
            }
        }
        for assertion in assertions {
            normalized.push('\n');
            normalized.push(assertion.label);
            normalized.push(':');
            normalized.push_str(assertion.text.trim());
        }
        Self::compute(normalized.as_bytes())
    }

    /// Create a digest from a byte slice
    ///
    /// # Errors
    /// Returns an error unless the slice is exactly 8 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestError> {
        if bytes.len() != DIGEST_LEN {
            return Err(DigestError::InvalidLength {
                expected: DIGEST_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; DIGEST_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl serde::Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DigestVisitor;

        impl serde::de::Visitor<'_> for DigestVisitor {
            type Value = ContentDigest;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 16-character hex digest string")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(DigestVisitor)
    }
}

/// Errors from digest parsing
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Wrong number of bytes
    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// Hex decoding failed
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
