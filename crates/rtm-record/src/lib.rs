//! RTM Record Types
//!
//! The shared vocabulary between the document parser and the graph
//! builder.
//!
//! # Core Concepts
//!
//! - [`Requirement`] / [`Assertion`] / [`Reference`]: the parsed form of a
//!   specification document block
//! - [`CodeRef`] / [`TestRef`] / [`TestResult`] / [`Journey`]: externally
//!   produced verification records, delivered by format adapters
//! - [`ContentDigest`]: short fixed-length digest over normalized
//!   requirement content, used to detect silent edits
//! - [`Diagnostic`] / [`ValidationResult`]: the accumulate-don't-abort
//!   failure channel shared by every build phase
//!
//! All records are created once per build from their sources and are
//! immutable during the build.

#![warn(unreachable_pub)]

mod diagnostic;
mod digest;
mod location;
mod records;
mod requirement;

pub use diagnostic::{CheckKind, Diagnostic, Severity, ValidationResult};
pub use digest::{ContentDigest, DigestError};
pub use location::SourceLocation;
pub use records::{CodeRef, Journey, RecordSet, TestRef, TestResult, TestStatus};
pub use requirement::{Assertion, Reference, ReqStatus, Requirement, UnknownStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
