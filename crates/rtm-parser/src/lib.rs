//! RTM Document Parser
//!
//! Turns raw requirement-document text into structured [`Requirement`]
//! records plus line-anchored diagnostics.
//!
//! The parser is line-oriented and recovering: a malformed block produces
//! a diagnostic and parsing continues at the next block header. It never
//! touches the filesystem; documents arrive fully read.
//!
//! # Document format
//!
//! ```text
//! # REQ-p00001 Authentication (product, active)
//! Digest: 1f2e3d4c5b6a7988
//! Tags: security, auth
//! Users must authenticate before accessing the system.
//! Rationale: Regulatory requirement.
//! Assertions:
//!   A. Passwords are stored hashed. [waived]
//!   B. Sessions expire after 30 minutes.
//! Implements: REQ-p00002, CAL:REQ-o00001-A
//! ```
//!
//! [`Requirement`]: rtm_record::Requirement

#![warn(unreachable_pub)]

mod lines;
mod parser;

pub use parser::{DocumentParser, ParsedDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
