//! RTM Identifier Grammar
//!
//! Parsing and validation for the compact requirement identifier syntax
//! used throughout the RTM workspace.
//!
//! # Core Concepts
//!
//! - [`ReqId`]: a parsed identifier: optional namespace, level, sequence,
//!   optional assertion labels
//! - [`ReqLevel`]: the closed hierarchy level set (product / operational /
//!   development)
//! - [`IdParseError`]: parse failure carrying a human-actionable suggestion
//!   where one is known
//!
//! # Example
//!
//! ```
//! use rtm_ident::ReqId;
//!
//! let id: ReqId = "CAL:REQ-p00001-AB".parse().unwrap();
//! assert_eq!(id.namespace(), Some("CAL"));
//! assert!(id.is_assertion_scoped());
//! assert_eq!(id.to_string(), "CAL:REQ-p00001-AB");
//! ```

#![warn(unreachable_pub)]

mod ident;
mod level;
mod suggest;

pub use ident::{IdParseError, ReqId};
pub use level::{LevelParseError, ReqLevel};
pub use suggest::nearest_keyword;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
