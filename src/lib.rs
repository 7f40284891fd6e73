#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(test, allow(clippy::uninlined_format_args, clippy::too_many_lines))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; public API carries docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Readability over minor perf difference when rendering block text.
#![allow(clippy::format_push_string)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't need must_use on every method

//! Rule model, parser, precedence order, merge engine and legacy translator
//! for ACL policy sources.
//!
//! ```
//! use acl_policy::{AccessLevel, ParseOptions, Policy, SyntaxVersion, merge_policies};
//!
//! let team = Policy::from_source(
//!     r#"key_prefix "team/" { policy = "write" }"#,
//!     &ParseOptions::new(SyntaxVersion::Current),
//! )?;
//! let lockdown = Policy::from_source(
//!     r#"key_prefix "team/" { policy = "deny" }"#,
//!     &ParseOptions::new(SyntaxVersion::Current),
//! )?;
//! let effective = merge_policies([&team, &lockdown]);
//! assert_eq!(effective.key_prefixes[0].policy, AccessLevel::Deny);
//! # Ok::<(), acl_policy::AclError>(())
//! ```

/// The acl-policy crate version (matches `Cargo.toml`).
pub const ACL_POLICY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod merge;
pub mod parser;
mod syntax;
pub mod translate;
pub mod types;

pub use error::{AclError, Result, SourceLocation};
pub use merge::merge_policies;
pub use parser::{AcceptAll, PolicyValidator, RuleCheck, parse_policy};
pub use translate::translate_legacy_rules;
pub use types::{
    AccessLevel, INTENTIONS_LEVELS, MatchKind, POLICY_DENY, POLICY_LIST, POLICY_READ,
    POLICY_WRITE, ParseOptions, ParseOptionsBuilder, Policy, ResourceKind, Rule, ScalarKind,
    ServiceRule, SourceEncoding, SourceFormat, SyntaxVersion, takes_precedence_over,
};
