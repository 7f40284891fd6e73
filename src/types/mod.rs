//! Public types exposed by the `acl-policy` crate.

pub mod category;
pub mod level;
pub mod options;
pub mod rules;

pub use category::{INTENTIONS_LEVELS, MatchKind, ResourceKind, ScalarKind};
pub use level::{
    AccessLevel, POLICY_DENY, POLICY_LIST, POLICY_READ, POLICY_WRITE, takes_precedence_over,
};
pub use options::{
    ParseOptions, ParseOptionsBuilder, SourceEncoding, SourceFormat, SyntaxVersion,
};
pub use rules::{Policy, Rule, ServiceRule};
