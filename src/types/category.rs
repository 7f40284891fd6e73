//! Resource categories, scalar capabilities and the table of levels each one accepts.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::level::AccessLevel;
use super::options::SyntaxVersion;

const READ_WRITE_DENY: &[AccessLevel] = &[AccessLevel::Read, AccessLevel::Write, AccessLevel::Deny];
const READ_WRITE_LIST_DENY: &[AccessLevel] = &[
    AccessLevel::Read,
    AccessLevel::Write,
    AccessLevel::List,
    AccessLevel::Deny,
];

/// Levels accepted by a service rule's `intentions` field.
pub const INTENTIONS_LEVELS: &[AccessLevel] = READ_WRITE_DENY;

/// Named resource category that carries exact and prefix rule lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Agent,
    Key,
    Node,
    Event,
    Service,
    Session,
    Query,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Agent,
        ResourceKind::Key,
        ResourceKind::Node,
        ResourceKind::Event,
        ResourceKind::Service,
        ResourceKind::Session,
        ResourceKind::Query,
    ];

    /// Source keyword for exact-match rules (and for every legacy rule).
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Key => "key",
            Self::Node => "node",
            Self::Event => "event",
            Self::Service => "service",
            Self::Session => "session",
            Self::Query => "query",
        }
    }

    #[must_use]
    pub fn prefix_keyword(self) -> &'static str {
        match self {
            Self::Agent => "agent_prefix",
            Self::Key => "key_prefix",
            Self::Node => "node_prefix",
            Self::Event => "event_prefix",
            Self::Service => "service_prefix",
            Self::Session => "session_prefix",
            Self::Query => "query_prefix",
        }
    }

    /// Levels a rule `policy` in this category may hold.
    #[must_use]
    pub fn allowed_levels(self) -> &'static [AccessLevel] {
        match self {
            Self::Key => READ_WRITE_LIST_DENY,
            _ => READ_WRITE_DENY,
        }
    }

    #[must_use]
    pub fn from_legacy_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Which of a category's two rule lists a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
}

/// Global capability holding a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Acl,
    Keyring,
    Operator,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 3] = [ScalarKind::Acl, ScalarKind::Keyring, ScalarKind::Operator];

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::Keyring => "keyring",
            Self::Operator => "operator",
        }
    }

    /// Levels the scalar may hold besides `Unset`, which is always accepted.
    #[must_use]
    pub fn allowed_levels(self) -> &'static [AccessLevel] {
        READ_WRITE_DENY
    }
}

/// What a top-level source key decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TopLevelKey {
    Rules { kind: ResourceKind, matching: MatchKind },
    Scalar(ScalarKind),
}

static CURRENT_KEYS: Lazy<HashMap<&'static str, TopLevelKey>> = Lazy::new(|| {
    let mut keys = HashMap::new();
    for kind in ResourceKind::ALL {
        keys.insert(
            kind.keyword(),
            TopLevelKey::Rules {
                kind,
                matching: MatchKind::Exact,
            },
        );
        keys.insert(
            kind.prefix_keyword(),
            TopLevelKey::Rules {
                kind,
                matching: MatchKind::Prefix,
            },
        );
    }
    for scalar in ScalarKind::ALL {
        keys.insert(scalar.keyword(), TopLevelKey::Scalar(scalar));
    }
    keys
});

// Legacy sources only know prefix semantics and have no `acl` scalar.
static LEGACY_KEYS: Lazy<HashMap<&'static str, TopLevelKey>> = Lazy::new(|| {
    let mut keys = HashMap::new();
    for kind in ResourceKind::ALL {
        keys.insert(
            kind.keyword(),
            TopLevelKey::Rules {
                kind,
                matching: MatchKind::Prefix,
            },
        );
    }
    keys.insert("keyring", TopLevelKey::Scalar(ScalarKind::Keyring));
    keys.insert("operator", TopLevelKey::Scalar(ScalarKind::Operator));
    keys
});

/// Resolve a top-level key for the given syntax. The returned label is the
/// keyword as written, used to prefix validation errors.
pub(crate) fn lookup_top_level(
    syntax: SyntaxVersion,
    key: &str,
) -> Option<(&'static str, TopLevelKey)> {
    let table = match syntax {
        SyntaxVersion::Legacy => &*LEGACY_KEYS,
        SyntaxVersion::Current => &*CURRENT_KEYS,
    };
    table.get_key_value(key).map(|(label, target)| (*label, *target))
}
