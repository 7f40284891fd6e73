//! Access levels and the precedence order used to resolve conflicts between them.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const POLICY_DENY: &str = "deny";
pub const POLICY_WRITE: &str = "write";
pub const POLICY_LIST: &str = "list";
pub const POLICY_READ: &str = "read";

/// Policy level attached to a rule or a global capability.
///
/// `Unset` carries no opinion. It is what an empty scalar (`keyring = ""`)
/// decodes to and it never displaces another level during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Deny,
    Write,
    List,
    Read,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl AccessLevel {
    /// Every level in descending precedence order.
    pub const ALL: [AccessLevel; 5] = [
        AccessLevel::Deny,
        AccessLevel::Write,
        AccessLevel::List,
        AccessLevel::Read,
        AccessLevel::Unset,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deny => POLICY_DENY,
            Self::Write => POLICY_WRITE,
            Self::List => POLICY_LIST,
            Self::Read => POLICY_READ,
            Self::Unset => "",
        }
    }

    /// Strict lookup: `None` for anything that is not a level name or the empty string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            POLICY_DENY => Some(Self::Deny),
            POLICY_WRITE => Some(Self::Write),
            POLICY_LIST => Some(Self::List),
            POLICY_READ => Some(Self::Read),
            "" => Some(Self::Unset),
            _ => None,
        }
    }

    /// Permissive lookup: unrecognized strings collapse to `Unset`.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Unset)
    }

    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Deny => 4,
            Self::Write => 3,
            Self::List => 2,
            Self::Read => 1,
            Self::Unset => 0,
        }
    }

    #[must_use]
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    #[must_use]
    pub fn takes_precedence_over(self, other: Self) -> bool {
        self.rank() > other.rank()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of a raw level string; unknown strings (and the empty string) rank 0.
fn rank_of(value: &str) -> u8 {
    AccessLevel::parse_lossy(value).rank()
}

/// Reports whether level `a` wins over level `b` when both apply to the same
/// target: `deny` > `write` > `list` > `read` > anything else.
///
/// Two unrecognized values never take precedence over each other.
#[must_use]
pub fn takes_precedence_over(a: &str, b: &str) -> bool {
    rank_of(a) > rank_of(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_table() {
        let cases = [
            ("deny", "write", true),
            ("deny", "list", true),
            ("deny", "read", true),
            ("deny", "not a policy", true),
            ("write", "list", true),
            ("write", "read", true),
            ("write", "not a policy", true),
            ("list", "read", true),
            ("list", "not a policy", true),
            ("read", "not a policy", true),
            ("write", "deny", false),
            ("list", "deny", false),
            ("read", "deny", false),
            ("list", "write", false),
            ("read", "write", false),
            ("not a policy", "write", false),
            ("read", "list", false),
            ("not a policy", "list", false),
            ("not a policy", "read", false),
        ];
        for (a, b, expected) in cases {
            assert_eq!(takes_precedence_over(a, b), expected, "{a} over {b}");
        }
    }

    #[test]
    fn unknown_values_never_win_against_each_other() {
        assert!(!takes_precedence_over("nope", ""));
        assert!(!takes_precedence_over("", "nope"));
        assert!(!takes_precedence_over("nope", "other"));
    }

    #[test]
    fn enum_order_matches_string_order() {
        for a in AccessLevel::ALL {
            for b in AccessLevel::ALL {
                assert_eq!(
                    a.takes_precedence_over(b),
                    takes_precedence_over(a.as_str(), b.as_str())
                );
            }
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&[AccessLevel::List, AccessLevel::Unset]).unwrap();
        assert_eq!(json, r#"["list",""]"#);
        let back: Vec<AccessLevel> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![AccessLevel::List, AccessLevel::Unset]);
    }
}
