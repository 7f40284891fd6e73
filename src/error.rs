use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AclError>;

/// Where in a policy source an error was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: Option<String>,
    /// 1-based line, already offset by the caller's base line.
    pub line: Option<usize>,
}

impl SourceLocation {
    #[must_use]
    pub fn new(path: Option<&str>, line: Option<usize>) -> Self {
        Self {
            path: path.map(str::to_owned),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, " ({path}:{line})"),
            (Some(path), None) => write!(f, " ({path})"),
            (None, Some(line)) => write!(f, " (line {line})"),
            (None, None) => Ok(()),
        }
    }
}

/// Errors raised while parsing or translating policy sources.
///
/// Validation messages start with `Invalid <category> policy` so callers can
/// match on the prefix.
#[derive(Debug, Error)]
pub enum AclError {
    #[error("Failed to parse ACL rules{location}: {reason}")]
    Syntax {
        location: SourceLocation,
        reason: String,
    },

    /// Well-formed source whose shape does not fit the rule model.
    #[error("Failed to parse ACL rules{location}: {reason}")]
    Structure {
        location: SourceLocation,
        reason: String,
    },

    #[error("Invalid {category} policy: {detail}{location}")]
    InvalidPolicy {
        category: &'static str,
        detail: String,
        location: SourceLocation,
    },

    #[error("Invalid service intentions policy: {detail}{location}")]
    InvalidIntentions {
        detail: String,
        location: SourceLocation,
    },

    #[error("Rejected {category} rule {name:?}: {reason}")]
    Rejected {
        category: &'static str,
        name: String,
        reason: String,
    },

    #[error("Failed to translate legacy ACL rules: {reason}")]
    Translation { reason: String },
}
