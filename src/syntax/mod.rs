//! Structural decoding of policy sources.
//!
//! Both encodings decode into the same ordered tree of [`Entry`] values. The
//! tree keeps key order and repeated keys, so `agent "a" {}` followed by
//! `agent "b" {}` yields two `agent` entries. Semantic mapping onto the rule
//! model happens in [`crate::parser`]; the JSON translator consumes the tree
//! directly because it needs the original order.

pub(crate) mod block;
pub(crate) mod json;

use std::fmt;

use crate::types::SourceEncoding;

/// Decoded value: a string or an ordered object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value {
    Str(String),
    Object(Vec<Entry>),
}

impl Value {
    pub(crate) fn kind_label(&self) -> &'static str {
        match self {
            Self::Str(_) => "a string",
            Self::Object(_) => "an object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: String,
    pub value: Value,
    /// 1-based line in the source; JSON entries carry none.
    pub line: Option<usize>,
}

impl Entry {
    pub(crate) fn new(key: impl Into<String>, value: Value, line: Option<usize>) -> Self {
        Self {
            key: key.into(),
            value,
            line,
        }
    }
}

/// Failure to decode the structure of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodeError {
    pub line: Option<usize>,
    pub reason: String,
}

impl DecodeError {
    pub(crate) fn new(line: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

pub(crate) fn decode(source: &str, encoding: SourceEncoding) -> Result<Vec<Entry>, DecodeError> {
    match encoding {
        SourceEncoding::Block => block::decode(source),
        SourceEncoding::Json => json::decode(source),
    }
}

/// Quote a string for block text, escaping what the block grammar would reject.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `key` can be written unquoted as a block-text identifier.
pub(crate) fn is_bare_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
