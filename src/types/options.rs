//! Parse configuration: syntax version, source encoding and builder-style options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rule syntax a policy source is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxVersion {
    /// Pre-`_prefix` syntax where every rule is a prefix rule.
    Legacy,
    #[default]
    Current,
}

impl SyntaxVersion {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Current => "current",
        }
    }
}

impl fmt::Display for SyntaxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SyntaxVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "current" => Ok(Self::Current),
            other => Err(format!("unknown syntax version '{other}'")),
        }
    }
}

/// Textual encoding of a policy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEncoding {
    /// `category "identifier" { policy = "value" }` block text.
    Block,
    Json,
}

impl SourceEncoding {
    /// JSON sources are objects; block text can never open with a brace.
    #[must_use]
    pub fn detect(source: &str) -> Self {
        let body = source.trim_start_matches(|c: char| c.is_whitespace() || c == BOM);
        if body.starts_with('{') {
            Self::Json
        } else {
            Self::Block
        }
    }
}

pub(crate) const BOM: char = '\u{FEFF}';

/// Syntax version paired with the encoding it arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    LegacyBlock,
    LegacyJson,
    CurrentBlock,
    CurrentJson,
}

impl SourceFormat {
    #[must_use]
    pub fn new(syntax: SyntaxVersion, encoding: SourceEncoding) -> Self {
        match (syntax, encoding) {
            (SyntaxVersion::Legacy, SourceEncoding::Block) => Self::LegacyBlock,
            (SyntaxVersion::Legacy, SourceEncoding::Json) => Self::LegacyJson,
            (SyntaxVersion::Current, SourceEncoding::Block) => Self::CurrentBlock,
            (SyntaxVersion::Current, SourceEncoding::Json) => Self::CurrentJson,
        }
    }

    #[must_use]
    pub fn detect(source: &str, syntax: SyntaxVersion) -> Self {
        Self::new(syntax, SourceEncoding::detect(source))
    }

    #[must_use]
    pub fn syntax(self) -> SyntaxVersion {
        match self {
            Self::LegacyBlock | Self::LegacyJson => SyntaxVersion::Legacy,
            Self::CurrentBlock | Self::CurrentJson => SyntaxVersion::Current,
        }
    }

    #[must_use]
    pub fn encoding(self) -> SourceEncoding {
        match self {
            Self::LegacyBlock | Self::CurrentBlock => SourceEncoding::Block,
            Self::LegacyJson | Self::CurrentJson => SourceEncoding::Json,
        }
    }
}

/// Options for parsing one policy source.
///
/// `path` and `base_line` only enrich error messages; they never change how a
/// source is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub path: Option<String>,
    /// Added to 1-based source line numbers when reporting locations.
    #[serde(default)]
    pub base_line: usize,
    #[serde(default)]
    pub syntax: SyntaxVersion,
}

impl ParseOptions {
    #[must_use]
    pub fn new(syntax: SyntaxVersion) -> Self {
        Self {
            syntax,
            ..Self::default()
        }
    }

    /// Start a fluent builder for `ParseOptions`.
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    inner: ParseOptions,
}

impl ParseOptionsBuilder {
    pub fn path<S: Into<String>>(mut self, path: S) -> Self {
        self.inner.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn base_line(mut self, base_line: usize) -> Self {
        self.inner.base_line = base_line;
        self
    }

    #[must_use]
    pub fn syntax(mut self, syntax: SyntaxVersion) -> Self {
        self.inner.syntax = syntax;
        self
    }

    #[must_use]
    pub fn build(self) -> ParseOptions {
        self.inner
    }
}
