//! Block-text decoder built on a pest grammar (`block.pest`).

use std::ops::Range;

use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::{DecodeError, Entry, Value};

#[derive(Parser)]
#[grammar = "syntax/block.pest"]
struct BlockParser;

/// Position of a top-level key token in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeySpan {
    /// Unescaped key text.
    pub name: String,
    /// Byte range of the token, quotes included when `quoted`.
    pub range: Range<usize>,
    pub quoted: bool,
}

pub(crate) fn decode(source: &str) -> Result<Vec<Entry>, DecodeError> {
    let document = parse_document(source)?;
    document
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::entry)
        .map(decode_entry)
        .collect()
}

/// Locate the key token of every top-level entry, in source order.
pub(crate) fn top_level_keys(source: &str) -> Result<Vec<KeySpan>, DecodeError> {
    let document = parse_document(source)?;
    let mut spans = Vec::new();
    for entry in document.into_inner().filter(|pair| pair.as_rule() == Rule::entry) {
        let line = line_of(&entry);
        let key = entry
            .into_inner()
            .next()
            .ok_or_else(|| malformed(line, "entry without key"))?;
        let span = key.as_span();
        let (name, quoted) = decode_key(key)?;
        spans.push(KeySpan {
            name,
            range: span.start()..span.end(),
            quoted,
        });
    }
    Ok(spans)
}

fn parse_document(source: &str) -> Result<Pair<'_, Rule>, DecodeError> {
    let mut pairs = BlockParser::parse(Rule::document, source).map_err(|err| {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => pos,
        };
        DecodeError::new(
            Some(line),
            format!("column {column}: {}", err.variant.message()),
        )
    })?;
    pairs
        .next()
        .ok_or_else(|| malformed(None, "empty parse tree"))
}

fn decode_entry(pair: Pair<'_, Rule>) -> Result<Entry, DecodeError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let key = inner
        .next()
        .ok_or_else(|| malformed(line, "entry without key"))?;
    let (key, _) = decode_key(key)?;
    let rest = inner
        .next()
        .ok_or_else(|| malformed(line, "entry without value"))?;

    let value = match rest.as_rule() {
        Rule::assign => {
            let value = rest
                .into_inner()
                .next()
                .ok_or_else(|| malformed(line, "assignment without value"))?;
            decode_value(value)?
        }
        Rule::labels => {
            let labels = rest
                .into_inner()
                .map(|label| decode_label(label, line))
                .collect::<Result<Vec<_>, _>>()?;
            let body = inner
                .next()
                .ok_or_else(|| malformed(line, "block without body"))?;
            // `a "b" "c" { .. }` is shorthand for `a = { "b" = { "c" = { .. } } }`.
            labels
                .into_iter()
                .rev()
                .fold(decode_value(body)?, |value, label| {
                    Value::Object(vec![Entry::new(label, value, line)])
                })
        }
        other => return Err(malformed(line, format!("unexpected {other:?}"))),
    };
    Ok(Entry::new(key, value, line))
}

fn decode_value(pair: Pair<'_, Rule>) -> Result<Value, DecodeError> {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::string => decode_string(pair).map(Value::Str),
        Rule::body => pair
            .into_inner()
            .map(decode_entry)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Object),
        other => Err(malformed(line, format!("unexpected {other:?}"))),
    }
}

fn decode_key(pair: Pair<'_, Rule>) -> Result<(String, bool), DecodeError> {
    let line = line_of(&pair);
    let token = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed(line, "empty key"))?;
    match token.as_rule() {
        Rule::ident => Ok((token.as_str().to_owned(), false)),
        Rule::string => Ok((decode_string(token)?, true)),
        other => Err(malformed(line, format!("unexpected {other:?}"))),
    }
}

fn decode_label(pair: Pair<'_, Rule>, line: Option<usize>) -> Result<String, DecodeError> {
    let token = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed(line, "empty label"))?;
    match token.as_rule() {
        Rule::ident => Ok(token.as_str().to_owned()),
        _ => decode_string(token),
    }
}

fn decode_string(pair: Pair<'_, Rule>) -> Result<String, DecodeError> {
    let line = line_of(&pair);
    let raw = pair.into_inner().next().map_or("", |chars| chars.as_str());
    unescape(raw).map_err(|reason| malformed(line, reason))
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\' | '/')) => out.push(c),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape \\u{hex}"))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode escape \\u{hex}"))?;
                out.push(decoded);
            }
            Some(other) => return Err(format!("invalid escape \\{other}")),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}

fn line_of(pair: &Pair<'_, Rule>) -> Option<usize> {
    Some(pair.as_span().start_pos().line_col().0)
}

fn malformed(line: Option<usize>, reason: impl Into<String>) -> DecodeError {
    DecodeError::new(line, reason)
}
