//! Rewrites legacy policy sources into current syntax.
//!
//! Block text is rewritten in place: only top-level category keywords gain a
//! `_prefix` suffix, so comments, spacing and rule bodies survive untouched.
//! JSON is re-emitted as block text in the order keys appear in the source.

use tracing::trace;

use crate::error::{AclError, Result};
use crate::syntax::{self, DecodeError, Entry, Value, block, is_bare_identifier, quote};
use crate::types::{ResourceKind, SourceEncoding};

const PREFIX_SUFFIX: &str = "_prefix";
const INDENT: &str = "  ";

/// Translate legacy rules to current syntax with the same meaning.
///
/// Every legacy rule is a prefix rule, so each category keyword becomes its
/// `_prefix` form. Levels are not validated here; parse the result to do so.
pub fn translate_legacy_rules(source: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(source).map_err(|err| AclError::Translation {
        reason: format!("source is not valid UTF-8: {err}"),
    })?;

    let encoding = SourceEncoding::detect(text);
    let rewritten = match encoding {
        SourceEncoding::Block => rewrite_block(text)?,
        SourceEncoding::Json => render_json(text)?,
    };

    trace!(
        target: "acl::translate",
        encoding = ?encoding,
        input_bytes = source.len(),
        output_bytes = rewritten.len(),
        "translated legacy rules"
    );
    Ok(rewritten.trim_matches(['\r', '\n']).as_bytes().to_vec())
}

fn rewrite_block(text: &str) -> Result<String> {
    let keys = block::top_level_keys(text).map_err(translation_error)?;

    let mut out = String::with_capacity(text.len() + keys.len() * PREFIX_SUFFIX.len());
    let mut cursor = 0;
    for key in keys {
        if ResourceKind::from_legacy_keyword(&key.name).is_none() {
            continue;
        }
        // Quoted keys get the suffix inside the closing quote.
        let insert_at = if key.quoted {
            key.range.end - 1
        } else {
            key.range.end
        };
        out.push_str(&text[cursor..insert_at]);
        out.push_str(PREFIX_SUFFIX);
        cursor = insert_at;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn render_json(text: &str) -> Result<String> {
    let entries = syntax::json::decode(text).map_err(translation_error)?;

    let mut blocks = Vec::new();
    for entry in &entries {
        match &entry.value {
            Value::Str(level) => blocks.push(format!("{} = {}", render_key(&entry.key), quote(level))),
            Value::Object(rules) => {
                let keyword = match ResourceKind::from_legacy_keyword(&entry.key) {
                    Some(kind) => kind.prefix_keyword().to_owned(),
                    None => render_key(&entry.key),
                };
                for rule in rules {
                    blocks.push(render_rule(&keyword, &entry.key, rule)?);
                }
            }
        }
    }
    Ok(blocks.join("\n\n"))
}

fn render_rule(keyword: &str, category: &str, rule: &Entry) -> Result<String> {
    let Value::Object(fields) = &rule.value else {
        return Err(AclError::Translation {
            reason: format!("rule {:?} under {category:?} must be an object", rule.key),
        });
    };
    let mut out = format!("{keyword} {} {{\n", quote(&rule.key));
    render_body(&mut out, fields, 1);
    out.push('}');
    Ok(out)
}

fn render_body(out: &mut String, fields: &[Entry], depth: usize) {
    let indent = INDENT.repeat(depth);
    for field in fields {
        match &field.value {
            Value::Str(value) => {
                out.push_str(&format!("{indent}{} = {}\n", render_key(&field.key), quote(value)));
            }
            Value::Object(nested) => {
                out.push_str(&format!("{indent}{} {{\n", render_key(&field.key)));
                render_body(out, nested, depth + 1);
                out.push_str(&format!("{indent}}}\n"));
            }
        }
    }
}

fn render_key(key: &str) -> String {
    if is_bare_identifier(key) {
        key.to_owned()
    } else {
        quote(key)
    }
}

fn translation_error(err: DecodeError) -> AclError {
    AclError::Translation {
        reason: err.to_string(),
    }
}
