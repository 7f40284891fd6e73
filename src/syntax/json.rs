//! Order-preserving JSON decoder.
//!
//! `serde_json::Value` sorts object keys, which would scramble translation
//! output, so objects are collected through a visitor into ordered entries.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use super::{DecodeError, Entry, Value};
use crate::types::options::BOM;

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, an object, or an array of objects")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Value, E> {
        Ok(Value::Str(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Value, E> {
        Ok(Value::Str(value))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value::<Value>()?;
            entries.push(Entry::new(key, value, None));
        }
        Ok(Value::Object(entries))
    }

    // HCL JSON allows `"key": [{..}, {..}]` in place of a single object.
    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            match item {
                Value::Object(items) => entries.extend(items),
                Value::Str(_) => {
                    return Err(de::Error::custom("arrays may only contain objects"));
                }
            }
        }
        Ok(Value::Object(entries))
    }
}

pub(crate) fn decode(source: &str) -> Result<Vec<Entry>, DecodeError> {
    let value: Value = serde_json::from_str(source.trim_start_matches(BOM)).map_err(|err| {
        let line = (err.line() > 0).then_some(err.line());
        DecodeError::new(line, err.to_string())
    })?;
    match value {
        Value::Object(entries) => Ok(entries),
        other => Err(DecodeError::new(
            Some(1),
            format!("top-level JSON value must be an object, found {}", other.kind_label()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_key_order() {
        let entries = decode(r#"{"zeta": "read", "alpha": {"b": {"policy": "x"}, "a": {}}}"#)
            .unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        let Value::Object(inner) = &entries[1].value else {
            panic!("expected object");
        };
        let inner_keys: Vec<&str> = inner.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(inner_keys, ["b", "a"]);
    }

    #[test]
    fn keeps_duplicate_keys() {
        let entries = decode(r#"{"key": {"a": {}}, "key": {"b": {}}}"#).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn flattens_arrays_of_objects() {
        let entries = decode(r#"{"node": [{"a": {"policy": "read"}}, {"b": {"policy": "deny"}}]}"#)
            .unwrap();
        let Value::Object(rules) = &entries[0].value else {
            panic!("expected object");
        };
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].key, "b");
    }

    #[test]
    fn rejects_non_string_scalars() {
        assert!(decode(r#"{"keyring": true}"#).is_err());
        assert!(decode(r#"{"node": [1]}"#).is_err());
    }

    #[test]
    fn rejects_non_object_document() {
        let err = decode(r#""read""#).unwrap_err();
        assert!(err.reason.contains("must be an object"));
    }

    #[test]
    fn reports_line_of_malformed_json() {
        let err = decode("{\n  \"key\": {\n    \"\": {\"policy\": \"read\"\n  }\n").unwrap_err();
        assert!(err.line.is_some());
    }
}
