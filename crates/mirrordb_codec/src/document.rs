//! Encoding and decoding of record documents.
//!
//! A record file holds the record's own fields merged with two reserved
//! fields: `__key__` (always present, the original unsanitized key) and
//! `__changes__` (present only when change persistence is enabled).

use crate::error::{CodecError, CodecResult};
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Reserved field holding the record's original key.
pub const KEY_FIELD: &str = "__key__";

/// Reserved field holding the record's persisted change history.
pub const CHANGES_FIELD: &str = "__changes__";

/// Decoded form of one record file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The original, unsanitized key.
    pub key: String,
    /// The record's own fields, with reserved fields stripped.
    pub body: Map<String, Value>,
    /// Raw change entries, most recent first. Empty when the file carries
    /// no history.
    pub changes: Vec<Value>,
}

/// Encodes a record body into the persisted document text.
///
/// The body is merged with [`KEY_FIELD`] and, when `changes` is supplied,
/// [`CHANGES_FIELD`]. Output is pretty-printed with 2-space indentation.
/// With `ensure_ascii`, every non-ASCII character is escaped as `\uXXXX`
/// (surrogate pairs above the BMP).
pub fn encode_document(
    key: &str,
    body: &Map<String, Value>,
    changes: Option<&[Value]>,
    ensure_ascii: bool,
) -> CodecResult<String> {
    let mut doc = body.clone();
    doc.insert(KEY_FIELD.to_owned(), Value::String(key.to_owned()));
    if let Some(changes) = changes {
        doc.insert(CHANGES_FIELD.to_owned(), Value::Array(changes.to_vec()));
    }

    let text = serde_json::to_string_pretty(&Value::Object(doc))?;
    if ensure_ascii {
        Ok(escape_non_ascii(&text))
    } else {
        Ok(text)
    }
}

/// Decodes persisted document text back into a [`Document`].
///
/// The root must be a JSON object with a string [`KEY_FIELD`]; both
/// reserved fields are stripped from the returned body.
pub fn decode_document(text: &str) -> CodecResult<Document> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut body) = value else {
        return Err(CodecError::NotAnObject);
    };

    let key = match body.remove(KEY_FIELD) {
        Some(Value::String(key)) => key,
        Some(_) | None => return Err(CodecError::MissingKey),
    };

    let changes = match body.remove(CHANGES_FIELD) {
        Some(Value::Array(changes)) => changes,
        Some(_) => {
            return Err(CodecError::invalid_reserved_field(
                CHANGES_FIELD,
                "expected an array",
            ))
        }
        None => Vec::new(),
    };

    Ok(Document { key, body, changes })
}

/// Escapes every non-ASCII character in already-serialized JSON text.
///
/// Non-ASCII characters only occur inside string literals in JSON, so a
/// character-level pass over the whole text is safe.
fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_body() -> Map<String, Value> {
        let Value::Object(map) = json!({"name": "x", "age": 3}) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn encode_merges_key_field() {
        let text = encode_document("a", &sample_body(), None, false).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"__key__": "a", "name": "x", "age": 3}));
    }

    #[test]
    fn encode_is_pretty_printed() {
        let text = encode_document("a", &sample_body(), None, false).unwrap();
        assert!(text.contains("\n  \"name\": \"x\""));
    }

    #[test]
    fn encode_includes_changes_only_when_given() {
        let changes = vec![json!({"kind": "ADD"})];
        let with = encode_document("a", &sample_body(), Some(&changes), false).unwrap();
        let without = encode_document("a", &sample_body(), None, false).unwrap();
        assert!(with.contains(CHANGES_FIELD));
        assert!(!without.contains(CHANGES_FIELD));
    }

    #[test]
    fn decode_round_trips() {
        let changes = vec![json!({"kind": "ADD", "key": "a"})];
        let text = encode_document("Test://1?", &sample_body(), Some(&changes), false).unwrap();
        let doc = decode_document(&text).unwrap();
        assert_eq!(doc.key, "Test://1?");
        assert_eq!(doc.body, sample_body());
        assert_eq!(doc.changes, changes);
    }

    #[test]
    fn decode_rejects_missing_key() {
        let err = decode_document(r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, CodecError::MissingKey));
    }

    #[test]
    fn decode_rejects_non_string_key() {
        let err = decode_document(r#"{"__key__": 7}"#).unwrap_err();
        assert!(matches!(err, CodecError::MissingKey));
    }

    #[test]
    fn decode_rejects_non_object_root() {
        let err = decode_document("[1, 2]").unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject));
    }

    #[test]
    fn decode_rejects_malformed_changes() {
        let err = decode_document(r#"{"__key__": "a", "__changes__": 5}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidReservedField { .. }));
    }

    #[test]
    fn ensure_ascii_escapes_output() {
        let Value::Object(body) = json!({"name": "ÿüβ"}) else {
            unreachable!()
        };
        let text = encode_document("a", &body, None, true).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("\\u00ff\\u00fc\\u03b2"));

        let doc = decode_document(&text).unwrap();
        assert_eq!(doc.body.get("name"), Some(&json!("ÿüβ")));
    }

    #[test]
    fn ensure_ascii_uses_surrogate_pairs() {
        let Value::Object(body) = json!({"emoji": "🦀"}) else {
            unreachable!()
        };
        let text = encode_document("a", &body, None, true).unwrap();
        assert!(text.contains("\\ud83e\\udd80"));
        let doc = decode_document(&text).unwrap();
        assert_eq!(doc.body.get("emoji"), Some(&json!("🦀")));
    }

    proptest! {
        #[test]
        fn escaped_text_parses_to_the_same_document(name in "\\PC*") {
            let mut body = Map::new();
            body.insert("name".to_owned(), Value::String(name));
            let escaped = encode_document("k", &body, None, true).unwrap();
            prop_assert!(escaped.is_ascii());
            let doc = decode_document(&escaped).unwrap();
            prop_assert_eq!(doc.body, body);
        }
    }
}
