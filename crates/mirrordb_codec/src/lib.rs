//! # MirrorDB Codec
//!
//! The JSON document convention for MirrorDB record files.
//!
//! Each record persists as one pretty-printed UTF-8 JSON file whose body
//! is the record's own fields merged with two reserved fields:
//!
//! - [`KEY_FIELD`] (`__key__`) — the original, unsanitized key;
//! - [`CHANGES_FIELD`] (`__changes__`) — the serialized change history,
//!   present only when change persistence is enabled.
//!
//! The file name is derived from the key by [`sanitize_key`]: lowercase,
//! with `/ \ : space . ! ? & ; |` each replaced by `_`, suffixed `.json`.
//!
//! ## Usage
//!
//! ```
//! use mirrordb_codec::{decode_document, encode_document, file_name};
//! use serde_json::{json, Value};
//!
//! let Value::Object(body) = json!({"name": "x"}) else { unreachable!() };
//! let text = encode_document("Test://1?", &body, None, false).unwrap();
//!
//! assert_eq!(file_name("Test://1?"), "test___1_.json");
//! let doc = decode_document(&text).unwrap();
//! assert_eq!(doc.key, "Test://1?");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod sanitize;

pub use document::{decode_document, encode_document, Document, CHANGES_FIELD, KEY_FIELD};
pub use error::{CodecError, CodecResult};
pub use sanitize::{file_name, sanitize_key};
