//! # MirrorDB Core
//!
//! A mutation-tracking persistence layer that mirrors a collection of
//! keyed records as one JSON file per record.
//!
//! This crate provides:
//! - [`Store`] — the key→record mapping, directory persistence, queries,
//!   and change-hook dispatch
//! - [`Proxy`] — the per-record wrapper with dirty tracking and a local
//!   change log
//! - [`Change`] — immutable entries describing each add/update/delete,
//!   with bounded undo via [`Store::reset`]
//! - [`Record`] — the field-access seam any serde type gets for free
//!
//! # Usage
//!
//! ```rust,ignore
//! use mirrordb_core::{FieldPatch, Store};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let mut store: Store<User> = Store::open("users")?;
//!
//! // Every accepted mutation is tracked and (by default) persisted
//! // immediately.
//! store.insert("u1", User { name: "x".into(), age: 3 })?;
//! store.patch("u1", FieldPatch::new().with("age", 4))?;
//!
//! // Undo the most recent change.
//! store.reset("u1", 1)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod config;
mod error;
mod log;
mod proxy;
mod record;
mod store;

pub use change::{Change, ChangeKind, ChangeOp};
pub use config::{Config, KeySelector};
pub use error::{StoreError, StoreResult};
pub use log::{ChangeLog, DEFAULT_LOG_HISTORY};
pub use proxy::Proxy;
pub use record::{FieldPatch, Record};
pub use store::{ChangeHook, HookId, Store};

pub use mirrordb_codec::{file_name, sanitize_key, CHANGES_FIELD, KEY_FIELD};

// Re-export the value types records diff and patch with.
pub use serde_json::{json, Map as JsonMap, Value as JsonValue};
