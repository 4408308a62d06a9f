//! Immutable change entries.
//!
//! Every accepted mutation produces one [`Change`]: a field update with
//! its previous and new value, or a record addition/deletion with a full
//! snapshot. Entries are never edited after construction; undo applies
//! the inverse operation to the record instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

/// The kind of mutation a [`Change`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A record was added under a new key.
    Add,
    /// One field of an existing record was updated.
    Update,
    /// A record was deleted.
    Delete,
}

/// The kind-specific payload of a [`Change`].
///
/// The serialized form is flat and tagged by `kind`, matching the
/// persisted change-history format: an update carries `prop_name`,
/// `prev_val` and `new_val`; an add or delete carries the affected
/// record snapshot as `model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChangeOp {
    /// One field changed value.
    #[serde(rename = "UPDATE")]
    Update {
        /// Name of the changed field.
        #[serde(rename = "prop_name")]
        field: String,
        /// Value before the change.
        #[serde(rename = "prev_val")]
        prev: Value,
        /// Value after the change.
        #[serde(rename = "new_val")]
        new: Value,
    },
    /// A record was added.
    #[serde(rename = "ADD")]
    Add {
        /// Snapshot of the added record.
        #[serde(rename = "model")]
        snapshot: Value,
    },
    /// A record was deleted.
    #[serde(rename = "DELETE")]
    Delete {
        /// Snapshot of the record at deletion time.
        #[serde(rename = "model")]
        snapshot: Value,
    },
}

/// An immutable record of one mutation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Key of the affected record.
    pub key: String,
    /// When the mutation happened (serialized as ISO-8601).
    #[serde(rename = "date")]
    pub at: DateTime<Utc>,
    /// The kind-specific payload.
    #[serde(flatten)]
    pub op: ChangeOp,
}

impl Change {
    /// Creates an update entry for one field.
    pub fn update(key: impl Into<String>, field: impl Into<String>, prev: Value, new: Value) -> Self {
        Self {
            key: key.into(),
            at: Utc::now(),
            op: ChangeOp::Update {
                field: field.into(),
                prev,
                new,
            },
        }
    }

    /// Creates an addition entry with the added record's snapshot.
    pub fn add(key: impl Into<String>, snapshot: Value) -> Self {
        Self {
            key: key.into(),
            at: Utc::now(),
            op: ChangeOp::Add { snapshot },
        }
    }

    /// Creates a deletion entry with the deleted record's snapshot.
    pub fn delete(key: impl Into<String>, snapshot: Value) -> Self {
        Self {
            key: key.into(),
            at: Utc::now(),
            op: ChangeOp::Delete { snapshot },
        }
    }

    /// Returns which kind of mutation this entry records.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self.op {
            ChangeOp::Update { .. } => ChangeKind::Update,
            ChangeOp::Add { .. } => ChangeKind::Add,
            ChangeOp::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// Serializes this entry to its persisted JSON form.
    pub fn to_value(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserializes an entry from its persisted JSON form.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
