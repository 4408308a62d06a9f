//! The per-record wrapper.

use crate::change::Change;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;

/// Wrapper owning exactly one record, bookkeeping its mutations.
///
/// Every field write goes through [`update_field`](Proxy::update_field):
/// writing a field to its current value is a no-op; an accepted write
/// marks the proxy dirty and prepends an immutable [`Change`] to the
/// local log (most recent first). The dirty flag is true exactly when
/// the proxy holds mutations not yet flushed to disk.
///
/// Reads go straight to the record: a proxy derefs to `&T`. There is no
/// mutable access to the record outside the gateway; store-coupled
/// behavior (autosave, hook dispatch, undo of adds and deletes) lives on
/// [`Store`](crate::Store) methods that operate on the proxy.
pub struct Proxy<T: Record> {
    key: String,
    record: T,
    dirty: bool,
    changes: VecDeque<Change>,
}

impl<T: Record> Proxy<T> {
    pub(crate) fn new(key: String, record: T) -> Self {
        Self {
            key,
            record,
            dirty: false,
            changes: VecDeque::new(),
        }
    }

    /// The record's key within its store.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Shared access to the owned record.
    #[must_use]
    pub fn record(&self) -> &T {
        &self.record
    }

    /// True when the proxy holds mutations not yet flushed to disk.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Iterates the local change log, most recent first.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Number of entries in the local change log.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// The single mutation gateway.
    ///
    /// Returns `Ok(None)` without touching anything when the field
    /// already holds `value` (by JSON value equality). Otherwise assigns
    /// the value, marks the proxy dirty, and returns the logged
    /// [`Change`]. The caller mirrors the change into the store-wide log
    /// and drives autosave and notification.
    pub(crate) fn update_field(&mut self, name: &str, value: Value) -> StoreResult<Option<Change>> {
        let prev = self
            .record
            .field(name)?
            .ok_or_else(|| StoreError::unknown_field(name))?;
        if prev == value {
            return Ok(None);
        }

        self.record.set_field(name, value.clone())?;
        self.dirty = true;
        tracing::debug!(key = %self.key, field = name, "field updated");

        let change = Change::update(self.key.clone(), name, prev, value);
        self.changes.push_front(change.clone());
        Ok(Some(change))
    }

    /// Applies the inverse of an update without logging a fresh change.
    ///
    /// Undo must not re-enter the gateway: a logged revert would land at
    /// the front of the log and break LIFO undo ordering.
    pub(crate) fn undo_update(&mut self, field: &str, prev: Value) -> StoreResult<()> {
        self.record.set_field(field, prev)?;
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn push_change(&mut self, change: Change) {
        self.changes.push_front(change);
    }

    pub(crate) fn pop_change(&mut self) -> Option<Change> {
        self.changes.pop_front()
    }

    pub(crate) fn set_changes(&mut self, changes: Vec<Change>) {
        self.changes = VecDeque::from(changes);
    }
}

impl<T: Record> Deref for Proxy<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T: Record + fmt::Debug> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("key", &self.key)
            .field("dirty", &self.dirty)
            .field("changes", &self.changes.len())
            .field("record", &self.record)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeKind, ChangeOp};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        age: u32,
    }

    fn proxy() -> Proxy<Sample> {
        Proxy::new(
            "s1".to_owned(),
            Sample {
                name: "test".to_owned(),
                age: 1,
            },
        )
    }

    #[test]
    fn update_assigns_and_logs() {
        let mut proxy = proxy();
        let change = proxy.update_field("name", json!("other")).unwrap().unwrap();

        assert_eq!(proxy.name, "other");
        assert!(proxy.is_dirty());
        assert_eq!(change.kind(), ChangeKind::Update);
        assert_eq!(proxy.change_count(), 1);
    }

    #[test]
    fn equal_value_is_a_no_op() {
        let mut proxy = proxy();
        let change = proxy.update_field("name", json!("test")).unwrap();

        assert!(change.is_none());
        assert!(!proxy.is_dirty());
        assert_eq!(proxy.change_count(), 0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut proxy = proxy();
        let err = proxy.update_field("missing", json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { .. }));
        assert!(!proxy.is_dirty());
    }

    #[test]
    fn log_is_most_recent_first() {
        let mut proxy = proxy();
        proxy.update_field("age", json!(2)).unwrap();
        proxy.update_field("age", json!(3)).unwrap();

        let news: Vec<_> = proxy
            .changes()
            .map(|c| match &c.op {
                ChangeOp::Update { new, .. } => new.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(news, vec![json!(3), json!(2)]);
    }

    #[test]
    fn undo_update_does_not_log() {
        let mut proxy = proxy();
        proxy.update_field("age", json!(2)).unwrap();
        let before = proxy.change_count();

        proxy.undo_update("age", json!(1)).unwrap();
        assert_eq!(proxy.age, 1);
        assert_eq!(proxy.change_count(), before);
        assert!(proxy.is_dirty());
    }

    #[test]
    fn deref_reads_the_record() {
        let proxy = proxy();
        assert_eq!(proxy.name, "test");
        assert_eq!(proxy.record().age, 1);
    }
}
