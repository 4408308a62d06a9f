//! The store-wide change log.

use crate::change::Change;
use std::collections::VecDeque;

/// Default number of entries kept in a store's global log.
pub const DEFAULT_LOG_HISTORY: usize = 10_000;

/// A bounded, most-recent-first log of [`Change`] entries.
///
/// The log is an audit sink: the store mirrors every accepted mutation
/// into it, trimming the oldest entries past the capacity. Callers may
/// periodically [`drain`](ChangeLog::drain) it to persist the history
/// elsewhere. A capacity of `0` disables trimming.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: VecDeque<Change>,
    capacity: usize,
}

impl ChangeLog {
    /// Creates an empty log with the given capacity (`0` = unbounded).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Pushes a new entry at the front, trimming the oldest entries past
    /// the capacity.
    pub fn push(&mut self, change: Change) {
        self.entries.push_front(change);
        if self.capacity > 0 && self.entries.len() > self.capacity {
            self.entries.truncate(self.capacity);
        }
    }

    /// Iterates entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.entries.iter()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns all entries, most recent first.
    pub fn drain(&mut self) -> Vec<Change> {
        self.entries.drain(..).collect()
    }

    /// Discards all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(n: usize) -> Change {
        Change::update("k", "f", json!(n), json!(n + 1))
    }

    #[test]
    fn most_recent_first() {
        let mut log = ChangeLog::new(0);
        log.push(entry(1));
        log.push(entry(2));

        let prevs: Vec<_> = log
            .iter()
            .map(|c| match &c.op {
                crate::ChangeOp::Update { prev, .. } => prev.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(prevs, vec![json!(2), json!(1)]);
    }

    #[test]
    fn capacity_trims_oldest() {
        let mut log = ChangeLog::new(3);
        for n in 0..5 {
            log.push(entry(n));
        }
        assert_eq!(log.len(), 3);
        // Entries 4, 3, 2 remain; 0 and 1 were trimmed.
        let kept: Vec<_> = log
            .iter()
            .map(|c| match &c.op {
                crate::ChangeOp::Update { prev, .. } => prev.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(kept, vec![json!(4), json!(3), json!(2)]);
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut log = ChangeLog::new(0);
        for n in 0..100 {
            log.push(entry(n));
        }
        assert_eq!(log.len(), 100);
    }

    #[test]
    fn drain_empties_the_log() {
        let mut log = ChangeLog::new(0);
        log.push(entry(1));
        log.push(entry(2));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }
}
