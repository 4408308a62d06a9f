//! The store: key→proxy mapping, persistence, and change notification.

use crate::change::{Change, ChangeOp};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::log::ChangeLog;
use crate::proxy::Proxy;
use crate::record::{FieldPatch, Record};
use mirrordb_codec::{decode_document, encode_document, file_name, KEY_FIELD};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::slice;

/// Observer invoked synchronously with each mutation batch.
pub type ChangeHook<T> = Box<dyn FnMut(&Proxy<T>, &[Change])>;

/// Token identifying a registered change hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId(u64);

struct HookEntry<T: Record> {
    id: u64,
    hook: ChangeHook<T>,
}

/// A directory-backed collection of keyed records with mutation tracking.
///
/// The store owns one [`Proxy`] per key, a bounded store-wide change log,
/// and a registry of change hooks. Each record mirrors to one JSON file
/// in the store's directory; with `save_on_change` (the default), every
/// accepted mutation re-persists the affected record immediately.
///
/// Exactly one logical owner mutates a store at a time: all operations
/// take `&mut self` and run synchronously. There is no multi-key
/// atomicity and no crash-safe rename — a crash mid-write can truncate
/// the one file being written.
///
/// # Example
///
/// ```rust,ignore
/// use mirrordb_core::Store;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// let mut store: Store<User> = Store::open("users")?;
/// store.insert("u1", User { name: "x".into(), age: 3 })?;
/// store.set_field("u1", "age", json!(4))?;
/// store.reset("u1", 1)?; // undo the age change
/// ```
pub struct Store<T: Record> {
    dir: PathBuf,
    config: Config<T>,
    entries: BTreeMap<String, Proxy<T>>,
    log: ChangeLog,
    hooks: Vec<HookEntry<T>>,
    next_hook_id: u64,
    loaded: bool,
}

impl<T: Record> Store<T> {
    /// Opens a store over a directory with the default configuration.
    ///
    /// The directory is created if missing. With `load_on_start` (the
    /// default) every record file is loaded eagerly; otherwise the first
    /// operation triggers the load.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with_config(dir, Config::default())
    }

    /// Opens a store over a directory with a custom configuration.
    pub fn open_with_config(dir: impl Into<PathBuf>, config: Config<T>) -> StoreResult<Self> {
        let mut store = Self {
            dir: dir.into(),
            log: ChangeLog::new(config.max_log_history),
            config,
            entries: BTreeMap::new(),
            hooks: Vec::new(),
            next_hook_id: 0,
            loaded: false,
        };
        if store.config.load_on_start {
            store.load()?;
        }
        Ok(store)
    }

    /// The directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The store's configuration.
    #[must_use]
    pub fn config(&self) -> &Config<T> {
        &self.config
    }

    /// True once the directory has been loaded into memory.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of records currently held in memory.
    ///
    /// Reports in-memory state without forcing a load.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no records are held in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_loaded(&mut self) -> StoreResult<()> {
        if !self.loaded {
            self.load()?;
        }
        Ok(())
    }

    /// Loads the backing directory, replacing all in-memory state.
    ///
    /// The directory is created if missing. Every `*.json` file is
    /// decoded through the codec; a file that fails to decode is logged
    /// and skipped, and the load continues with the remaining files.
    /// Change history is rehydrated only with `load_changes_from_file`.
    pub fn load(&mut self) -> StoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        self.entries.clear();
        self.log.clear();
        self.loaded = false;

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            match decode_file::<T>(&text, self.config.load_changes_from_file) {
                Ok(proxy) => {
                    self.entries.insert(proxy.key().to_owned(), proxy);
                }
                Err(err) => {
                    tracing::warn!(
                        file = %path.display(),
                        error = %err,
                        "skipping unreadable record file"
                    );
                }
            }
        }
        self.loaded = true;
        tracing::debug!(
            dir = %self.dir.display(),
            records = self.entries.len(),
            "store loaded"
        );
        Ok(())
    }

    /// Removes the backing directory tree and resets in-memory state.
    ///
    /// Hooks stay registered; the store transitions back to unloaded.
    pub fn clear(&mut self) -> StoreResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        self.entries.clear();
        self.log.clear();
        self.loaded = false;
        Ok(())
    }

    /// Looks up the proxy for a key.
    pub fn get(&mut self, key: &str) -> StoreResult<Option<&Proxy<T>>> {
        self.ensure_loaded()?;
        Ok(self.entries.get(key))
    }

    /// Looks up the raw record for a key.
    pub fn get_record(&mut self, key: &str) -> StoreResult<Option<&T>> {
        self.ensure_loaded()?;
        Ok(self.entries.get(key).map(Proxy::record))
    }

    /// True when a record with this key is held.
    pub fn contains_key(&mut self, key: &str) -> StoreResult<bool> {
        self.ensure_loaded()?;
        Ok(self.entries.contains_key(key))
    }

    /// Iterates all keys in map order.
    pub fn keys(&mut self) -> StoreResult<impl Iterator<Item = &str>> {
        self.ensure_loaded()?;
        Ok(self.entries.keys().map(String::as_str))
    }

    /// Iterates all proxies in map order.
    pub fn values(&mut self) -> StoreResult<impl Iterator<Item = &Proxy<T>>> {
        self.ensure_loaded()?;
        Ok(self.entries.values())
    }

    /// Iterates all raw records in map order.
    pub fn records(&mut self) -> StoreResult<impl Iterator<Item = &T>> {
        self.ensure_loaded()?;
        Ok(self.entries.values().map(Proxy::record))
    }

    /// Linear scan yielding proxies whose record satisfies the predicate.
    pub fn filter<P>(&mut self, predicate: P) -> StoreResult<impl Iterator<Item = &Proxy<T>>>
    where
        P: Fn(&T) -> bool,
    {
        self.ensure_loaded()?;
        Ok(self
            .entries
            .values()
            .filter(move |proxy| predicate(proxy.record())))
    }

    /// Linear scan returning the first proxy whose record satisfies the
    /// predicate.
    pub fn first<P>(&mut self, predicate: P) -> StoreResult<Option<&Proxy<T>>>
    where
        P: Fn(&T) -> bool,
    {
        self.ensure_loaded()?;
        Ok(self
            .entries
            .values()
            .find(|proxy| predicate(proxy.record())))
    }

    /// Inserts a record under a new key.
    ///
    /// The proxy starts dirty, an Add entry is logged locally and
    /// store-wide, hooks fire with the single-entry batch, and the record
    /// is committed immediately under `save_on_change`.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] when the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, record: T) -> StoreResult<&Proxy<T>> {
        self.ensure_loaded()?;
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(StoreError::duplicate_key(key));
        }

        let snapshot = serde_json::to_value(&record)?;
        let mut proxy = Proxy::new(key.clone(), record);
        proxy.mark_dirty();
        let change = Change::add(key.clone(), snapshot);
        proxy.push_change(change.clone());
        self.log.push(change.clone());

        let proxy = self.entries.entry(key).or_insert(proxy);
        if self.config.save_on_change {
            commit_proxy(&self.dir, &self.config, proxy)?;
        }
        dispatch(&mut self.hooks, proxy, slice::from_ref(&change));
        Ok(proxy)
    }

    /// Inserts under a new key or replaces an existing record by diff.
    ///
    /// Dispatches purely on key presence: absent keys go through
    /// [`insert`](Store::insert), present keys through the field-level
    /// diff of [`replace`](Store::replace). Upserting a value equal to
    /// the current record changes nothing.
    pub fn upsert(&mut self, key: impl Into<String>, record: T) -> StoreResult<&Proxy<T>> {
        self.ensure_loaded()?;
        let key = key.into();
        let unchanged = match self.entries.get(&key) {
            None => return self.insert(key, record),
            Some(existing) => existing.record() == &record,
        };
        if !unchanged {
            let fields = record.fields()?;
            self.apply_fields(&key, fields)?;
        }
        self.entries
            .get(&key)
            .ok_or_else(|| StoreError::key_not_found(&key))
    }

    /// Replaces an existing record with a full new value.
    ///
    /// Computes the field-level diff between the current record and the
    /// replacement; each differing field flows through the mutation
    /// gateway with per-field notification suppressed, then hooks fire
    /// once with the aggregated batch. Under `save_on_change` the record
    /// commits once for the whole batch.
    ///
    /// # Errors
    ///
    /// [`StoreError::KeyNotFound`] when the key is absent.
    pub fn replace(&mut self, key: &str, record: T) -> StoreResult<Vec<Change>> {
        self.ensure_loaded()?;
        if !self.entries.contains_key(key) {
            return Err(StoreError::key_not_found(key));
        }
        let fields = record.fields()?;
        self.apply_fields(key, fields)
    }

    /// Applies a partial field map to an existing record.
    ///
    /// Same batching contract as [`replace`](Store::replace); naming a
    /// field the record does not have is an error.
    pub fn patch(&mut self, key: &str, patch: FieldPatch) -> StoreResult<Vec<Change>> {
        self.ensure_loaded()?;
        if !self.entries.contains_key(key) {
            return Err(StoreError::key_not_found(key));
        }
        self.apply_fields(key, patch.into_fields())
    }

    /// Writes one field of an existing record through the gateway.
    ///
    /// Returns `Ok(None)` when the field already holds the value; an
    /// accepted write notifies hooks with a single-entry batch and
    /// commits under `save_on_change`.
    pub fn set_field(&mut self, key: &str, field: &str, value: Value) -> StoreResult<Option<Change>> {
        self.ensure_loaded()?;
        let Some(proxy) = self.entries.get_mut(key) else {
            return Err(StoreError::key_not_found(key));
        };
        let Some(change) = proxy.update_field(field, value)? else {
            return Ok(None);
        };
        self.log.push(change.clone());
        if self.config.save_on_change {
            commit_proxy(&self.dir, &self.config, proxy)?;
        }
        dispatch(&mut self.hooks, proxy, slice::from_ref(&change));
        Ok(Some(change))
    }

    /// Runs a domain operation against a record and applies the field
    /// changes it returns.
    ///
    /// The closure reads the current record and describes its intended
    /// writes as a [`FieldPatch`]; the store applies and logs them as one
    /// tracked, batched mutation. This is how behaviors defined on the
    /// record participate in tracking.
    pub fn apply<F>(&mut self, key: &str, op: F) -> StoreResult<Vec<Change>>
    where
        F: FnOnce(&T) -> FieldPatch,
    {
        self.ensure_loaded()?;
        let Some(proxy) = self.entries.get(key) else {
            return Err(StoreError::key_not_found(key));
        };
        let patch = op(proxy.record());
        self.apply_fields(key, patch.into_fields())
    }

    /// Applies a patch-producing operation to every record matching the
    /// predicate. Returns all changes produced.
    pub fn update_where<P, F>(&mut self, predicate: P, op: F) -> StoreResult<Vec<Change>>
    where
        P: Fn(&T) -> bool,
        F: Fn(&T) -> FieldPatch,
    {
        self.ensure_loaded()?;
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, proxy)| predicate(proxy.record()))
            .map(|(key, _)| key.clone())
            .collect();

        let mut batch = Vec::new();
        for key in keys {
            batch.extend(self.apply(&key, &op)?);
        }
        Ok(batch)
    }

    /// Upserts a record under a key derived by [`key_for`](Store::key_for).
    pub fn set(&mut self, record: T) -> StoreResult<&Proxy<T>> {
        self.ensure_loaded()?;
        let key = self.key_for(&record, None)?;
        self.upsert(key, record)
    }

    /// Inserts a record under a derived key, failing if the key exists.
    pub fn create(&mut self, record: T) -> StoreResult<&Proxy<T>> {
        self.ensure_loaded()?;
        let key = self.key_for(&record, None)?;
        if self.entries.contains_key(&key) {
            return Err(StoreError::duplicate_key(key));
        }
        self.insert(key, record)
    }

    /// Bulk upsert with per-item autosave suppressed; dirty records are
    /// committed in one pass at the end (under `save_on_change`).
    pub fn insert_many<I>(&mut self, pairs: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (String, T)>,
    {
        self.ensure_loaded()?;
        let autosave = self.config.save_on_change;
        self.config.save_on_change = false;

        let mut outcome: StoreResult<()> = Ok(());
        for (key, record) in pairs {
            if let Err(err) = self.upsert(key, record) {
                outcome = Err(err);
                break;
            }
        }
        self.config.save_on_change = autosave;
        outcome?;

        if autosave {
            self.commit_all()?;
        }
        Ok(())
    }

    /// Deletes a record and its backing file.
    ///
    /// Returns `Ok(false)` when the key is absent. A Delete entry (with
    /// the record snapshot) is logged store-wide and hooks fire with the
    /// detached proxy.
    pub fn delete(&mut self, key: &str) -> StoreResult<bool> {
        self.ensure_loaded()?;
        let Some(mut proxy) = self.entries.remove(key) else {
            return Ok(false);
        };

        let path = self.dir.join(file_name(key));
        if path.exists() {
            fs::remove_file(&path)?;
        }

        let snapshot = serde_json::to_value(proxy.record())?;
        let change = Change::delete(key.to_owned(), snapshot);
        proxy.mark_dirty();
        proxy.push_change(change.clone());
        self.log.push(change.clone());
        dispatch(&mut self.hooks, &proxy, slice::from_ref(&change));
        Ok(true)
    }

    /// Derives the key for a record.
    ///
    /// Precedence: the explicit `selector` argument, the configured
    /// `key_selector`, the record's `__key__` field, the record's `id`
    /// field. String fields are used verbatim; integer fields are
    /// stringified.
    ///
    /// # Errors
    ///
    /// [`StoreError::KeyDerivation`] when no source yields a key.
    pub fn key_for(
        &self,
        record: &T,
        selector: Option<&dyn Fn(&T) -> String>,
    ) -> StoreResult<String> {
        if let Some(selector) = selector {
            return Ok(selector(record));
        }
        if let Some(selector) = &self.config.key_selector {
            return Ok(selector(record));
        }
        let fields = record.fields()?;
        for name in [KEY_FIELD, "id"] {
            match fields.get(name) {
                Some(Value::String(key)) => return Ok(key.clone()),
                Some(Value::Number(number)) => return Ok(number.to_string()),
                _ => {}
            }
        }
        Err(StoreError::KeyDerivation)
    }

    /// Commits one record to its backing file if dirty.
    ///
    /// # Errors
    ///
    /// [`StoreError::ForeignProxy`] when this store does not own the key.
    pub fn commit(&mut self, key: &str) -> StoreResult<()> {
        self.ensure_loaded()?;
        let Some(proxy) = self.entries.get_mut(key) else {
            return Err(StoreError::foreign_proxy(key));
        };
        commit_proxy(&self.dir, &self.config, proxy)
    }

    /// Commits every dirty record.
    pub fn commit_all(&mut self) -> StoreResult<()> {
        self.ensure_loaded()?;
        for proxy in self.entries.values_mut() {
            commit_proxy(&self.dir, &self.config, proxy)?;
        }
        Ok(())
    }

    /// Undoes up to `count` of the most recent changes to one record.
    ///
    /// Entries pop from the front of the proxy's local log and are
    /// undone in order, stopping early when the log is exhausted — so
    /// after edits `m1` then `m2`, `reset(1)` restores the value `m1`
    /// set. Undoing a field update applies the previous value without
    /// logging; undoing an Add deletes the key; undoing a Delete
    /// re-inserts the snapshot. Returns the number of entries undone and
    /// commits afterward when anything was undone under `save_on_change`.
    pub fn reset(&mut self, key: &str, count: usize) -> StoreResult<usize> {
        self.ensure_loaded()?;
        if !self.entries.contains_key(key) {
            return Err(StoreError::key_not_found(key));
        }

        let mut undone = 0;
        while undone < count {
            let change = {
                let Some(proxy) = self.entries.get_mut(key) else {
                    break;
                };
                match proxy.pop_change() {
                    Some(change) => change,
                    None => break,
                }
            };
            undone += 1;
            match change.op {
                ChangeOp::Update { field, prev, .. } => {
                    if let Some(proxy) = self.entries.get_mut(key) {
                        proxy.undo_update(&field, prev)?;
                    }
                }
                ChangeOp::Add { .. } => {
                    self.delete(key)?;
                }
                ChangeOp::Delete { snapshot } => {
                    let record: T = serde_json::from_value(snapshot)?;
                    self.upsert(key.to_owned(), record)?;
                }
            }
        }

        if undone > 0 && self.config.save_on_change {
            if let Some(proxy) = self.entries.get_mut(key) {
                commit_proxy(&self.dir, &self.config, proxy)?;
            }
        }
        Ok(undone)
    }

    /// Re-applies one change: re-sets the field, re-adds the record, or
    /// re-deletes the key. The replay is tracked like any other mutation.
    pub fn reapply(&mut self, change: &Change) -> StoreResult<()> {
        self.ensure_loaded()?;
        match &change.op {
            ChangeOp::Update { field, new, .. } => {
                self.set_field(&change.key, field, new.clone())?;
            }
            ChangeOp::Add { snapshot } => {
                let record: T = serde_json::from_value(snapshot.clone())?;
                self.upsert(change.key.clone(), record)?;
            }
            ChangeOp::Delete { .. } => {
                self.delete(&change.key)?;
            }
        }
        Ok(())
    }

    /// Registers a change hook; returns its removal token.
    ///
    /// Hooks run synchronously in registration order with the full batch
    /// of each accepted mutation. They are never invoked with an empty
    /// batch.
    pub fn add_change_hook<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&Proxy<T>, &[Change]) + 'static,
    {
        let id = self.next_hook_id;
        self.next_hook_id += 1;
        self.hooks.push(HookEntry {
            id,
            hook: Box::new(hook),
        });
        HookId(id)
    }

    /// Removes a previously registered hook. Returns false when the
    /// token is unknown.
    pub fn remove_change_hook(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|entry| entry.id != id.0);
        self.hooks.len() != before
    }

    /// Removes every registered hook.
    pub fn clear_change_hooks(&mut self) {
        self.hooks.clear();
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Discards one record's local change history, bounding it explicitly.
    ///
    /// Entries already mirrored into the store-wide log are unaffected;
    /// the file's persisted history shrinks the next time the record
    /// commits. Undo is no longer possible past this point.
    pub fn clear_changes(&mut self, key: &str) -> StoreResult<()> {
        self.ensure_loaded()?;
        let Some(proxy) = self.entries.get_mut(key) else {
            return Err(StoreError::key_not_found(key));
        };
        proxy.clear_changes();
        Ok(())
    }

    /// Iterates the store-wide change log, most recent first.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.log.iter()
    }

    /// Number of entries in the store-wide change log.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.log.len()
    }

    /// Drains the store-wide change log, most recent first.
    pub fn drain_changes(&mut self) -> Vec<Change> {
        self.log.drain()
    }

    /// Runs a scoped session against the store.
    ///
    /// On a clean exit, all dirty records commit when `save_on_exit` is
    /// set; on an error exit the final commit is skipped. Either way the
    /// in-memory map is released and the store returns to unloaded.
    pub fn session<F, R>(&mut self, scope: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Self) -> StoreResult<R>,
    {
        self.ensure_loaded()?;
        match scope(self) {
            Ok(value) => {
                let committed = if self.config.save_on_exit {
                    self.commit_all()
                } else {
                    Ok(())
                };
                self.unload();
                committed?;
                Ok(value)
            }
            Err(err) => {
                self.unload();
                Err(err)
            }
        }
    }

    fn unload(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }

    /// Shared diff-and-assign path for replace/patch/apply/upsert.
    ///
    /// Per-field notification is suppressed; hooks fire once with the
    /// aggregated batch, and the record commits once for the whole batch.
    fn apply_fields(
        &mut self,
        key: &str,
        fields: serde_json::Map<String, Value>,
    ) -> StoreResult<Vec<Change>> {
        let Some(proxy) = self.entries.get_mut(key) else {
            return Err(StoreError::key_not_found(key));
        };

        let mut batch = Vec::new();
        for (name, value) in fields {
            if let Some(change) = proxy.update_field(&name, value)? {
                self.log.push(change.clone());
                batch.push(change);
            }
        }

        if !batch.is_empty() {
            if self.config.save_on_change {
                commit_proxy(&self.dir, &self.config, proxy)?;
            }
            dispatch(&mut self.hooks, proxy, &batch);
        }
        Ok(batch)
    }
}

/// Serializes one dirty proxy to its backing file and clears the flag.
fn commit_proxy<T: Record>(dir: &Path, config: &Config<T>, proxy: &mut Proxy<T>) -> StoreResult<()> {
    if !proxy.is_dirty() {
        return Ok(());
    }
    let body = proxy.record().fields()?;
    let changes = if config.save_changes_to_file {
        Some(
            proxy
                .changes()
                .map(Change::to_value)
                .collect::<StoreResult<Vec<_>>>()?,
        )
    } else {
        None
    };
    let text = encode_document(proxy.key(), &body, changes.as_deref(), config.ensure_ascii)?;
    // Whole-file overwrite: a crash mid-write can leave this one record
    // file truncated or absent.
    fs::write(dir.join(file_name(proxy.key())), text)?;
    proxy.set_clean();
    tracing::debug!(key = proxy.key(), "record committed");
    Ok(())
}

fn decode_file<T: Record>(text: &str, with_changes: bool) -> StoreResult<Proxy<T>> {
    let doc = decode_document(text)?;
    let record: T = serde_json::from_value(Value::Object(doc.body))?;
    let mut proxy = Proxy::new(doc.key, record);
    if with_changes {
        let changes = doc
            .changes
            .into_iter()
            .map(Change::from_value)
            .collect::<StoreResult<Vec<_>>>()?;
        proxy.set_changes(changes);
    }
    Ok(proxy)
}

fn dispatch<T: Record>(hooks: &mut [HookEntry<T>], proxy: &Proxy<T>, changes: &[Change]) {
    if changes.is_empty() {
        return;
    }
    for entry in hooks.iter_mut() {
        (entry.hook)(proxy, changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        age: u32,
    }

    fn sample(name: &str) -> Sample {
        Sample {
            name: name.to_owned(),
            age: 0,
        }
    }

    #[test]
    fn open_creates_the_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        let _store: Store<Sample> = Store::open(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn lazy_load_on_first_operation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        {
            let mut store: Store<Sample> = Store::open(&path).unwrap();
            store.insert("a", sample("x")).unwrap();
        }

        let config = Config::new().load_on_start(false);
        let mut store: Store<Sample> = Store::open_with_config(&path, config).unwrap();
        assert!(!store.is_loaded());
        assert!(store.contains_key("a").unwrap());
        assert!(store.is_loaded());
    }

    #[test]
    fn commit_of_unknown_key_is_foreign() {
        let dir = tempdir().unwrap();
        let mut store: Store<Sample> = Store::open(dir.path().join("store")).unwrap();
        let err = store.commit("ghost").unwrap_err();
        assert!(matches!(err, StoreError::ForeignProxy { .. }));
    }

    #[test]
    fn key_for_precedence() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Keyed {
            id: String,
            name: String,
        }

        let dir = tempdir().unwrap();
        let record = Keyed {
            id: "by-id".to_owned(),
            name: "by-name".to_owned(),
        };

        // Falls back to the id field.
        let store: Store<Keyed> = Store::open(dir.path().join("a")).unwrap();
        assert_eq!(store.key_for(&record, None).unwrap(), "by-id");

        // Configured selector beats the id field.
        let config = Config::new().key_selector(|record: &Keyed| record.name.clone());
        let store: Store<Keyed> = Store::open_with_config(dir.path().join("b"), config).unwrap();
        assert_eq!(store.key_for(&record, None).unwrap(), "by-name");

        // An explicit selector beats the configured one.
        let explicit = |_: &Keyed| "explicit".to_owned();
        assert_eq!(store.key_for(&record, Some(&explicit)).unwrap(), "explicit");
    }

    #[test]
    fn key_for_stringifies_numbers() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct NumId {
            id: u64,
        }

        let dir = tempdir().unwrap();
        let store: Store<NumId> = Store::open(dir.path().join("store")).unwrap();
        assert_eq!(store.key_for(&NumId { id: 42 }, None).unwrap(), "42");
    }

    #[test]
    fn key_for_fails_without_a_source() {
        let dir = tempdir().unwrap();
        let store: Store<Sample> = Store::open(dir.path().join("store")).unwrap();
        let err = store.key_for(&sample("x"), None).unwrap_err();
        assert!(matches!(err, StoreError::KeyDerivation));
    }

    #[test]
    fn hooks_register_and_remove() {
        let dir = tempdir().unwrap();
        let mut store: Store<Sample> = Store::open(dir.path().join("store")).unwrap();

        let first = store.add_change_hook(|_, _| {});
        let second = store.add_change_hook(|_, _| {});
        assert_eq!(store.hook_count(), 2);

        assert!(store.remove_change_hook(first));
        assert!(!store.remove_change_hook(first));
        assert_eq!(store.hook_count(), 1);

        store.clear_change_hooks();
        assert_eq!(store.hook_count(), 0);
        let _ = second;
    }

    #[test]
    fn global_log_is_bounded() {
        let dir = tempdir().unwrap();
        let config = Config::new().max_log_history(3).save_on_change(false);
        let mut store: Store<Sample> =
            Store::open_with_config(dir.path().join("store"), config).unwrap();

        store.insert("a", sample("v0")).unwrap();
        for n in 1..=5 {
            store.set_field("a", "name", json!(format!("v{n}"))).unwrap();
        }
        assert_eq!(store.change_count(), 3);
    }

    #[test]
    fn drain_empties_the_global_log() {
        let dir = tempdir().unwrap();
        let mut store: Store<Sample> = Store::open(dir.path().join("store")).unwrap();
        store.insert("a", sample("x")).unwrap();
        store.set_field("a", "name", json!("y")).unwrap();

        let drained = store.drain_changes();
        assert_eq!(drained.len(), 2);
        assert_eq!(store.change_count(), 0);
    }
}
