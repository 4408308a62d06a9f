//! Store configuration.

use crate::log::DEFAULT_LOG_HISTORY;
use std::fmt;

/// A function deriving a key from a record.
pub type KeySelector<T> = Box<dyn Fn(&T) -> String>;

/// Configuration for opening a store.
pub struct Config<T> {
    /// Whether to commit a record immediately after every mutation.
    pub save_on_change: bool,

    /// Whether to commit all dirty records when a session exits cleanly.
    pub save_on_exit: bool,

    /// Whether to rehydrate persisted change history on load.
    pub load_changes_from_file: bool,

    /// Whether to persist each record's change history in its file.
    pub save_changes_to_file: bool,

    /// Whether to escape non-ASCII characters in file output.
    pub ensure_ascii: bool,

    /// Whether to load the directory eagerly when the store is opened.
    pub load_on_start: bool,

    /// Capacity of the store-wide change log (`0` = unbounded).
    pub max_log_history: usize,

    /// Optional function deriving a key from a record.
    pub key_selector: Option<KeySelector<T>>,
}

impl<T> Default for Config<T> {
    fn default() -> Self {
        Self {
            save_on_change: true,
            save_on_exit: true,
            load_changes_from_file: false,
            save_changes_to_file: true,
            ensure_ascii: false,
            load_on_start: true,
            max_log_history: DEFAULT_LOG_HISTORY,
            key_selector: None,
        }
    }
}

impl<T> Config<T> {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to commit after every mutation.
    #[must_use]
    pub fn save_on_change(mut self, value: bool) -> Self {
        self.save_on_change = value;
        self
    }

    /// Sets whether to commit all dirty records on clean session exit.
    #[must_use]
    pub fn save_on_exit(mut self, value: bool) -> Self {
        self.save_on_exit = value;
        self
    }

    /// Sets whether to rehydrate persisted change history on load.
    #[must_use]
    pub fn load_changes_from_file(mut self, value: bool) -> Self {
        self.load_changes_from_file = value;
        self
    }

    /// Sets whether to persist change history in record files.
    #[must_use]
    pub fn save_changes_to_file(mut self, value: bool) -> Self {
        self.save_changes_to_file = value;
        self
    }

    /// Sets whether to escape non-ASCII characters in file output.
    #[must_use]
    pub fn ensure_ascii(mut self, value: bool) -> Self {
        self.ensure_ascii = value;
        self
    }

    /// Sets whether to load the directory eagerly on open.
    #[must_use]
    pub fn load_on_start(mut self, value: bool) -> Self {
        self.load_on_start = value;
        self
    }

    /// Sets the store-wide change log capacity (`0` = unbounded).
    #[must_use]
    pub fn max_log_history(mut self, value: usize) -> Self {
        self.max_log_history = value;
        self
    }

    /// Sets the function deriving keys from records.
    #[must_use]
    pub fn key_selector(mut self, selector: impl Fn(&T) -> String + 'static) -> Self {
        self.key_selector = Some(Box::new(selector));
        self
    }
}

impl<T> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("save_on_change", &self.save_on_change)
            .field("save_on_exit", &self.save_on_exit)
            .field("load_changes_from_file", &self.load_changes_from_file)
            .field("save_changes_to_file", &self.save_changes_to_file)
            .field("ensure_ascii", &self.ensure_ascii)
            .field("load_on_start", &self.load_on_start)
            .field("max_log_history", &self.max_log_history)
            .field("key_selector", &self.key_selector.is_some())
            .finish()
    }
}
