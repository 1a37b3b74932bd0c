//! Canonical selection set with synchronous change notification.
//!
//! # Responsibility
//! - Own the set of selected school keys for one session.
//! - Apply typed selection commands and notify subscribers.
//!
//! # Invariants
//! - Only keys known at construction can ever be selected.
//! - Each effective mutation notifies every subscriber exactly once, before
//!   the mutating call returns.
//! - No notification is emitted for a mutation that changed nothing, except
//!   `bulk_add`, which always emits one.

use crate::model::school::SchoolKey;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Handle returned by [`SelectionStore::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&SelectionSnapshot) + Send>;

/// Immutable view of the selection at notification time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    /// Selected keys in alphabetical order.
    pub keys: Vec<SchoolKey>,
    /// Incremented on every notification.
    pub revision: u64,
}

impl SelectionSnapshot {
    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .binary_search_by(|candidate| candidate.as_str().cmp(key))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Typed selection mutations emitted by the interaction layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    Toggle(SchoolKey),
    /// Sequential toggles with a single notification (lasso).
    ToggleMany(Vec<SchoolKey>),
    /// Replace the selection with exactly these keys (presets, select all).
    BulkSelect(Vec<SchoolKey>),
    Remove(SchoolKey),
    Clear,
}

/// Result of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Non-fatal selection error; callers absorb it without changing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    InvalidSelectionKey(SchoolKey),
}

impl SelectionError {
    /// The rejected key.
    pub fn key(&self) -> &str {
        match self {
            Self::InvalidSelectionKey(key) => key,
        }
    }
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSelectionKey(key) => write!(f, "unknown school key: {key}"),
        }
    }
}

impl Error for SelectionError {}

/// Single owner of the mutable selection.
pub struct SelectionStore {
    known: BTreeSet<SchoolKey>,
    selected: BTreeSet<SchoolKey>,
    revision: u64,
    next_subscription: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl Debug for SelectionStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStore")
            .field("known", &self.known.len())
            .field("selected", &self.selected)
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SelectionStore {
    /// Creates an empty selection accepting `known_keys`.
    pub fn new(known_keys: impl IntoIterator<Item = SchoolKey>) -> Self {
        Self {
            known: known_keys.into_iter().collect(),
            selected: BTreeSet::new(),
            revision: 0,
            next_subscription: 1,
            subscribers: Vec::new(),
        }
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.known.contains(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Selected keys in alphabetical order.
    pub fn keys(&self) -> impl Iterator<Item = &SchoolKey> {
        self.selected.iter()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            keys: self.selected.iter().cloned().collect(),
            revision: self.revision,
        }
    }

    /// Registers a callback invoked synchronously after every notification.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&SelectionSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns whether `id` was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Adds `key` if absent, removes it if present.
    ///
    /// # Errors
    /// - `InvalidSelectionKey` when `key` is unknown; nothing changes.
    pub fn toggle(&mut self, key: &str) -> Result<ToggleOutcome, SelectionError> {
        let outcome = self.toggle_silently(key)?;
        self.notify();
        Ok(outcome)
    }

    /// Applies `toggle` to each key in order, notifying once at the end.
    ///
    /// Unknown keys are skipped. Returns whether the final set differs from
    /// the initial one; no notification is emitted when it does not.
    pub fn toggle_many<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let before = self.selected.clone();
        for key in keys {
            if let Err(err) = self.toggle_silently(key) {
                debug!("event=selection_toggle module=selection status=skipped error={err}");
            }
        }
        let changed = self.selected != before;
        if changed {
            self.notify();
        }
        changed
    }

    /// Replaces the selection with exactly `keys`, notifying once.
    ///
    /// # Errors
    /// - `InvalidSelectionKey` for the first unknown key; the selection is left
    ///   untouched and nothing is notified.
    pub fn bulk_add(
        &mut self,
        keys: impl IntoIterator<Item = SchoolKey>,
    ) -> Result<(), SelectionError> {
        let mut replacement = BTreeSet::new();
        for key in keys {
            if !self.known.contains(key.as_str()) {
                return Err(SelectionError::InvalidSelectionKey(key));
            }
            replacement.insert(key);
        }
        self.selected = replacement;
        self.notify();
        Ok(())
    }

    /// Removes `key`; absent keys are a silent no-op without notification.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.selected.remove(key);
        if removed {
            self.notify();
        }
        removed
    }

    /// Empties the selection; notifies only if it was non-empty.
    pub fn clear(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.selected.clear();
        self.notify();
        true
    }

    /// Dispatches one command. Returns whether subscribers were notified.
    pub fn apply(&mut self, command: SelectionCommand) -> Result<bool, SelectionError> {
        match command {
            SelectionCommand::Toggle(key) => self.toggle(&key).map(|_| true),
            SelectionCommand::ToggleMany(keys) => {
                Ok(self.toggle_many(keys.iter().map(String::as_str)))
            }
            SelectionCommand::BulkSelect(keys) => self.bulk_add(keys).map(|()| true),
            SelectionCommand::Remove(key) => Ok(self.remove(&key)),
            SelectionCommand::Clear => Ok(self.clear()),
        }
    }

    fn toggle_silently(&mut self, key: &str) -> Result<ToggleOutcome, SelectionError> {
        if !self.known.contains(key) {
            return Err(SelectionError::InvalidSelectionKey(key.to_string()));
        }
        if self.selected.remove(key) {
            Ok(ToggleOutcome::Removed)
        } else {
            self.selected.insert(key.to_string());
            Ok(ToggleOutcome::Added)
        }
    }

    fn notify(&mut self) {
        self.revision += 1;
        let snapshot = self.snapshot();
        info!(
            "event=selection_changed module=selection size={} revision={} subscribers={}",
            snapshot.len(),
            snapshot.revision,
            self.subscribers.len()
        );
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionCommand, SelectionError, SelectionStore, ToggleOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn store() -> SelectionStore {
        SelectionStore::new(["Alpha", "Beta", "Gamma"].map(String::from))
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut store = store();
        assert_eq!(store.toggle("Beta"), Ok(ToggleOutcome::Added));
        assert!(store.contains("Beta"));
        assert_eq!(store.toggle("Beta"), Ok(ToggleOutcome::Removed));
        assert!(store.is_empty());
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn unknown_toggle_changes_nothing() {
        let mut store = store();
        let err = store.toggle("Omega").expect_err("unknown key must fail");
        assert_eq!(err, SelectionError::InvalidSelectionKey("Omega".to_string()));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.toggle("Alpha").expect("known key");
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.toggle("Alpha").expect("known key");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn toggle_many_applies_duplicates_sequentially() {
        let mut store = store();
        store.toggle("Gamma").expect("known key");
        let changed = store.toggle_many(["Alpha", "Gamma", "Beta", "Beta", "Omega"]);
        assert!(changed);
        assert_eq!(store.snapshot().keys, vec!["Alpha".to_string()]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn apply_reports_notification() {
        let mut store = store();
        assert_eq!(store.apply(SelectionCommand::Clear), Ok(false));
        assert_eq!(
            store.apply(SelectionCommand::Toggle("Alpha".to_string())),
            Ok(true)
        );
        assert_eq!(
            store.apply(SelectionCommand::Remove("Beta".to_string())),
            Ok(false)
        );
        assert_eq!(store.apply(SelectionCommand::Clear), Ok(true));
    }

    #[test]
    fn snapshot_contains_uses_sorted_keys() {
        let mut store = store();
        store
            .bulk_add(vec!["Gamma".to_string(), "Alpha".to_string()])
            .expect("known keys");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.keys, vec!["Alpha".to_string(), "Gamma".to_string()]);
        assert!(snapshot.contains("Gamma"));
        assert!(!snapshot.contains("Beta"));
    }
}
