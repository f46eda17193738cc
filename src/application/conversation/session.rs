//! Identity store - per-identity conversation state and data
//!
//! Each identity owns one [`SessionCell`]: its state string and data map sit
//! behind a single re-entrant lock. Holding [`SessionCell::lock`] makes a
//! read-modify-write sequence (set state, then run the step) atomic with
//! respect to other workers handling the same identity, while the owning
//! thread may still call back into the cell.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::application::errors::BotError;

/// Auxiliary key/value data kept for the length of a conversation
#[derive(Debug, Default)]
pub struct DataMap {
    values: RwLock<HashMap<String, Value>>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<(), BotError> {
        let value = serde_json::to_value(value)?;
        self.values.write().insert(key.into(), value);
        Ok(())
    }

    /// Typed read; `None` when the key is missing or holds another type
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.read().get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[derive(Debug)]
struct Session {
    state: String,
    data: Arc<DataMap>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: String::new(),
            data: Arc::new(DataMap::new()),
        }
    }
}

/// Guard returned by [`SessionCell::lock`]
pub struct SessionGuard<'a> {
    _guard: ReentrantMutexGuard<'a, RefCell<Option<Session>>>,
}

/// State and data of one identity. Both exist together or not at all.
#[derive(Debug, Default)]
pub struct SessionCell {
    inner: ReentrantMutex<RefCell<Option<Session>>>,
}

impl SessionCell {
    /// Hold the identity lock; re-entrant on the same thread
    pub fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            _guard: self.inner.lock(),
        }
    }

    /// Current state; `None` when no conversation is active
    pub fn state(&self) -> Option<String> {
        let guard = self.inner.lock();
        let session = guard.borrow();
        session
            .as_ref()
            .map(|s| s.state.clone())
            .filter(|s| !s.is_empty())
    }

    pub fn set_state(&self, state: impl Into<String>) {
        let guard = self.inner.lock();
        let mut session = guard.borrow_mut();
        session.get_or_insert_with(Session::new).state = state.into();
    }

    /// Data map, created on first access
    pub fn data(&self) -> Arc<DataMap> {
        let guard = self.inner.lock();
        let mut session = guard.borrow_mut();
        Arc::clone(&session.get_or_insert_with(Session::new).data)
    }

    pub fn clear(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().take();
    }

    pub fn is_active(&self) -> bool {
        let guard = self.inner.lock();
        let active = guard.borrow().is_some();
        active
    }
}

/// Process-wide identity store
#[derive(Debug, Default)]
pub struct SessionStore {
    cells: DashMap<i64, Arc<SessionCell>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell for `identity`, created on first use
    pub fn cell(&self, identity: i64) -> Arc<SessionCell> {
        if let Some(cell) = self.existing(identity) {
            return cell;
        }
        let cell = self.cells.entry(identity).or_default();
        Arc::clone(cell.value())
    }

    // Cells are always cloned out of the map before they are locked: a shard
    // lock must never be held while waiting on an identity lock.
    fn existing(&self, identity: i64) -> Option<Arc<SessionCell>> {
        self.cells.get(&identity).map(|c| Arc::clone(c.value()))
    }

    pub fn state(&self, identity: i64) -> Option<String> {
        self.existing(identity).and_then(|c| c.state())
    }

    pub fn clear(&self, identity: i64) {
        if let Some(cell) = self.existing(identity) {
            cell.clear();
        }
        self.evict(identity);
    }

    /// Drop the cell of `identity` if it holds no session and nothing else
    /// references it. Returns whether it was removed.
    pub fn evict(&self, identity: i64) -> bool {
        // Nobody else holds the Arc, so nobody can hold or wait on its lock
        self.cells
            .remove_if(&identity, |_, cell| {
                Arc::strong_count(cell) == 1 && !cell.is_active()
            })
            .is_some()
    }

    /// Number of identities with a cell in the store
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_state_and_data_created_together() {
        let store = SessionStore::new();
        let cell = store.cell(7);
        assert_eq!(cell.state(), None);
        assert!(!cell.is_active());

        cell.data().set("color", "red").unwrap();
        assert!(cell.is_active());
        assert_eq!(cell.state(), None);

        cell.set_state("animal");
        assert_eq!(store.state(7).as_deref(), Some("animal"));
        assert_eq!(cell.data().get::<String>("color").as_deref(), Some("red"));
    }

    #[test]
    fn test_clear_yields_fresh_data() {
        let store = SessionStore::new();
        let cell = store.cell(1);
        cell.set_state("color");
        let old = cell.data();
        old.set("color", "blue").unwrap();

        store.clear(1);

        assert_eq!(cell.state(), None);
        let fresh = cell.data();
        assert!(fresh.is_empty());
        assert!(!Arc::ptr_eq(&old, &fresh));
        // The stale handle keeps its own contents
        assert_eq!(old.get::<String>("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_typed_get_mismatch() {
        let data = DataMap::new();
        data.set("n", 3).unwrap();
        assert_eq!(data.get::<i64>("n"), Some(3));
        assert_eq!(data.get::<String>("n"), None);
        assert!(data.contains("n"));
        assert_eq!(data.remove("n"), Some(Value::from(3)));
        assert!(data.get_value("n").is_none());
    }

    #[test]
    fn test_lock_is_reentrant() {
        let cell = SessionCell::default();
        let _outer = cell.lock();
        cell.set_state("a");
        let _inner = cell.lock();
        assert_eq!(cell.state().as_deref(), Some("a"));
    }

    #[test]
    fn test_lock_serializes_same_identity() {
        let store = Arc::new(SessionStore::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let cell = store.cell(42);
                        let _guard = cell.lock();
                        let data = cell.data();
                        let n = data.get::<u64>("n").unwrap_or(0);
                        thread::yield_now();
                        data.set("n", n + 1).unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(store.cell(42).data().get::<u64>("n"), Some(800));
    }

    #[test]
    fn test_evict_only_idle_unreferenced_cells() {
        let store = SessionStore::new();
        store.cell(1).set_state("a");
        assert!(!store.evict(1));
        assert_eq!(store.len(), 1);

        // A held cell stays even when empty
        let held = store.cell(2);
        assert!(!store.evict(2));
        drop(held);
        assert!(store.evict(2));

        store.clear(1);
        assert!(store.is_empty());
        assert!(!store.evict(99));
    }
}
