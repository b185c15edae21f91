//! Tracking of dispatched actions that have not completed yet.
//!
//! Each control disables itself only for its own request: a key is busy
//! while a guard for it is alive, and other keys are never affected.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::eligibility::Action;

/// Key for a per-job action such as `(job id, RunScraping)`.
pub type JobActionKey = (String, Action);

/// Registry of in-flight keys. Cloning shares the registry.
#[derive(Debug)]
pub struct InFlight<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

fn lock<K>(keys: &Mutex<HashSet<K>>) -> MutexGuard<'_, HashSet<K>> {
    match keys.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("In-flight registry lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as in flight. Returns `None` if it already is.
    pub fn try_begin(&self, key: K) -> Option<InFlightGuard<K>> {
        let mut keys = lock(&self.keys);
        if !keys.insert(key.clone()) {
            log::debug!("Action {:?} is already in flight", key);
            return None;
        }
        Some(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        lock(&self.keys).contains(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.keys).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.keys).is_empty()
    }
}

/// Releases its key when dropped, whether the request succeeded or not.
#[derive(Debug)]
pub struct InFlightGuard<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> InFlightGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}
