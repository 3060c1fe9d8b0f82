//! In-Memory Key-Value Store
//!
//! Thread-safe hashmap with per-entry expiration, guarded by a single
//! readers-writer lock. Writers (`set`, `delete`, `cleanup_expired`) hold
//! the lock exclusively; any number of readers may run together.
//!
//! Expiration is lazy: an entry past its deadline is reported absent on
//! read but stays in the map until it is overwritten, deleted or swept.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::entry::Entry;
use crate::config::StoreConfig;
use crate::metrics::StoreMetrics;

struct Shared<V> {
    map: RwLock<HashMap<String, Entry<V>>>,
    metrics: StoreMetrics,
}

/// Thread-safe in-memory key-value store
///
/// Cloning is cheap and yields another handle to the same entries.
pub struct Store<V> {
    inner: Arc<Shared<V>>,
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<V> Store<V> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        debug!(capacity = config.initial_capacity, "Creating store");
        Self {
            inner: Arc::new(Shared {
                map: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
                metrics: StoreMetrics::new(),
            }),
        }
    }

    /// Set a key, replacing any previous value and TTL.
    ///
    /// A zero `ttl` stores the value without expiration.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key.into(), value, ttl, Instant::now());
    }

    fn set_at(&self, key: String, value: V, ttl: Duration, now: Instant) {
        let entry = Entry::new_at(value, ttl, now);
        trace!(key = %key, ?ttl, "set");
        self.inner.map.write().insert(key, entry);
        self.inner.metrics.record_set();
    }

    /// Apply `f` to the live value for `key` without cloning it
    ///
    /// # Deadlocks
    ///
    /// `f` runs while the read lock is held. It must not call `set`,
    /// `delete`, `clear` or `cleanup_expired` on this store or any clone
    /// of it. Other stores are fine.
    pub fn get_with<R>(&self, key: &str, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.read_at(key, Instant::now(), f)
    }

    fn read_at<R>(&self, key: &str, now: Instant, f: impl FnOnce(&V) -> R) -> Option<R> {
        let map = self.inner.map.read();
        match map.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.inner.metrics.record_hit();
                Some(f(&entry.value))
            }
            Some(_) => {
                self.inner.metrics.record_miss(true);
                None
            }
            None => {
                self.inner.metrics.record_miss(false);
                None
            }
        }
    }

    /// Delete key, returns true if an entry was removed
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.map.write().remove(key).is_some();
        if removed {
            trace!(key = %key, "delete");
            self.inner.metrics.record_delete();
        }
        removed
    }

    /// Check if key exists and is not expired
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .map
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Remaining lifetime of a live entry.
    ///
    /// Returns `None` if the key is absent, `Some(None)` if the entry
    /// never expires.
    pub fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.ttl_at(key, Instant::now())
    }

    fn ttl_at(&self, key: &str, now: Instant) -> Option<Option<Duration>> {
        let map = self.inner.map.read();
        let entry = map.get(key).filter(|entry| !entry.is_expired_at(now))?;
        Some(entry.expiration.remaining_at(now))
    }

    /// Get the number of entries (including expired ones not yet swept)
    pub fn len(&self) -> usize {
        self.inner.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of all live entries, in no particular order
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.inner
            .map
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.inner.map.write().clear();
    }

    /// Remove expired keys, returns count of removed keys
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    fn cleanup_expired_at(&self, now: Instant) -> usize {
        let removed = {
            let mut map = self.inner.map.write();
            let before = map.len();
            map.retain(|_, entry| !entry.is_expired_at(now));
            before - map.len()
        };
        self.inner.metrics.record_swept(removed);
        removed
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.inner.metrics
    }
}

impl<V: Clone> Store<V> {
    /// Get value by key, returns None if key doesn't exist or is expired
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with(key, V::clone)
    }

    #[cfg(test)]
    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        self.read_at(key, now, V::clone)
    }
}
