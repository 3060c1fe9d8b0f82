//! Concurrent In-Memory Key-Value Store
//!
//! Sharded hashmap using DashMap. Each shard has its own readers-writer
//! lock, so operations on keys in different shards never contend.
//! Read-after-write holds per key; nothing is promised across keys.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::entry::Entry;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::metrics::StoreMetrics;

struct Shared<V> {
    map: DashMap<String, Entry<V>>,
    metrics: StoreMetrics,
}

/// Sharded concurrent in-memory key-value store
pub struct ConcurrentStore<V> {
    inner: Arc<Shared<V>>,
}

impl<V> Clone for ConcurrentStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for ConcurrentStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ConcurrentStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<V> ConcurrentStore<V> {
    /// Create a new empty store with an auto-detected shard count
    pub fn new() -> Self {
        Self::build(0, StoreConfig::default().effective_shard_amount())
    }

    /// Create a store from configuration, rejecting invalid shard counts
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            config.initial_capacity,
            config.effective_shard_amount(),
        ))
    }

    fn build(capacity: usize, shard_amount: usize) -> Self {
        debug!(capacity, shard_amount, "Creating concurrent store");
        Self {
            inner: Arc::new(Shared {
                map: DashMap::with_capacity_and_shard_amount(capacity, shard_amount),
                metrics: StoreMetrics::new(),
            }),
        }
    }

    /// Set a key, replacing any previous value and TTL.
    ///
    /// A zero `ttl` stores the value without expiration.
    #[inline]
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key.into(), value, ttl, Instant::now());
    }

    fn set_at(&self, key: String, value: V, ttl: Duration, now: Instant) {
        let entry = Entry::new_at(value, ttl, now);
        trace!(key = %key, ?ttl, "set");
        self.inner.map.insert(key, entry);
        self.inner.metrics.record_set();
    }

    /// Apply `f` to the live value for `key` without cloning it
    ///
    /// # Deadlocks
    ///
    /// `f` runs while the key's shard guard is held. It must not write to
    /// this store or any clone of it (`set`, `delete`, `clear`,
    /// `cleanup_expired`). Other stores are fine.
    #[inline]
    pub fn get_with<R>(&self, key: &str, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.read_at(key, Instant::now(), f)
    }

    fn read_at<R>(&self, key: &str, now: Instant, f: impl FnOnce(&V) -> R) -> Option<R> {
        let Some(entry) = self.inner.map.get(key) else {
            self.inner.metrics.record_miss(false);
            return None;
        };
        if entry.is_expired_at(now) {
            self.inner.metrics.record_miss(true);
            return None;
        }
        self.inner.metrics.record_hit();
        Some(f(&entry.value))
    }

    /// Delete key, returns true if an entry was removed
    #[inline]
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.map.remove(key).is_some();
        if removed {
            trace!(key = %key, "delete");
            self.inner.metrics.record_delete();
        }
        removed
    }

    /// Check if key exists and is not expired
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .map
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Remaining lifetime of a live entry (`Some(None)` = never expires)
    pub fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.ttl_at(key, Instant::now())
    }

    fn ttl_at(&self, key: &str, now: Instant) -> Option<Option<Duration>> {
        let entry = self.inner.map.get(key)?;
        if entry.is_expired_at(now) {
            return None;
        }
        Some(entry.expiration.remaining_at(now))
    }

    /// Get the number of entries (including expired - approximate)
    pub fn len(&self) -> usize {
        self.inner.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.map.is_empty()
    }

    /// Keys of all live entries, in no particular order
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.inner
            .map
            .iter()
            .filter(|r| !r.value().is_expired_at(now))
            .map(|r| r.key().clone())
            .collect()
    }

    pub fn clear(&self) {
        self.inner.map.clear();
    }

    /// Remove expired keys, returns count of removed keys
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    fn cleanup_expired_at(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.inner.map.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        self.inner.metrics.record_swept(removed);
        removed
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.inner.metrics
    }
}

impl<V: Clone> ConcurrentStore<V> {
    /// Get value by key, returns None if key doesn't exist or is expired
    #[inline]
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with(key, V::clone)
    }

    #[cfg(test)]
    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        self.read_at(key, now, V::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let store = ConcurrentStore::new();

        store.set("key", "value".to_string(), Duration::from_secs(60));
        assert_eq!(store.get("key"), Some("value".to_string()));
        assert!(store.contains_key("key"));

        assert!(store.delete("key"));
        assert!(!store.delete("key"));
        assert!(!store.contains_key("key"));
        assert_eq!(store.get("key"), None);
    }

    #[test]
    fn test_ttl_expiration() {
        let store = ConcurrentStore::new();

        store.set("expiring", "temporary", Duration::from_millis(50));
        assert_eq!(store.get("expiring"), Some("temporary"));

        thread::sleep(Duration::from_millis(100));
        assert_eq!(store.get("expiring"), None);
        assert_eq!(store.ttl("expiring"), None);
    }

    #[test]
    fn test_scenario() {
        let store = ConcurrentStore::new();
        let start = Instant::now();

        store.set_at("key1".into(), "value1", Duration::from_secs(10), start);
        store.set_at("key2".into(), "value2", Duration::ZERO, start);
        assert_eq!(store.get_at("key1", start), Some("value1"));
        assert_eq!(store.get_at("key2", start), Some("value2"));

        let later = start + Duration::from_secs(15);
        assert_eq!(store.get_at("key1", later), None);
        assert_eq!(store.get_at("key2", later), Some("value2"));

        store.delete("key2");
        assert_eq!(store.get_at("key2", later), None);
    }

    #[test]
    fn test_reset_replaces_value_and_ttl() {
        let store = ConcurrentStore::new();
        let t0 = Instant::now();

        store.set_at("key".into(), 1, Duration::from_secs(1), t0);
        store.set_at("key".into(), 2, Duration::ZERO, t0);

        assert_eq!(store.get_at("key", t0 + Duration::from_secs(3600)), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_with_config() {
        let config = StoreConfig::default()
            .with_capacity(64)
            .with_shard_amount(8);
        let store: ConcurrentStore<u32> = ConcurrentStore::with_config(&config).unwrap();
        store.set("a", 1, Duration::ZERO);
        assert_eq!(store.get("a"), Some(1));

        let bad = StoreConfig::default().with_shard_amount(3);
        assert!(matches!(
            ConcurrentStore::<u32>::with_config(&bad),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_concurrent_access() {
        let store = ConcurrentStore::new();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let s = store.clone();
                thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("key-{}-{}", i, j);
                        s.set(key.clone(), format!("value-{}-{}", i, j), Duration::ZERO);
                        assert!(s.contains_key(&key));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
        assert_eq!(store.keys().len(), 1000);
    }

    #[test]
    fn test_cleanup() {
        let store = ConcurrentStore::new();
        let now = Instant::now();

        for i in 0..10 {
            store.set_at(format!("key{}", i), i, Duration::from_millis(1), now);
        }
        store.set_at("forever".into(), 10, Duration::ZERO, now);

        let removed = store.cleanup_expired_at(now + Duration::from_millis(100));
        assert_eq!(removed, 10);
        assert_eq!(store.len(), 1);
        assert_eq!(store.metrics().snapshot().swept, 10);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_and_deleted_keys_are_absent() {
        let store: ConcurrentStore<i32> = ConcurrentStore::new();
        assert_eq!(store.get("never-set"), None);

        // Deleting a missing key is a no-op
        assert!(!store.delete("never-set"));

        store.set("gone", 1, Duration::ZERO);
        store.delete("gone");
        assert_eq!(store.get("gone"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_values_are_not_absent() {
        let store = ConcurrentStore::new();
        store.set("zero", 0u64, Duration::ZERO);
        store.set("", 0u64, Duration::ZERO);

        assert_eq!(store.get("zero"), Some(0));
        assert_eq!(store.get(""), Some(0));

        let text: ConcurrentStore<String> = ConcurrentStore::new();
        text.set("empty", String::new(), Duration::ZERO);
        assert_eq!(text.get("empty"), Some(String::new()));

        let opt: ConcurrentStore<Option<u8>> = ConcurrentStore::new();
        opt.set("none", None, Duration::ZERO);
        assert_eq!(opt.get("none"), Some(None));
    }

    #[test]
    fn test_zero_ttl_outlives_long_horizon() {
        let store = ConcurrentStore::new();
        let now = Instant::now();

        store.set_at("forever".into(), 7, Duration::ZERO, now);
        let far = now + Duration::from_secs(1_000 * 3600);
        assert_eq!(store.get_at("forever", far), Some(7));
        assert_eq!(store.ttl_at("forever", far), Some(None));
    }

    #[test]
    fn test_ttl_reports_remaining_lifetime() {
        let store = ConcurrentStore::new();
        let now = Instant::now();

        store.set_at("key".into(), (), Duration::from_secs(10), now);
        assert_eq!(
            store.ttl_at("key", now + Duration::from_secs(4)),
            Some(Some(Duration::from_secs(6)))
        );
        assert_eq!(store.ttl_at("key", now + Duration::from_secs(10)), None);
        assert_eq!(store.ttl("missing"), None);
    }

    #[test]
    fn test_keys_skip_expired() {
        let store = ConcurrentStore::new();
        store.set("live", 1, Duration::ZERO);
        store.set("dead", 2, Duration::from_millis(10));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(store.keys(), vec!["live".to_string()]);
        // Lazy: the expired entry is still physically present
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_with_may_write_to_other_store() {
        let source: ConcurrentStore<u32> = ConcurrentStore::new();
        let target: ConcurrentStore<u32> = ConcurrentStore::new();
        source.set("a", 7, Duration::ZERO);

        let copied = source.get_with("a", |v| target.set("b", *v, Duration::ZERO));
        assert_eq!(copied, Some(()));
        assert_eq!(target.get("b"), Some(7));
        assert_eq!(source.get_with("a", |v| v * 2), Some(14));
    }

    #[test]
    fn test_readers_never_see_torn_entries() {
        // Each write stores a pair whose halves must always match
        let store: ConcurrentStore<(u64, u64)> = ConcurrentStore::new();
        store.set("pair", (0, 0), Duration::ZERO);

        let barrier = Arc::new(Barrier::new(5));
        let writer = {
            let s = store.clone();
            let b = Arc::clone(&barrier);
            thread::spawn(move || {
                b.wait();
                for n in 1..=2_000u64 {
                    s.set("pair", (n, n), Duration::ZERO);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let s = store.clone();
                let b = Arc::clone(&barrier);
                thread::spawn(move || {
                    b.wait();
                    let mut last = 0;
                    for _ in 0..2_000 {
                        let (x, y) = s.get("pair").unwrap();
                        assert_eq!(x, y);
                        // Writes to one key are ordered
                        assert!(x >= last);
                        last = x;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.get("pair"), Some((2_000, 2_000)));
    }
}
