//! Bounded TTL cache for upstream lookups.
//!
//! One [`TtlCache`] exists per resource type, each statically typed to the
//! value it stores. Entries expire after the TTL given at insertion and the
//! store never grows past its capacity: once full, inserting a new key
//! evicts the least-recently-used entry.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default number of entries held per store.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A cached value with its expiry deadline.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe, capacity-bounded cache with per-insert TTL.
///
/// Cloning shares the underlying storage.
#[derive(Clone, Debug)]
pub struct TtlCache<V> {
    entries: Arc<Mutex<LruCache<String, CacheEntry<V>>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Return the cached value for `key` if present and not yet expired.
    ///
    /// An expired entry is dropped on the spot. Callers cannot tell a key
    /// that was never cached from one that expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or replace the value for `key`, live for `ttl` from now.
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        self.put_at(key, value, ttl, Instant::now());
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                debug!("Cache HIT for {}", key);
                return Some(entry.value.clone());
            }
            Some(_) => {
                debug!("Cache entry for {} expired", key);
                entries.pop(key);
            }
            None => {}
        }
        debug!("Cache MISS for {}", key);
        None
    }

    pub(crate) fn put_at(&self, key: &str, value: V, ttl: Duration, now: Instant) {
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
        };
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.to_string(), entry)
            && evicted != key
        {
            debug!("Cache full, evicted {}", evicted);
        }
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    /// Number of resident entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
