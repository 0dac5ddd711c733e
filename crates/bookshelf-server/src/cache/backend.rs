//! In-process cache backend with absolute TTLs and pattern invalidation.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use super::pattern::KeyPattern;

/// A cached entry with an absolute expiration instant.
///
/// The data is wrapped in `Arc` to allow cheap cloning on cache hits.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub expires_at: Instant,
}

impl CachedEntry {
    /// Create a new cached entry expiring `ttl` from now.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            expires_at: Instant::now() + ttl,
        }
    }

    /// An entry is dead from its expiration instant onwards.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Local cache backend keyed by string, storing opaque bytes.
///
/// The entry map is also the registry of live keys: removing a value and
/// forgetting its key is a single map operation. Expired entries are dropped
/// when a lookup hits them, during pattern sweeps and by [`purge_expired`].
///
/// Individual operations are atomic per key. Pattern sweeps and purges hold
/// `sweep_lock` so two sweeps never interleave.
///
/// Time comes from tokio's clock, which tests can pause and advance.
///
/// [`purge_expired`]: CacheBackend::purge_expired
#[derive(Clone, Default)]
pub struct CacheBackend {
    entries: Arc<DashMap<String, CachedEntry>>,
    sweep_lock: Arc<Mutex<()>>,
    counters: Arc<Counters>,
}

impl CacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` for missing keys and for entries at or past their
    /// expiration instant; the latter are removed on the way out.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let now = Instant::now();
        let result = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Some(Arc::clone(&entry.data)),
            Some(entry) => {
                drop(entry);
                // Only drop the entry we saw expire, not a fresh one set meanwhile.
                self.entries.remove_if(key, |_, e| e.is_expired_at(now));
                tracing::debug!(key = %key, "cache entry expired");
                None
            }
            None => None,
        };

        if result.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "cache hit");
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "cache miss");
        }
        result
    }

    /// Set a value in the cache, replacing any previous entry under `key`.
    ///
    /// The entry expires `ttl` after this call; reads never extend it.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CachedEntry::new(value, ttl));
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
    }

    /// Remove a single entry. Returns whether one was present.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        tracing::debug!(key = %key, removed, "cache entry removed");
        removed
    }

    /// Remove every entry whose key matches a glob pattern (`*` = any run of
    /// characters, case-insensitive). Returns the number of removed entries.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid key pattern. Patterns are chosen by
    /// code, never by clients, so an invalid one is a programming error.
    pub fn remove_by_pattern(&self, pattern: &str) -> usize {
        let pattern = KeyPattern::new(pattern)
            .unwrap_or_else(|e| panic!("invalid cache key pattern {pattern:?}: {e}"));
        self.remove_matching(&pattern)
    }

    /// Remove every entry whose key matches `pattern`, returning how many.
    fn remove_matching(&self, pattern: &KeyPattern) -> usize {
        let _sweep = self.sweep_lock.lock();
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            let expired = entry.is_expired_at(now);
            let matched = pattern.matches(key);
            if matched && !expired {
                removed += 1;
            }
            // Expired entries go too but are not counted.
            !matched && !expired
        });
        tracing::debug!(pattern = %pattern.as_str(), removed, "cache invalidated by pattern");
        removed
    }

    /// Drop all expired entries. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let _sweep = self.sweep_lock.lock();
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "expired cache entries purged");
        }
        purged
    }

    /// Number of tracked keys, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
