//! Paged book query caching.
//!
//! ## Cache Key Format
//!
//! `books:paged:p={page}:s={page_size}[:q{len}={search}][:o={field}:{dir}]`
//!
//! - the search segment appears only for a non-blank term; the term is
//!   lowercased (matching is case-insensitive) and length-prefixed so that
//!   it cannot be confused with the segments after it
//! - the order segment appears only when the resolved order differs from the
//!   default title-ascending one
//!
//! Requests that return the same results map to the same key.
//!
//! ## Invalidation
//!
//! Every write to the catalog removes `books:paged:*` and bumps the cache
//! generation. A page computed before the bump is never stored after it, so a
//! read racing a write cannot put the pre-write page back.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use bookshelf_storage::{PageRequest, PagedResult};
use parking_lot::RwLock;

use super::backend::{CacheBackend, CacheStats};

pub const PAGED_KEY_PREFIX: &str = "books:paged:";
pub const PAGED_KEY_PATTERN: &str = "books:paged:*";

/// Cache of `PagedResult`s keyed by normalized page requests.
#[derive(Clone)]
pub struct PagedQueryCache {
    backend: CacheBackend,
    ttl: Duration,
    /// Invalidation count. Writers hold the read side while storing a page,
    /// invalidation holds the write side while bumping and sweeping.
    generation: Arc<RwLock<u64>>,
}

impl PagedQueryCache {
    /// Create a new paged query cache with the given backend and TTL.
    pub fn new(backend: CacheBackend, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            generation: Arc::new(RwLock::new(0)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    /// Generate the cache key for a page request.
    pub fn cache_key(request: &PageRequest) -> String {
        let mut key = format!(
            "{PAGED_KEY_PREFIX}p={}:s={}",
            request.page, request.page_size
        );
        if let Some(term) = request.search_term() {
            let term = term.to_lowercase();
            let _ = write!(key, ":q{}={}", term.len(), term);
        }
        let order = request.sort_order();
        if !order.is_default() {
            let direction = if order.descending { "desc" } else { "asc" };
            let _ = write!(key, ":o={}:{}", order.field, direction);
        }
        key
    }

    /// Current invalidation generation. Read it before querying the store and
    /// hand it to [`set`](Self::set).
    pub fn generation(&self) -> u64 {
        *self.generation.read()
    }

    /// Get a cached page for this request.
    pub fn get(&self, request: &PageRequest) -> Option<PagedResult> {
        let key = Self::cache_key(request);
        let data = self.backend.get(&key)?;
        match rmp_serde::from_slice::<PagedResult>(&data) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached page");
                self.backend.remove(&key);
                None
            }
        }
    }

    /// Cache a page computed from a store snapshot taken at `generation`.
    ///
    /// Returns `false` without storing when an invalidation happened since.
    /// Encoding failures are logged, never returned.
    pub fn set(&self, request: &PageRequest, result: &PagedResult, generation: u64) -> bool {
        let key = Self::cache_key(request);
        let data = match rmp_serde::to_vec(result) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize page for cache");
                return false;
            }
        };

        let current = self.generation.read();
        if *current != generation {
            tracing::debug!(
                key = %key,
                seen = generation,
                current = *current,
                "page outdated, not cached"
            );
            return false;
        }
        self.backend.set(&key, data, self.ttl);
        true
    }

    /// Invalidate every cached page. Returns the number of dropped entries.
    pub fn invalidate_all(&self) -> usize {
        let mut generation = self.generation.write();
        *generation += 1;
        self.backend.remove_by_pattern(PAGED_KEY_PATTERN)
    }

    /// Drop cached pages whose TTL has elapsed.
    pub fn purge_expired(&self) -> usize {
        self.backend.purge_expired()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.backend.stats()
    }
}
