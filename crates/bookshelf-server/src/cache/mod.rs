//! Caching for paged book queries.
//!
//! ## Architecture
//!
//! - **Backend ([`CacheBackend`])**: DashMap of opaque byte blobs with absolute
//!   TTLs and glob-pattern invalidation. Value-agnostic.
//! - **Paged query cache ([`PagedQueryCache`])**: derives keys from page
//!   requests under the `books:paged:` namespace and (de)serializes
//!   `PagedResult`s as MessagePack.
//!
//! ## Graceful Degradation
//!
//! A blob that fails to encode or decode is logged and treated as a miss; the
//! request is served from the store instead.

pub mod backend;
pub mod paged;
pub mod pattern;

pub use backend::{CacheBackend, CacheStats, CachedEntry};
pub use paged::{PAGED_KEY_PATTERN, PAGED_KEY_PREFIX, PagedQueryCache};
pub use pattern::{KeyPattern, PatternError};
