//! Bookshelf HTTP server: paged book catalog with a short-lived query cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod heartbeat;
pub mod observability;
pub mod seed;
pub mod server;
pub mod service;
pub mod validation;

pub use cache::{CacheBackend, CacheStats, CachedEntry, PagedQueryCache};
pub use config::{AppConfig, CacheConfig, HeartbeatConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use error::ApiError;
pub use heartbeat::Heartbeat;
pub use observability::init_tracing;
pub use server::{
    AppState, BookshelfServer, ServerBuilder, build_app, build_state, build_state_with, router,
};
pub use service::BookService;
