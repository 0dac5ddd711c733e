//! In-memory book storage backend for the Bookshelf server.
//!
//! This crate provides an in-memory implementation of the `BookStorage` trait
//! from `bookshelf-storage`. Records live in a single vector behind a tokio
//! `RwLock`: paged queries share the read lock, writers take it exclusively.
//!
//! # Example
//!
//! ```ignore
//! use bookshelf_db_memory::InMemoryBookStorage;
//! use bookshelf_storage::{BookStorage, PageRequest};
//!
//! let storage = InMemoryBookStorage::new();
//! storage.insert(NewBook::new("Dune", "Frank Herbert", "978-0441013593", date)).await?;
//! let page = storage.paged_query(&PageRequest::new(1, 10)).await?;
//! ```

mod book_impl;
pub mod query;
pub mod storage;

// Re-export the BookStorage trait for convenience
pub use bookshelf_storage::{BookStorage, StorageError};

pub use query::{SearchFilter, evaluate};
pub use storage::InMemoryBookStorage;

/// Type alias for a shareable BookStorage instance.
pub type DynBookStorage = std::sync::Arc<dyn BookStorage>;

/// Creates a new in-memory BookStorage instance.
pub fn create_book_storage() -> DynBookStorage {
    std::sync::Arc::new(InMemoryBookStorage::new())
}
