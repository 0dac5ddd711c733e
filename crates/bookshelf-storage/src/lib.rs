//! # bookshelf-storage
//!
//! Storage abstraction layer for the Bookshelf server.
//!
//! This crate defines the traits and types that all book storage backends must
//! implement. It does not contain any implementations - those are provided by
//! separate crates.
//!
//! ## Overview
//!
//! The main trait is [`BookStorage`], which defines the contract for:
//! - CRUD operations (insert, get, get_all, update, delete)
//! - The combined filter + sort + paginate query
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf_storage::{BookStorage, PageRequest, StorageError};
//!
//! async fn first_page(storage: &dyn BookStorage) -> Result<usize, StorageError> {
//!     let request = PageRequest::new(1, 10).with_search("tolkien");
//!     let slice = storage.paged_query(&request).await?;
//!     Ok(slice.total_count)
//! }
//! ```

mod error;
pub mod instrumented;
mod traits;
mod types;

pub use error::StorageError;
pub use instrumented::{InstrumentedStorage, StorageStats};
pub use traits::BookStorage;
pub use types::{PageRequest, PageSlice, PagedResult, SortField, SortOrder};
