//! Storage traits for the book storage abstraction layer.

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_core::{Book, BookChanges, BookId, NewBook};

use crate::error::StorageError;
use crate::types::{PageRequest, PageSlice};

/// The capability every book storage backend provides.
///
/// Missing records are reported through `Option`/`bool`, never through
/// `StorageError`; errors are reserved for infrastructure failures of
/// backends that have them. Implementations must be thread-safe
/// (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use bookshelf_storage::{BookStorage, StorageError};
///
/// async fn title_of(storage: &dyn BookStorage, id: BookId) -> Result<Option<String>, StorageError> {
///     Ok(storage.get(id).await?.map(|book| book.title))
/// }
/// ```
#[async_trait]
pub trait BookStorage: Send + Sync {
    // ==================== CRUD Operations ====================

    /// Stores a new book, assigning its id and creation timestamp.
    ///
    /// Duplicate ISBNs are accepted.
    async fn insert(&self, book: NewBook) -> Result<Book, StorageError>;

    /// Reads a book by id. Returns `None` if it does not exist.
    async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError>;

    /// Returns every stored book in insertion order.
    async fn get_all(&self) -> Result<Vec<Book>, StorageError>;

    /// Replaces the mutable fields of a book and stamps `updated_at`.
    ///
    /// Returns `None` if the id is absent.
    async fn update(&self, id: BookId, changes: BookChanges)
    -> Result<Option<Book>, StorageError>;

    /// Removes a book. Returns `false` if the id is absent.
    async fn delete(&self, id: BookId) -> Result<bool, StorageError>;

    // ==================== Query ====================

    /// Filters, sorts and paginates the collection.
    ///
    /// `total_count` in the result counts every match, independent of the page.
    async fn paged_query(&self, request: &PageRequest) -> Result<PageSlice, StorageError>;

    // ==================== Metadata ====================

    /// Number of stored books.
    async fn count(&self) -> Result<usize, StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// A shared handle is a backend too, so wrappers such as
/// [`InstrumentedStorage`](crate::InstrumentedStorage) can sit over
/// `Arc<dyn BookStorage>`.
#[async_trait]
impl<T: BookStorage + ?Sized> BookStorage for Arc<T> {
    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        (**self).insert(book).await
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        (**self).get(id).await
    }

    async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
        (**self).get_all().await
    }

    async fn update(
        &self,
        id: BookId,
        changes: BookChanges,
    ) -> Result<Option<Book>, StorageError> {
        (**self).update(id, changes).await
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        (**self).delete(id).await
    }

    async fn paged_query(&self, request: &PageRequest) -> Result<PageSlice, StorageError> {
        (**self).paged_query(request).await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        (**self).count().await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
