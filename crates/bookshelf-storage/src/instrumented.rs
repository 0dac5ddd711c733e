//! InstrumentedStorage - a storage wrapper that counts and traces operations.
//!
//! This wrapper delegates every call to an inner storage implementation and
//! records how often each operation reached the backend. The server wraps its
//! store in it so the effectiveness of the paged-query cache is observable.
//!
//! # Example
//!
//! ```ignore
//! use bookshelf_storage::InstrumentedStorage;
//!
//! let storage = InstrumentedStorage::new(InMemoryBookStorage::new());
//! storage.paged_query(&PageRequest::new(1, 10)).await?;
//! assert_eq!(storage.stats().paged_queries, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bookshelf_core::{Book, BookChanges, BookId, NewBook};
use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::BookStorage;
use crate::types::{PageRequest, PageSlice};

/// Snapshot of the operation counters of an [`InstrumentedStorage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub inserts: u64,
    pub reads: u64,
    pub updates: u64,
    pub deletes: u64,
    pub paged_queries: u64,
}

#[derive(Debug, Default)]
struct Counters {
    inserts: AtomicU64,
    reads: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    paged_queries: AtomicU64,
}

/// A storage wrapper that counts calls reaching the inner backend.
///
/// Counters are bumped before delegation, so failed calls are counted too.
pub struct InstrumentedStorage<S: BookStorage> {
    /// The inner storage implementation.
    inner: S,
    counters: Counters,
}

impl<S: BookStorage> InstrumentedStorage<S> {
    /// Create a new instrumented storage wrapper.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    /// Get a reference to the inner storage.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Current operation counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            updates: self.counters.updates.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            paged_queries: self.counters.paged_queries.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<S: BookStorage> BookStorage for InstrumentedStorage<S> {
    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
        let stored = self.inner.insert(book).await?;
        debug!(book_id = %stored.id, backend = self.inner.backend_name(), "book inserted");
        Ok(stored)
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.get(id).await
    }

    async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.get_all().await
    }

    async fn update(
        &self,
        id: BookId,
        changes: BookChanges,
    ) -> Result<Option<Book>, StorageError> {
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        let updated = self.inner.update(id, changes).await?;
        debug!(book_id = %id, found = updated.is_some(), "book update");
        Ok(updated)
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        let deleted = self.inner.delete(id).await?;
        debug!(book_id = %id, deleted, "book delete");
        Ok(deleted)
    }

    async fn paged_query(&self, request: &PageRequest) -> Result<PageSlice, StorageError> {
        self.counters.paged_queries.fetch_add(1, Ordering::Relaxed);
        let slice = self.inner.paged_query(request).await?;
        debug!(
            page = request.page,
            page_size = request.page_size,
            returned = slice.items.len(),
            total = slice.total_count,
            "paged query executed"
        );
        Ok(slice)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.inner.count().await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use time::macros::{date, datetime};

    /// Minimal backend holding books in a Vec, enough to exercise delegation.
    #[derive(Default)]
    struct VecStorage {
        books: Mutex<Vec<Book>>,
    }

    #[async_trait]
    impl BookStorage for VecStorage {
        async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
            let book = Book::create(book, datetime!(2024-01-01 0:00 UTC));
            self.books.lock().unwrap().push(book.clone());
            Ok(book)
        }

        async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
            Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
        }

        async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
            Ok(self.books.lock().unwrap().clone())
        }

        async fn update(
            &self,
            _id: BookId,
            _changes: BookChanges,
        ) -> Result<Option<Book>, StorageError> {
            Ok(None)
        }

        async fn delete(&self, _id: BookId) -> Result<bool, StorageError> {
            Err(StorageError::connection_error("offline"))
        }

        async fn paged_query(&self, _request: &PageRequest) -> Result<PageSlice, StorageError> {
            let books = self.books.lock().unwrap().clone();
            let total = books.len();
            Ok(PageSlice::new(books, total))
        }

        async fn count(&self) -> Result<usize, StorageError> {
            Ok(self.books.lock().unwrap().len())
        }

        fn backend_name(&self) -> &'static str {
            "vec"
        }
    }

    #[tokio::test]
    async fn test_counts_each_operation() {
        let storage = InstrumentedStorage::new(VecStorage::default());
        let book = storage
            .insert(NewBook::new("Emma", "Jane Austen", "1", date!(1815 - 12 - 23)))
            .await
            .unwrap();

        assert_eq!(storage.get(book.id).await.unwrap(), Some(book.clone()));
        storage.get_all().await.unwrap();
        storage.paged_query(&PageRequest::new(1, 10)).await.unwrap();
        storage.paged_query(&PageRequest::new(2, 10)).await.unwrap();
        let changes = NewBook::new("Persuasion", "Jane Austen", "2", date!(1817 - 12 - 20));
        assert_eq!(storage.update(book.id, changes.into()).await.unwrap(), None);

        assert_eq!(
            storage.stats(),
            StorageStats {
                inserts: 1,
                reads: 2,
                updates: 1,
                deletes: 0,
                paged_queries: 2,
            }
        );
        assert_eq!(storage.backend_name(), "vec");
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_calls_are_counted_and_propagated() {
        let storage = InstrumentedStorage::new(VecStorage::default());
        let err = storage.delete(bookshelf_core::generate_id()).await.unwrap_err();

        assert!(matches!(err, StorageError::ConnectionError { .. }));
        assert_eq!(storage.stats().deletes, 1);
    }

    #[tokio::test]
    async fn test_wraps_a_shared_trait_object() {
        let backend: Arc<dyn BookStorage> = Arc::new(VecStorage::default());
        let storage = InstrumentedStorage::new(backend.clone());

        storage
            .insert(NewBook::new("Emma", "Jane Austen", "1", date!(1815 - 12 - 23)))
            .await
            .unwrap();

        // Writes through the wrapper land in the shared backend.
        assert_eq!(backend.count().await.unwrap(), 1);
        assert_eq!(storage.backend_name(), "vec");
        assert_eq!(storage.stats().inserts, 1);
    }
}
