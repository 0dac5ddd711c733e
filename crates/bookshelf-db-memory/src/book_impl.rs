//! `BookStorage` trait implementation for `InMemoryBookStorage`.

use async_trait::async_trait;
use bookshelf_core::{Book, BookChanges, BookId, NewBook};
use bookshelf_storage::{BookStorage, PageRequest, PageSlice, StorageError};

use crate::storage::InMemoryBookStorage;

#[async_trait]
impl BookStorage for InMemoryBookStorage {
    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        Ok(InMemoryBookStorage::insert(self, book).await)
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        Ok(InMemoryBookStorage::get(self, id).await)
    }

    async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
        Ok(InMemoryBookStorage::get_all(self).await)
    }

    async fn update(
        &self,
        id: BookId,
        changes: BookChanges,
    ) -> Result<Option<Book>, StorageError> {
        Ok(InMemoryBookStorage::update(self, id, changes).await)
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        Ok(InMemoryBookStorage::delete(self, id).await)
    }

    async fn paged_query(&self, request: &PageRequest) -> Result<PageSlice, StorageError> {
        Ok(InMemoryBookStorage::paged_query(self, request).await)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(InMemoryBookStorage::count(self).await)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
