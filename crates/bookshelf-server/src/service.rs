//! Book catalog service: the façade API handlers talk to.
//!
//! Reads of paged listings go through [`PagedQueryCache`]; every successful
//! write drops all cached pages so no listing predates the write.

use std::sync::Arc;

use bookshelf_core::{Book, BookChanges, BookId, NewBook};
use bookshelf_storage::{BookStorage, PageRequest, PagedResult, StorageError};
use tracing::{debug, info};

use crate::cache::{CacheStats, PagedQueryCache};

pub struct BookService {
    storage: Arc<dyn BookStorage>,
    cache: PagedQueryCache,
}

impl BookService {
    pub fn new(storage: Arc<dyn BookStorage>, cache: PagedQueryCache) -> Self {
        Self { storage, cache }
    }

    /// Returns one page of books, served from cache when a live entry exists.
    ///
    /// The request is expected to be validated already.
    pub async fn get_paged(&self, request: &PageRequest) -> Result<PagedResult, StorageError> {
        if let Some(cached) = self.cache.get(request) {
            return Ok(cached);
        }

        // Taken before the snapshot: a write landing in between makes the page
        // uncacheable.
        let generation = self.cache.generation();
        let slice = self.storage.paged_query(request).await?;
        let result = PagedResult::from_slice(request, slice);
        let cached = self.cache.set(request, &result, generation);
        debug!(
            page = result.page,
            page_size = result.page_size,
            total_count = result.total_count,
            cached,
            "paged query computed"
        );
        Ok(result)
    }

    pub async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        self.storage.get(id).await
    }

    /// Stores a new book and invalidates every cached page.
    pub async fn create(&self, input: NewBook) -> Result<Book, StorageError> {
        let book = self.storage.insert(input).await?;
        let invalidated = self.cache.invalidate_all();
        info!(book_id = %book.id, title = %book.title, invalidated, "book created");
        Ok(book)
    }

    /// Replaces a book's fields. Cached pages are invalidated only when the
    /// book existed.
    pub async fn update(
        &self,
        id: BookId,
        changes: BookChanges,
    ) -> Result<Option<Book>, StorageError> {
        let updated = self.storage.update(id, changes).await?;
        if updated.is_some() {
            let invalidated = self.cache.invalidate_all();
            info!(book_id = %id, invalidated, "book updated");
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        let deleted = self.storage.delete(id).await?;
        if deleted {
            let invalidated = self.cache.invalidate_all();
            info!(book_id = %id, invalidated, "book deleted");
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<usize, StorageError> {
        self.storage.count().await
    }

    /// Drops expired cache entries. Never touches the catalog.
    pub fn purge_expired_cache(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;
    use async_trait::async_trait;
    use bookshelf_db_memory::InMemoryBookStorage;
    use bookshelf_storage::{InstrumentedStorage, PageSlice};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use time::macros::date;
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    type Counted = Arc<InstrumentedStorage<InMemoryBookStorage>>;

    fn new_book(title: &str) -> NewBook {
        NewBook::new(title, "Test Author", "978-0000000000", date!(2000 - 01 - 01))
    }

    async fn service_with(count: usize) -> (BookService, Counted) {
        let storage = Arc::new(InstrumentedStorage::new(InMemoryBookStorage::new()));
        for i in 0..count {
            storage.inner().insert(new_book(&format!("Book {i:02}"))).await;
        }
        let cache = PagedQueryCache::new(CacheBackend::new(), Duration::from_secs(30));
        let service = BookService::new(storage.clone(), cache);
        (service, storage)
    }

    #[tokio::test(start_paused = true)]
    async fn test_seven_records_page_size_five() {
        let (service, _) = service_with(7).await;

        let first = service.get_paged(&PageRequest::new(1, 5)).await.unwrap();
        assert_eq!(first.items.len(), 5);
        assert_eq!(first.total_count, 7);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.page, 1);
        assert_eq!(first.page_size, 5);

        let second = service.get_paged(&PageRequest::new(2, 5)).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total_pages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_past_end() {
        let (service, _) = service_with(7).await;
        let result = service.get_paged(&PageRequest::new(5, 5)).await.unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 7);
        assert_eq!(result.total_pages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_pages_is_ceiling() {
        let (service, _) = service_with(23).await;
        for page_size in [1u32, 2, 5, 7, 10, 23, 24, 100] {
            let result = service
                .get_paged(&PageRequest::new(1, page_size))
                .await
                .unwrap();
            assert_eq!(result.total_pages, 23usize.div_ceil(page_size as usize));
            assert!(result.items.len() <= page_size as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_identical_call_is_served_from_cache() {
        let (service, storage) = service_with(7).await;
        let request = PageRequest::new(1, 5).with_search("book");

        let first = service.get_paged(&request).await.unwrap();
        let second = service.get_paged(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.stats().paged_queries, 1);
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equivalent_requests_share_cache_entry() {
        let (service, storage) = service_with(3).await;

        service.get_paged(&PageRequest::new(1, 10)).await.unwrap();
        service
            .get_paged(&PageRequest::new(1, 10).with_sort("unknown", true))
            .await
            .unwrap();

        assert_eq!(storage.stats().paged_queries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_invalidates_cached_pages() {
        let (service, storage) = service_with(7).await;
        let request = PageRequest::new(1, 5);

        let before = service.get_paged(&request).await.unwrap();
        assert_eq!(before.total_count, 7);

        service.create(new_book("Another Book")).await.unwrap();

        let after = service.get_paged(&request).await.unwrap();
        assert_eq!(after.total_count, 8);
        assert_eq!(after.total_pages, 2);
        assert_eq!(storage.stats().paged_queries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_and_delete_invalidate_only_on_change() {
        let (service, storage) = service_with(2).await;
        let request = PageRequest::new(1, 10);
        let target = service.get_paged(&request).await.unwrap().items[0].clone();

        // Misses leave the cache alone.
        let missing = bookshelf_core::generate_id();
        assert!(!service.delete(missing).await.unwrap());
        assert!(
            service
                .update(missing, new_book("Ghost").into())
                .await
                .unwrap()
                .is_none()
        );
        service.get_paged(&request).await.unwrap();
        assert_eq!(storage.stats().paged_queries, 1);

        let updated = service
            .update(target.id, new_book("Renamed").into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        let page = service.get_paged(&request).await.unwrap();
        assert!(page.items.iter().any(|b| b.title == "Renamed"));
        assert_eq!(storage.stats().paged_queries, 2);

        assert!(service.delete(target.id).await.unwrap());
        let page = service.get_paged(&request).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(storage.stats().paged_queries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_page_lives_for_ttl() {
        let (service, storage) = service_with(7).await;
        let request = PageRequest::new(1, 5);

        service.get_paged(&request).await.unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        service.get_paged(&request).await.unwrap();
        assert_eq!(storage.stats().paged_queries, 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        service.get_paged(&request).await.unwrap();
        assert_eq!(storage.stats().paged_queries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_by_id() {
        let (service, _) = service_with(0).await;
        let created = service.create(new_book("Dune")).await.unwrap();

        assert_eq!(service.get_by_id(created.id).await.unwrap(), Some(created));
        assert_eq!(
            service
                .get_by_id(bookshelf_core::generate_id())
                .await
                .unwrap(),
            None
        );
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_core_accepts_unvalidated_input() {
        let (service, _) = service_with(0).await;
        let created = service
            .create(NewBook::new("AB", "", "", date!(2999 - 01 - 01)))
            .await
            .unwrap();
        assert_eq!(created.title, "AB");
    }

    /// Backend whose every call fails, to check errors are not cached.
    struct Unavailable;

    #[async_trait]
    impl BookStorage for Unavailable {
        async fn insert(&self, _book: NewBook) -> Result<Book, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn get(&self, _id: BookId) -> Result<Option<Book>, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn update(
            &self,
            _id: BookId,
            _changes: BookChanges,
        ) -> Result<Option<Book>, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn delete(&self, _id: BookId) -> Result<bool, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn paged_query(&self, _request: &PageRequest) -> Result<PageSlice, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        async fn count(&self) -> Result<usize, StorageError> {
            Err(StorageError::connection_error("down"))
        }
        fn backend_name(&self) -> &'static str {
            "unavailable"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_errors_propagate_and_are_not_cached() {
        let cache = PagedQueryCache::new(CacheBackend::new(), Duration::from_secs(30));
        let service = BookService::new(Arc::new(Unavailable), cache);

        let err = service
            .get_paged(&PageRequest::new(1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConnectionError { .. }));
        assert_eq!(service.cache_stats().entries, 0);
        assert_eq!(service.backend_name(), "unavailable");
    }

    /// In-memory store whose next paged query, once armed, parks after taking
    /// its snapshot until released.
    #[derive(Default)]
    struct Gated {
        inner: InMemoryBookStorage,
        armed: AtomicBool,
        parked: Notify,
        release: Notify,
    }

    #[async_trait]
    impl BookStorage for Gated {
        async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
            Ok(self.inner.insert(book).await)
        }
        async fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
            Ok(self.inner.get(id).await)
        }
        async fn get_all(&self) -> Result<Vec<Book>, StorageError> {
            Ok(self.inner.get_all().await)
        }
        async fn update(
            &self,
            id: BookId,
            changes: BookChanges,
        ) -> Result<Option<Book>, StorageError> {
            Ok(self.inner.update(id, changes).await)
        }
        async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
            Ok(self.inner.delete(id).await)
        }
        async fn paged_query(&self, request: &PageRequest) -> Result<PageSlice, StorageError> {
            let slice = self.inner.paged_query(request).await;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.parked.notify_one();
                self.release.notified().await;
            }
            Ok(slice)
        }
        async fn count(&self) -> Result<usize, StorageError> {
            Ok(self.inner.count().await)
        }
        fn backend_name(&self) -> &'static str {
            "gated"
        }
    }

    fn gated_service() -> (Arc<BookService>, Arc<Gated>) {
        let storage = Arc::new(Gated::default());
        let cache = PagedQueryCache::new(CacheBackend::new(), Duration::from_secs(30));
        (Arc::new(BookService::new(storage.clone(), cache)), storage)
    }

    /// Starts a cache-missing read and waits until it holds its snapshot.
    async fn parked_read(
        service: &Arc<BookService>,
        storage: &Gated,
        request: &PageRequest,
    ) -> JoinHandle<Result<PagedResult, StorageError>> {
        storage.armed.store(true, Ordering::SeqCst);
        let reader = {
            let service = service.clone();
            let request = request.clone();
            tokio::spawn(async move { service.get_paged(&request).await })
        };
        storage.parked.notified().await;
        reader
    }

    #[tokio::test]
    async fn test_read_racing_create_does_not_cache_its_snapshot() {
        let (service, storage) = gated_service();
        let request = PageRequest::new(1, 10);

        let reader = parked_read(&service, &storage, &request).await;
        service.create(new_book("Dune")).await.unwrap();
        storage.release.notify_one();

        // The racing read answers from its own snapshot...
        assert_eq!(reader.await.unwrap().unwrap().total_count, 0);
        // ...but later reads see the write.
        let next = service.get_paged(&request).await.unwrap();
        assert_eq!(next.total_count, 1);
        assert_eq!(service.cache_stats().entries, 1);
    }

    #[tokio::test]
    async fn test_read_racing_update_or_delete_does_not_cache_its_snapshot() {
        let (service, storage) = gated_service();
        let request = PageRequest::new(1, 10);
        let book = service.create(new_book("Dune")).await.unwrap();

        let reader = parked_read(&service, &storage, &request).await;
        service
            .update(book.id, new_book("Dune Messiah").into())
            .await
            .unwrap();
        storage.release.notify_one();
        assert_eq!(reader.await.unwrap().unwrap().items[0].title, "Dune");
        let next = service.get_paged(&request).await.unwrap();
        assert_eq!(next.items[0].title, "Dune Messiah");

        // Drop the entry cached by the read above so the next read misses.
        service.create(new_book("Emma")).await.unwrap();
        let reader = parked_read(&service, &storage, &request).await;
        assert!(service.delete(book.id).await.unwrap());
        storage.release.notify_one();
        assert_eq!(reader.await.unwrap().unwrap().total_count, 2);
        assert_eq!(service.get_paged(&request).await.unwrap().total_count, 1);
    }
}
