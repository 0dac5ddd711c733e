use crate::query::evaluate;
use bookshelf_core::{Book, BookChanges, BookId, NewBook, now_utc};
use bookshelf_storage::{PageRequest, PageSlice};
use tokio::sync::RwLock;

/// In-memory book storage backend.
///
/// This storage implementation provides:
/// - Insertion-ordered records in a single `Vec`
/// - Full CRUD operations
/// - Filtered, sorted and paginated queries
///
/// One coarse `RwLock` guards the collection. Writers are mutually exclusive
/// with each other and with the filter/sort pass of a paged query, so no
/// reader observes a half-applied mutation. Nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryBookStorage {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, input: NewBook) -> Book {
        let book = Book::create(input, now_utc());
        self.books.write().await.push(book.clone());
        book
    }

    pub async fn get(&self, id: BookId) -> Option<Book> {
        self.books.read().await.iter().find(|b| b.id == id).cloned()
    }

    pub async fn get_all(&self) -> Vec<Book> {
        self.books.read().await.clone()
    }

    pub async fn update(&self, id: BookId, changes: BookChanges) -> Option<Book> {
        let mut guard = self.books.write().await;
        let book = guard.iter_mut().find(|b| b.id == id)?;
        book.apply(changes, now_utc());
        Some(book.clone())
    }

    pub async fn delete(&self, id: BookId) -> bool {
        let mut guard = self.books.write().await;
        match guard.iter().position(|b| b.id == id) {
            Some(index) => {
                // `remove` rather than `swap_remove`: store order is the sort tie-break.
                guard.remove(index);
                true
            }
            None => false,
        }
    }

    pub async fn paged_query(&self, request: &PageRequest) -> PageSlice {
        let guard = self.books.read().await;
        evaluate(guard.iter(), request)
    }

    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }
}
