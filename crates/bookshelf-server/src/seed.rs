//! Demo catalog loaded at startup when `storage.seed_demo_data` is set.

use bookshelf_core::NewBook;
use bookshelf_storage::{BookStorage, StorageError};
use time::macros::date;

pub fn demo_books() -> Vec<NewBook> {
    vec![
        NewBook::new("Pride and Prejudice", "Jane Austen", "978-0141439518", date!(1813 - 01 - 28)),
        NewBook::new("Frankenstein", "Mary Shelley", "978-0486282114", date!(1818 - 01 - 01)),
        NewBook::new("Moby-Dick", "Herman Melville", "978-1503280786", date!(1851 - 10 - 18)),
        NewBook::new("Great Expectations", "Charles Dickens", "978-0141439563", date!(1861 - 08 - 01)),
        NewBook::new("War and Peace", "Leo Tolstoy", "978-1400079988", date!(1869 - 01 - 01)),
        NewBook::new("Middlemarch", "George Eliot", "978-0141439549", date!(1871 - 12 - 01)),
        NewBook::new("The Brothers Karamazov", "Fyodor Dostoevsky", "978-0374528379", date!(1880 - 11 - 01)),
        NewBook::new("Dracula", "Bram Stoker", "978-0486411095", date!(1897 - 05 - 26)),
        NewBook::new("The Great Gatsby", "F. Scott Fitzgerald", "978-0743273565", date!(1925 - 04 - 10)),
        NewBook::new("Brave New World", "Aldous Huxley", "978-0060850524", date!(1932 - 01 - 01)),
        NewBook::new("The Hobbit", "J. R. R. Tolkien", "978-0547928227", date!(1937 - 09 - 21)),
        NewBook::new("Nineteen Eighty-Four", "George Orwell", "978-0451524935", date!(1949 - 06 - 08)),
    ]
}

/// Inserts the demo catalog. Returns the number of books inserted.
pub async fn seed(storage: &dyn BookStorage) -> Result<usize, StorageError> {
    let books = demo_books();
    let count = books.len();
    for book in books {
        storage.insert(book).await?;
    }
    tracing::info!(count, backend = storage.backend_name(), "demo catalog seeded");
    Ok(count)
}
