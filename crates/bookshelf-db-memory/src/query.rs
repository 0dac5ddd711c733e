//! Filter, sort and paginate evaluation over a slice of books.

use bookshelf_core::Book;
use bookshelf_storage::{PageRequest, PageSlice};

/// Case-insensitive substring match against title, author and isbn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    pub fn new(term: &str) -> Self {
        Self {
            needle: term.to_lowercase(),
        }
    }

    /// Builds the filter for a request, or `None` when the search term is
    /// absent or blank.
    pub fn from_request(request: &PageRequest) -> Option<Self> {
        request.search_term().map(Self::new)
    }

    pub fn matches(&self, book: &Book) -> bool {
        [&book.title, &book.author, &book.isbn]
            .iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// Runs a page request against `books`, given in store order.
///
/// Filtering happens first, then a stable sort (ties keep store order), then
/// counting, then slicing. A page past the end yields no items but still
/// reports the full match count.
pub fn evaluate<'a, I>(books: I, request: &PageRequest) -> PageSlice
where
    I: IntoIterator<Item = &'a Book>,
{
    let filter = SearchFilter::from_request(request);
    let mut matching: Vec<&Book> = books
        .into_iter()
        .filter(|book| filter.as_ref().is_none_or(|f| f.matches(book)))
        .collect();

    let order = request.sort_order();
    matching.sort_by(|a, b| order.compare(a, b));

    let total_count = matching.len();
    let items = matching
        .into_iter()
        .skip(request.offset())
        .take(request.page_size as usize)
        .cloned()
        .collect();

    PageSlice::new(items, total_count)
}
