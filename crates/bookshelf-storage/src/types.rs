//! Storage types for the book storage abstraction layer.
//!
//! This module defines the query vocabulary shared by backends and callers.

use bookshelf_core::Book;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fields a page of books can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Author,
    Isbn,
    PublishedDate,
    CreatedAt,
}

impl SortField {
    /// Resolves a caller-supplied field name.
    ///
    /// Matching ignores ASCII case as well as `_` and `-` separators, so
    /// `publishedDate`, `published_date` and `PUBLISHED-DATE` all resolve to
    /// [`SortField::PublishedDate`]. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "isbn" => Some(Self::Isbn),
            "publisheddate" => Some(Self::PublishedDate),
            "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Isbn => "isbn",
            Self::PublishedDate => "publisheddate",
            Self::CreatedAt => "createdat",
        }
    }

    /// Ascending comparison of two books by this field.
    ///
    /// Strings compare by their ordinal (byte) order.
    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            Self::Title => a.title.cmp(&b.title),
            Self::Author => a.author.cmp(&b.author),
            Self::Isbn => a.isbn.cmp(&b.isbn),
            Self::PublishedDate => a.published_date.cmp(&b.published_date),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordering a page request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: SortField,
    pub descending: bool,
}

impl SortOrder {
    /// Title ascending, used whenever the requested field is absent or unknown.
    pub const DEFAULT: SortOrder = SortOrder {
        field: SortField::Title,
        descending: false,
    };

    /// Resolves the requested field and direction.
    ///
    /// The descending flag only applies to recognized fields; an unknown or
    /// missing field always falls back to [`SortOrder::DEFAULT`].
    pub fn resolve(sort_by: Option<&str>, descending: bool) -> Self {
        match sort_by.and_then(SortField::parse) {
            Some(field) => Self { field, descending },
            None => Self::DEFAULT,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        let ordering = self.field.compare(a, b);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pagination parameters for a paged query.
///
/// Values are expected to be validated by the caller (`page >= 1`,
/// `1 <= page_size <= 100`); backends do not re-check them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, rename = "desc")]
    pub descending: bool,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            search: None,
            sort_by: None,
            descending: false,
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: impl Into<String>, descending: bool) -> Self {
        self.sort_by = Some(sort_by.into());
        self.descending = descending;
        self
    }

    /// The search term, if one is set and not blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::resolve(self.sort_by.as_deref(), self.descending)
    }

    /// Number of matching items preceding this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }
}

/// One page of books as produced by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSlice {
    pub items: Vec<Book>,
    /// Matches after filtering, before pagination.
    pub total_count: usize,
}

impl PageSlice {
    pub fn new(items: Vec<Book>, total_count: usize) -> Self {
        Self { items, total_count }
    }
}

/// A page of books together with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub items: Vec<Book>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
    pub total_pages: usize,
}

impl PagedResult {
    /// Wraps a backend slice, echoing the request's page and page size.
    pub fn from_slice(request: &PageRequest, slice: PageSlice) -> Self {
        let total_pages = match request.page_size {
            0 => 0,
            size => slice.total_count.div_ceil(size as usize),
        };
        Self {
            items: slice.items,
            page: request.page,
            page_size: request.page_size,
            total_count: slice.total_count,
            total_pages,
        }
    }

    /// Returns the number of items in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
