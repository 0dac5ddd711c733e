//! Request validation for the HTTP layer.
//!
//! The catalog service assumes validated input; handlers run these checks
//! first and reject the request with every violation listed.

use bookshelf_core::{BookChanges, NewBook};
use bookshelf_storage::PageRequest;
use serde::Serialize;
use time::Date;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const MIN_NAME_CHARS: usize = 3;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collector for rule violations.
#[derive(Debug, Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.0.push(Violation::new(field, message));
        }
    }

    fn finish(self) -> Result<(), Vec<Violation>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

pub fn validate_page_request(request: &PageRequest) -> Result<(), Vec<Violation>> {
    let mut v = Violations::default();
    v.check(request.page >= 1, "page", "page must be >= 1");
    v.check(
        (1..=MAX_PAGE_SIZE).contains(&request.page_size),
        "pageSize",
        format!("pageSize must be between 1 and {MAX_PAGE_SIZE}"),
    );
    v.finish()
}

pub fn validate_new_book(input: &NewBook, today: Date) -> Result<(), Vec<Violation>> {
    validate_fields(
        &input.title,
        &input.author,
        &input.isbn,
        input.published_date,
        today,
    )
}

pub fn validate_book_changes(changes: &BookChanges, today: Date) -> Result<(), Vec<Violation>> {
    validate_fields(
        &changes.title,
        &changes.author,
        &changes.isbn,
        changes.published_date,
        today,
    )
}

fn validate_fields(
    title: &str,
    author: &str,
    isbn: &str,
    published_date: Date,
    today: Date,
) -> Result<(), Vec<Violation>> {
    let mut v = Violations::default();
    v.check(
        title.trim().chars().count() >= MIN_NAME_CHARS,
        "title",
        format!("title must be at least {MIN_NAME_CHARS} characters"),
    );
    v.check(
        author.trim().chars().count() >= MIN_NAME_CHARS,
        "author",
        format!("author must be at least {MIN_NAME_CHARS} characters"),
    );
    v.check(!isbn.trim().is_empty(), "isbn", "isbn is required");
    v.check(
        published_date <= today,
        "publishedDate",
        "publishedDate must not be in the future",
    );
    v.finish()
}
