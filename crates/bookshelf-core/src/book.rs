//! Book records and the inputs that create or change them.

use crate::id::{BookId, generate_id};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// A book as held by the store.
///
/// `id` and `created_at` are assigned on insertion and never change afterwards;
/// `updated_at` stays `None` until the first update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(with = "iso_date")]
    pub published_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Book {
    /// Materializes a new record with a fresh id, stamped with `created_at`.
    pub fn create(input: NewBook, created_at: OffsetDateTime) -> Self {
        Self {
            id: generate_id(),
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            published_date: input.published_date,
            created_at,
            updated_at: None,
        }
    }

    /// Replaces the mutable fields and stamps `updated_at`.
    pub fn apply(&mut self, changes: BookChanges, updated_at: OffsetDateTime) {
        self.title = changes.title;
        self.author = changes.author;
        self.isbn = changes.isbn;
        self.published_date = changes.published_date;
        self.updated_at = Some(updated_at);
    }
}

/// Input for creating a book. Any id supplied by a client is not part of this
/// type and therefore dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(with = "iso_date")]
    pub published_date: Date,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        published_date: Date,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            published_date,
        }
    }
}

/// Full replacement of a book's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(with = "iso_date")]
    pub published_date: Date,
}

impl From<NewBook> for BookChanges {
    fn from(input: NewBook) -> Self {
        Self {
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            published_date: input.published_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, datetime};

    fn dune() -> NewBook {
        NewBook::new("Dune", "Frank Herbert", "978-0441013593", date!(1965 - 08 - 01))
    }

    #[test]
    fn test_create_assigns_identity() {
        let created_at = datetime!(2024-01-01 10:00 UTC);
        let book = Book::create(dune(), created_at);

        assert_eq!(book.title, "Dune");
        assert_eq!(book.created_at, created_at);
        assert!(book.updated_at.is_none());
        assert_ne!(book.id, Book::create(dune(), created_at).id);
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut book = Book::create(dune(), datetime!(2024-01-01 10:00 UTC));
        let id = book.id;
        let changes = BookChanges {
            title: "Dune Messiah".into(),
            author: "Frank Herbert".into(),
            isbn: "978-0593098233".into(),
            published_date: date!(1969 - 01 - 01),
        };
        book.apply(changes, datetime!(2024-02-01 09:30 UTC));

        assert_eq!(book.id, id);
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.created_at, datetime!(2024-01-01 10:00 UTC));
        assert_eq!(book.updated_at, Some(datetime!(2024-02-01 09:30 UTC)));
    }

    #[test]
    fn test_json_shape() {
        let book = Book::create(dune(), datetime!(2024-01-01 10:00 UTC));
        let value = serde_json::to_value(&book).unwrap();

        assert_eq!(value["publishedDate"], json!("1965-08-01"));
        assert_eq!(value["createdAt"], json!("2024-01-01T10:00:00Z"));
        assert_eq!(value["updatedAt"], json!(null));
        assert_eq!(value["id"], json!(book.id.to_string()));
    }

    #[test]
    fn test_new_book_ignores_client_id() {
        let input: NewBook = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": "978-0441013593",
            "publishedDate": "1965-08-01"
        }))
        .unwrap();
        assert_eq!(input, dune());
    }

    #[test]
    fn test_messagepack_roundtrip() {
        let book = Book::create(dune(), datetime!(2024-01-01 10:00 UTC));
        let bytes = rmp_serde::to_vec(&book).unwrap();
        let back: Book = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, book);
    }
}
