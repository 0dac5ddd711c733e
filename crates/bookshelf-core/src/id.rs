use crate::error::{CoreError, Result};
use uuid::Uuid;

/// Identifier of a stored book. Generated once at insertion and never reused.
pub type BookId = Uuid;

pub fn generate_id() -> BookId {
    Uuid::new_v4()
}

/// Parses a textual book id, as received in a request path.
pub fn parse_id(raw: &str) -> Result<BookId> {
    Uuid::parse_str(raw.trim()).map_err(|_| CoreError::invalid_id(raw))
}
