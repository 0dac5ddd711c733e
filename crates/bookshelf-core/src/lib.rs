pub mod book;
pub mod error;
pub mod id;
pub mod time;

pub use book::{Book, BookChanges, NewBook};
pub use error::{CoreError, Result};
pub use id::{BookId, generate_id, parse_id};
pub use time::{now_utc, today_utc};
