//! Persistence backends for the repository traits.

mod sqlite;

pub use sqlite::SqliteStore;
