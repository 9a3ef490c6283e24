//! Noor Store: SQLite corpus of verses plus the question / citation audit trail.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
