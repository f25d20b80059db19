// src/infrastructure/sqlite/mod.rs
mod bookmarks;
mod connection;
mod schema;
mod tags;
mod users;

pub use bookmarks::SqliteBookmarkStore;
pub use connection::SqlitePool;
pub use tags::SqliteTagRegistry;
pub use users::{hash_token, SqliteUserStore};

use crate::domain::DomainError;
use rusqlite::ffi;

impl From<rusqlite::Error> for DomainError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            DomainError::Conflict(err.to_string())
        } else {
            DomainError::Storage(err.to_string())
        }
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
