// src/infrastructure/mod.rs
pub mod sqlite;

pub use sqlite::{SqliteBookmarkStore, SqlitePool, SqliteTagRegistry, SqliteUserStore};
