// src/domain/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(i64),
    #[error("Tag not found: {0}")]
    TagNotFound(i64),
    #[error("Tag not found: {0:?}")]
    TagTitleNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
