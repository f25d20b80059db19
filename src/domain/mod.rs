// src/domain/mod.rs
pub mod bookmark;
pub mod error;
pub mod tag;
pub mod user;

pub use bookmark::{Bookmark, BookmarkPatch, BookmarkTagPair, NewBookmark};
pub use error::DomainError;
pub use tag::Tag;
pub use user::{OwnerId, User};
