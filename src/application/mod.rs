// src/application/mod.rs
pub mod bookmark_service;
pub mod bookmark_store;
pub mod error;
pub mod tag_registry;

pub use bookmark_service::BookmarkService;
pub use bookmark_store::BookmarkStore;
pub use error::{ServiceError, ServiceResult};
pub use tag_registry::TagRegistry;
