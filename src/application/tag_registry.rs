// src/application/tag_registry.rs
use crate::domain::{DomainError, Tag};

/// Tag identity by title.
///
/// Titles match exactly (case-sensitive, untrimmed). Implementations must make
/// `find_or_create` atomic: two callers racing on the same title end up with
/// the same tag and never with two rows carrying that title.
pub trait TagRegistry: Send + Sync {
    /// Return the tag titled `title`, creating it on a miss.
    fn find_or_create(&self, title: &str) -> Result<Tag, DomainError>;

    fn find_by_title(&self, title: &str) -> Result<Tag, DomainError>;

    fn find_by_id(&self, id: i64) -> Result<Tag, DomainError>;

    /// All known tags ordered by title
    fn list_tags(&self) -> Result<Vec<Tag>, DomainError>;
}
