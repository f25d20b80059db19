// src/application/bookmark_store.rs
use crate::domain::{Bookmark, BookmarkPatch, DomainError, NewBookmark, OwnerId, Tag};

/// Persistence for bookmarks and their tag associations.
///
/// Every operation is scoped to an owner. A bookmark belonging to someone else
/// is reported as `BookmarkNotFound`, exactly like a missing one.
pub trait BookmarkStore: Send + Sync {
    /// Insert a bookmark and attach the tags named by `request.tag_ids`.
    /// Fails with `TagNotFound` (leaving nothing behind) if any id is unknown.
    fn create(&self, owner: OwnerId, request: &NewBookmark) -> Result<Bookmark, DomainError>;

    /// Like `create` for every request, in a single unit of work: either all
    /// bookmarks are stored or none are.
    fn create_many(
        &self,
        owner: OwnerId,
        requests: &[NewBookmark],
    ) -> Result<Vec<Bookmark>, DomainError>;

    fn get_by_id(&self, owner: OwnerId, id: i64) -> Result<Bookmark, DomainError>;

    fn list_all(&self, owner: OwnerId) -> Result<Vec<Bookmark>, DomainError>;

    fn update(
        &self,
        owner: OwnerId,
        id: i64,
        patch: &BookmarkPatch,
    ) -> Result<Bookmark, DomainError>;

    /// Remove the bookmark's tag associations, then the bookmark itself.
    fn delete_by_id(&self, owner: OwnerId, id: i64) -> Result<(), DomainError>;

    /// Delete every bookmark of `owner` and return how many were removed
    fn delete_all(&self, owner: OwnerId) -> Result<usize, DomainError>;

    /// Attach the tag titled `title`, creating it if needed. Attaching a title
    /// the bookmark already carries returns the bookmark unchanged.
    fn attach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError>;

    fn attach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<(Bookmark, Tag), DomainError>;

    /// Detaching a title the bookmark does not carry is a no-op.
    fn detach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError>;

    /// Detaching a tag id the bookmark does not carry is a no-op.
    fn detach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<Bookmark, DomainError>;
}
