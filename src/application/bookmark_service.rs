// src/application/bookmark_service.rs
use crate::application::{BookmarkStore, ServiceError, ServiceResult, TagRegistry};
use crate::domain::{
    Bookmark, BookmarkPatch, BookmarkTagPair, DomainError, NewBookmark, OwnerId, Tag,
};
use tracing::{debug, info, instrument, warn};

/// Bookmark use cases.
///
/// Validates input, checks that the caller owns the bookmark before any
/// bookmark-scoped change, and turns `DomainError`s into `ServiceError`s.
/// Holds no state besides its collaborators.
pub struct BookmarkService<S: BookmarkStore, R: TagRegistry> {
    store: S,
    tags: R,
}

impl<S: BookmarkStore, R: TagRegistry> BookmarkService<S, R> {
    pub fn new(store: S, tags: R) -> Self {
        Self { store, tags }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn list_bookmarks(&self, owner: OwnerId) -> ServiceResult<Vec<Bookmark>> {
        Ok(self.store.list_all(owner)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_bookmark(&self, owner: OwnerId, id: i64) -> ServiceResult<Bookmark> {
        Ok(self.store.get_by_id(owner, id)?)
    }

    #[instrument(level = "debug", skip(self, request), fields(title = %request.title))]
    pub fn add_bookmark(&self, owner: OwnerId, request: &NewBookmark) -> ServiceResult<Bookmark> {
        validate_new_bookmark(request)?;
        let bookmark = self.store.create(owner, request)?;
        info!(%owner, bookmark_id = bookmark.id, "Added bookmark");
        Ok(bookmark)
    }

    #[instrument(level = "debug", skip(self, requests), fields(count = requests.len()))]
    pub fn add_bookmarks(
        &self,
        owner: OwnerId,
        requests: &[NewBookmark],
    ) -> ServiceResult<Vec<Bookmark>> {
        for request in requests {
            validate_new_bookmark(request)?;
        }
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let bookmarks = self.store.create_many(owner, requests)?;
        info!(%owner, count = bookmarks.len(), "Added bookmarks");
        Ok(bookmarks)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn update_bookmark(
        &self,
        owner: OwnerId,
        id: i64,
        patch: &BookmarkPatch,
    ) -> ServiceResult<Bookmark> {
        if matches!(patch.title.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(ServiceError::Validation("title must not be empty".to_string()));
        }
        if matches!(patch.url.as_deref(), Some(u) if u.trim().is_empty()) {
            return Err(ServiceError::Validation("url must not be empty".to_string()));
        }
        if patch.is_empty() {
            debug!(bookmark_id = id, "Empty patch, returning bookmark unchanged");
            return Ok(self.store.get_by_id(owner, id)?);
        }
        self.ensure_owned(owner, id)?;
        Ok(self.store.update(owner, id, patch)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete_bookmark(&self, owner: OwnerId, id: i64) -> ServiceResult<()> {
        self.ensure_owned(owner, id)?;
        self.store.delete_by_id(owner, id)?;
        info!(%owner, bookmark_id = id, "Deleted bookmark");
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete_all_bookmarks(&self, owner: OwnerId) -> ServiceResult<usize> {
        let deleted = self.store.delete_all(owner)?;
        info!(%owner, deleted, "Deleted all bookmarks");
        Ok(deleted)
    }

    /// Attach a tag by title, creating the tag when no tag has that title.
    ///
    /// A write conflict from a concurrent creator of the same title is retried
    /// once; the second attempt finds the row the other writer committed.
    #[instrument(level = "debug", skip(self))]
    pub fn add_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> ServiceResult<Bookmark> {
        validate_tag_title(title)?;
        self.ensure_owned(owner, bookmark_id)?;
        let bookmark = match self.store.attach_tag_by_title(owner, bookmark_id, title) {
            Err(DomainError::Conflict(reason)) => {
                warn!(%reason, title, "Tag creation raced, retrying");
                self.store
                    .attach_tag_by_title(owner, bookmark_id, title)
                    .inspect_err(|e| warn!(error = %e, title, "Tag attach failed after retry"))?
            }
            other => other?,
        };
        Ok(bookmark)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn add_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> ServiceResult<BookmarkTagPair> {
        self.ensure_owned(owner, bookmark_id)?;
        let (bookmark, tag) = self.store.attach_tag_by_id(owner, bookmark_id, tag_id)?;
        Ok(BookmarkTagPair { bookmark, tag })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> ServiceResult<Bookmark> {
        self.ensure_owned(owner, bookmark_id)?;
        Ok(self.store.detach_tag_by_title(owner, bookmark_id, title)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> ServiceResult<Bookmark> {
        self.ensure_owned(owner, bookmark_id)?;
        Ok(self.store.detach_tag_by_id(owner, bookmark_id, tag_id)?)
    }

    /// Find or create a tag for each title, in request order. Repeated titles
    /// yield one tag. Every title is validated before any tag is written.
    #[instrument(level = "debug", skip(self, titles), fields(count = titles.len()))]
    pub fn create_tags(&self, titles: &[String]) -> ServiceResult<Vec<Tag>> {
        for title in titles {
            validate_tag_title(title)?;
        }
        let mut tags: Vec<Tag> = Vec::with_capacity(titles.len());
        for title in titles {
            if tags.iter().any(|t| t.has_title(title)) {
                continue;
            }
            tags.push(self.tags.find_or_create(title)?);
        }
        debug!(count = tags.len(), "Ensured tags");
        Ok(tags)
    }

    pub fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        Ok(self.tags.list_tags()?)
    }

    pub fn get_tag(&self, id: i64) -> ServiceResult<Tag> {
        Ok(self.tags.find_by_id(id)?)
    }

    pub fn get_tag_by_title(&self, title: &str) -> ServiceResult<Tag> {
        Ok(self.tags.find_by_title(title)?)
    }

    fn ensure_owned(&self, owner: OwnerId, bookmark_id: i64) -> ServiceResult<()> {
        self.store.get_by_id(owner, bookmark_id).map_err(|e| {
            debug!(%owner, bookmark_id, error = %e, "Ownership check failed");
            ServiceError::from(e)
        })?;
        Ok(())
    }
}

fn validate_new_bookmark(request: &NewBookmark) -> ServiceResult<()> {
    if request.title.trim().is_empty() {
        return Err(ServiceError::Validation("title is required".to_string()));
    }
    if request.url.trim().is_empty() {
        return Err(ServiceError::Validation("url is required".to_string()));
    }
    Ok(())
}

// Tag titles are matched literally, so only the empty title is rejected.
fn validate_tag_title(title: &str) -> ServiceResult<()> {
    if title.is_empty() {
        return Err(ServiceError::Validation("tag title is required".to_string()));
    }
    Ok(())
}
