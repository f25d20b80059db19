// src/util/testing.rs

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::{BookmarkStore, TagRegistry};
use crate::domain::{Bookmark, BookmarkPatch, DomainError, NewBookmark, OwnerId, Tag};

struct StoredBookmark {
    owner: OwnerId,
    title: String,
    url: String,
}

#[derive(Default)]
struct MockState {
    bookmarks: BTreeMap<i64, StoredBookmark>,
    tags: BTreeMap<i64, String>,
    // (bookmark_id, tag_id)
    links: BTreeSet<(i64, i64)>,
    next_bookmark_id: i64,
    next_tag_id: i64,
    attach_conflicts: usize,
    storage_failure: bool,
}

impl MockState {
    fn check_available(&self) -> Result<(), DomainError> {
        if self.storage_failure {
            return Err(DomainError::Storage("simulated storage failure".to_string()));
        }
        Ok(())
    }

    fn owned(&self, owner: OwnerId, id: i64) -> Result<&StoredBookmark, DomainError> {
        self.bookmarks
            .get(&id)
            .filter(|b| b.owner == owner)
            .ok_or(DomainError::BookmarkNotFound(id))
    }

    fn tag(&self, id: i64) -> Result<Tag, DomainError> {
        self.tags
            .get(&id)
            .map(|title| Tag::new(id, title.clone()))
            .ok_or(DomainError::TagNotFound(id))
    }

    fn tag_by_title(&self, title: &str) -> Option<Tag> {
        self.tags
            .iter()
            .find(|(_, t)| t.as_str() == title)
            .map(|(id, t)| Tag::new(*id, t.clone()))
    }

    fn find_or_create_tag(&mut self, title: &str) -> Tag {
        if let Some(tag) = self.tag_by_title(title) {
            return tag;
        }
        self.next_tag_id += 1;
        self.tags.insert(self.next_tag_id, title.to_string());
        Tag::new(self.next_tag_id, title)
    }

    fn assemble(&self, id: i64) -> Result<Bookmark, DomainError> {
        let stored = self
            .bookmarks
            .get(&id)
            .ok_or(DomainError::BookmarkNotFound(id))?;
        let tags: BTreeSet<Tag> = self
            .links
            .iter()
            .filter(|(bookmark_id, _)| *bookmark_id == id)
            .map(|(_, tag_id)| self.tag(*tag_id))
            .collect::<Result<_, DomainError>>()?;
        Ok(Bookmark {
            id,
            title: stored.title.clone(),
            url: stored.url.clone(),
            owner: stored.owner,
            tags,
        })
    }

    fn insert(&mut self, owner: OwnerId, request: &NewBookmark) -> i64 {
        self.next_bookmark_id += 1;
        let id = self.next_bookmark_id;
        self.bookmarks.insert(
            id,
            StoredBookmark {
                owner,
                title: request.title.clone(),
                url: request.url.clone(),
            },
        );
        for tag_id in &request.tag_ids {
            self.links.insert((id, *tag_id));
        }
        id
    }
}

/// In-memory stand-in for both `BookmarkStore` and `TagRegistry`.
///
/// Bookmarks, tags and the join relation live in separate maps, mirroring the
/// relational layout. Clones share state, so one mock can back both
/// collaborators of a `BookmarkService`.
///
/// # Examples
///
/// ```
/// use findfirst::application::BookmarkService;
/// use findfirst::domain::OwnerId;
/// use findfirst::util::testing::MockBookmarkStore;
///
/// let mock = MockBookmarkStore::builder()
///     .with_tag(5, "rust")
///     .with_bookmark(1, OwnerId(1), "Docs", "docs.rs")
///     .build();
/// let service = BookmarkService::new(mock.clone(), mock);
/// let pair = service.add_tag_by_id(OwnerId(1), 1, 5).unwrap();
/// assert!(pair.bookmark.has_tag("rust"));
/// ```
#[derive(Clone)]
pub struct MockBookmarkStore {
    state: Arc<Mutex<MockState>>,
}

impl MockBookmarkStore {
    pub fn builder() -> MockBookmarkStoreBuilder {
        MockBookmarkStoreBuilder::new()
    }

    pub fn bookmark_count(&self) -> usize {
        self.state.lock().bookmarks.len()
    }

    pub fn tag_count(&self) -> usize {
        self.state.lock().tags.len()
    }
}

impl BookmarkStore for MockBookmarkStore {
    fn create(&self, owner: OwnerId, request: &NewBookmark) -> Result<Bookmark, DomainError> {
        self.create_many(owner, std::slice::from_ref(request))
            .map(|mut created| created.remove(0))
    }

    fn create_many(
        &self,
        owner: OwnerId,
        requests: &[NewBookmark],
    ) -> Result<Vec<Bookmark>, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        for request in requests {
            for tag_id in &request.tag_ids {
                state.tag(*tag_id)?;
            }
        }
        let ids: Vec<i64> = requests.iter().map(|r| state.insert(owner, r)).collect();
        ids.into_iter().map(|id| state.assemble(id)).collect()
    }

    fn get_by_id(&self, owner: OwnerId, id: i64) -> Result<Bookmark, DomainError> {
        let state = self.state.lock();
        state.check_available()?;
        state.owned(owner, id)?;
        state.assemble(id)
    }

    fn list_all(&self, owner: OwnerId) -> Result<Vec<Bookmark>, DomainError> {
        let state = self.state.lock();
        state.check_available()?;
        state
            .bookmarks
            .iter()
            .filter(|(_, b)| b.owner == owner)
            .map(|(id, _)| state.assemble(*id))
            .collect()
    }

    fn update(
        &self,
        owner: OwnerId,
        id: i64,
        patch: &BookmarkPatch,
    ) -> Result<Bookmark, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, id)?;
        if let Some(stored) = state.bookmarks.get_mut(&id) {
            if let Some(title) = &patch.title {
                stored.title = title.clone();
            }
            if let Some(url) = &patch.url {
                stored.url = url.clone();
            }
        }
        state.assemble(id)
    }

    fn delete_by_id(&self, owner: OwnerId, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, id)?;
        state.links.retain(|(bookmark_id, _)| *bookmark_id != id);
        state.bookmarks.remove(&id);
        Ok(())
    }

    fn delete_all(&self, owner: OwnerId) -> Result<usize, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        let doomed: BTreeSet<i64> = state
            .bookmarks
            .iter()
            .filter(|(_, b)| b.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        state.links.retain(|(bookmark_id, _)| !doomed.contains(bookmark_id));
        state.bookmarks.retain(|id, _| !doomed.contains(id));
        Ok(doomed.len())
    }

    fn attach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, bookmark_id)?;
        if state.attach_conflicts > 0 {
            state.attach_conflicts -= 1;
            return Err(DomainError::Conflict(format!("tag {title:?} created concurrently")));
        }
        let tag = state.find_or_create_tag(title);
        state.links.insert((bookmark_id, tag.id));
        state.assemble(bookmark_id)
    }

    fn attach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<(Bookmark, Tag), DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, bookmark_id)?;
        let tag = state.tag(tag_id)?;
        state.links.insert((bookmark_id, tag_id));
        Ok((state.assemble(bookmark_id)?, tag))
    }

    fn detach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, bookmark_id)?;
        if let Some(tag) = state.tag_by_title(title) {
            state.links.remove(&(bookmark_id, tag.id));
        }
        state.assemble(bookmark_id)
    }

    fn detach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<Bookmark, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.owned(owner, bookmark_id)?;
        state.links.remove(&(bookmark_id, tag_id));
        state.assemble(bookmark_id)
    }
}

impl TagRegistry for MockBookmarkStore {
    fn find_or_create(&self, title: &str) -> Result<Tag, DomainError> {
        let mut state = self.state.lock();
        state.check_available()?;
        Ok(state.find_or_create_tag(title))
    }

    fn find_by_title(&self, title: &str) -> Result<Tag, DomainError> {
        let state = self.state.lock();
        state.check_available()?;
        state
            .tag_by_title(title)
            .ok_or_else(|| DomainError::TagTitleNotFound(title.to_string()))
    }

    fn find_by_id(&self, id: i64) -> Result<Tag, DomainError> {
        let state = self.state.lock();
        state.check_available()?;
        state.tag(id)
    }

    fn list_tags(&self) -> Result<Vec<Tag>, DomainError> {
        let state = self.state.lock();
        state.check_available()?;
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .map(|(id, title)| Tag::new(*id, title.clone()))
            .collect();
        tags.sort();
        Ok(tags)
    }
}

/// Builder for MockBookmarkStore
///
/// Provides a fluent interface for seeding data and configuring failures.
pub struct MockBookmarkStoreBuilder {
    state: MockState,
}

impl MockBookmarkStoreBuilder {
    pub fn new() -> Self {
        Self {
            state: MockState::default(),
        }
    }

    /// Seed a tag with a fixed id
    pub fn with_tag(mut self, id: i64, title: &str) -> Self {
        self.state.tags.insert(id, title.to_string());
        self.state.next_tag_id = self.state.next_tag_id.max(id);
        self
    }

    /// Seed an untagged bookmark with a fixed id
    pub fn with_bookmark(mut self, id: i64, owner: OwnerId, title: &str, url: &str) -> Self {
        self.state.bookmarks.insert(
            id,
            StoredBookmark {
                owner,
                title: title.to_string(),
                url: url.to_string(),
            },
        );
        self.state.next_bookmark_id = self.state.next_bookmark_id.max(id);
        self
    }

    /// Make the next `count` calls to attach_tag_by_title fail with Conflict
    pub fn with_attach_conflicts(mut self, count: usize) -> Self {
        self.state.attach_conflicts = count;
        self
    }

    /// Make every call fail with a storage error
    pub fn with_storage_failure(mut self) -> Self {
        self.state.storage_failure = true;
        self
    }

    pub fn build(self) -> MockBookmarkStore {
        MockBookmarkStore {
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

impl Default for MockBookmarkStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_test_setup() -> Result<()> {
    // Set up logging first
    setup_test_logging();

    info!("Test Setup complete");
    Ok(())
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = ["hyper", "tower", "mio"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: OwnerId = OwnerId(1);

    #[test]
    fn given_seeded_bookmark_when_getting_then_returns_it() {
        let mock = MockBookmarkStore::builder()
            .with_bookmark(3, OWNER, "Docs", "docs.rs")
            .build();

        let bookmark = mock.get_by_id(OWNER, 3).expect("Bookmark should exist");

        assert_eq!(bookmark.title, "Docs");
        assert_eq!(bookmark.owner, OWNER);
    }

    #[test]
    fn given_seeded_tag_when_creating_bookmark_then_new_ids_follow_seeds() {
        let mock = MockBookmarkStore::builder()
            .with_tag(5, "rust")
            .with_bookmark(3, OWNER, "Docs", "docs.rs")
            .build();

        let created = mock
            .create(OWNER, &NewBookmark::new("Book", "book.rs", vec![5]))
            .unwrap();
        let tag = mock.find_or_create("new").unwrap();

        assert_eq!(created.id, 4);
        assert!(created.has_tag_id(5));
        assert_eq!(tag.id, 6);
    }

    #[test]
    fn given_shared_tag_when_deleting_bookmark_then_tag_survives() {
        let mock = MockBookmarkStore::builder()
            .with_bookmark(1, OWNER, "A", "a.com")
            .with_bookmark(2, OWNER, "B", "b.com")
            .build();
        mock.attach_tag_by_title(OWNER, 1, "shared").unwrap();
        mock.attach_tag_by_title(OWNER, 2, "shared").unwrap();

        mock.delete_by_id(OWNER, 1).unwrap();

        assert_eq!(mock.tag_count(), 1);
        assert!(mock.get_by_id(OWNER, 2).unwrap().has_tag("shared"));
    }

    #[test]
    fn given_storage_failure_when_finding_tag_then_returns_storage_error() {
        let mock = MockBookmarkStore::builder().with_storage_failure().build();

        let result = mock.find_by_id(1);

        assert!(matches!(result, Err(DomainError::Storage(_))));
    }
}
