// src/infrastructure/sqlite/bookmarks.rs
use crate::application::BookmarkStore;
use crate::domain::{Bookmark, BookmarkPatch, DomainError, NewBookmark, OwnerId, Tag};
use crate::infrastructure::sqlite::{tags, SqlitePool};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// SQLite implementation of BookmarkStore.
///
/// Bookmarks, tags and their `bookmark_tag` join rows are separate tables.
/// Every mutation runs in one immediate transaction, and every query filters
/// on `owner_id`.
#[derive(Clone)]
pub struct SqliteBookmarkStore {
    pool: SqlitePool,
}

impl SqliteBookmarkStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BookmarkStore for SqliteBookmarkStore {
    #[instrument(level = "debug", skip(self, request), fields(title = %request.title))]
    fn create(&self, owner: OwnerId, request: &NewBookmark) -> Result<Bookmark, DomainError> {
        self.pool.write(|tx| {
            let id = insert_bookmark(tx, owner, request)?;
            load_owned(tx, owner, id)
        })
    }

    #[instrument(level = "debug", skip(self, requests), fields(count = requests.len()))]
    fn create_many(
        &self,
        owner: OwnerId,
        requests: &[NewBookmark],
    ) -> Result<Vec<Bookmark>, DomainError> {
        self.pool.write(|tx| {
            let ids = requests
                .iter()
                .map(|request| insert_bookmark(tx, owner, request))
                .collect::<Result<Vec<_>, _>>()?;
            ids.into_iter().map(|id| load_owned(tx, owner, id)).collect()
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn get_by_id(&self, owner: OwnerId, id: i64) -> Result<Bookmark, DomainError> {
        self.pool.read(|tx| load_owned(tx, owner, id))
    }

    #[instrument(level = "debug", skip(self))]
    fn list_all(&self, owner: OwnerId) -> Result<Vec<Bookmark>, DomainError> {
        self.pool.read(|tx| {
            let mut stmt = tx.prepare(
                r#"
                SELECT b.id, b.title, b.url, t.id, t.title
                FROM bookmark b
                LEFT JOIN bookmark_tag bt ON bt.bookmark_id = b.id
                LEFT JOIN tag t ON t.id = bt.tag_id
                WHERE b.owner_id = ?1
                ORDER BY b.id
                "#,
            )?;
            let mut rows = stmt.query([owner.0])?;

            let mut bookmarks: Vec<Bookmark> = Vec::new();
            while let Some(row) = rows.next()? {
                let id: i64 = row.get(0)?;
                if bookmarks.last().map(|b| b.id) != Some(id) {
                    bookmarks.push(Bookmark {
                        id,
                        title: row.get(1)?,
                        url: row.get(2)?,
                        owner,
                        tags: BTreeSet::new(),
                    });
                }
                let tag_id: Option<i64> = row.get(3)?;
                let tag_title: Option<String> = row.get(4)?;
                if let (Some(tag_id), Some(tag_title), Some(bookmark)) =
                    (tag_id, tag_title, bookmarks.last_mut())
                {
                    bookmark.tags.insert(Tag::new(tag_id, tag_title));
                }
            }
            Ok(bookmarks)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn update(
        &self,
        owner: OwnerId,
        id: i64,
        patch: &BookmarkPatch,
    ) -> Result<Bookmark, DomainError> {
        self.pool.write(|tx| {
            let changed = tx.execute(
                r#"
                UPDATE bookmark
                SET title = COALESCE(?1, title), url = COALESCE(?2, url)
                WHERE id = ?3 AND owner_id = ?4
                "#,
                params![patch.title, patch.url, id, owner.0],
            )?;
            if changed == 0 {
                return Err(DomainError::BookmarkNotFound(id));
            }
            load_owned(tx, owner, id)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_by_id(&self, owner: OwnerId, id: i64) -> Result<(), DomainError> {
        self.pool.write(|tx| {
            ensure_owned(tx, owner, id)?;
            let unlinked = tx.execute("DELETE FROM bookmark_tag WHERE bookmark_id = ?1", [id])?;
            tx.execute(
                "DELETE FROM bookmark WHERE id = ?1 AND owner_id = ?2",
                params![id, owner.0],
            )?;
            debug!(bookmark_id = id, unlinked, "Deleted bookmark and its tag links");
            Ok(())
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_all(&self, owner: OwnerId) -> Result<usize, DomainError> {
        self.pool.write(|tx| {
            tx.execute(
                r#"
                DELETE FROM bookmark_tag
                WHERE bookmark_id IN (SELECT id FROM bookmark WHERE owner_id = ?1)
                "#,
                [owner.0],
            )?;
            let deleted = tx.execute("DELETE FROM bookmark WHERE owner_id = ?1", [owner.0])?;
            info!(%owner, deleted, "Deleted all bookmarks for owner");
            Ok(deleted)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn attach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError> {
        self.pool.write(|tx| {
            ensure_owned(tx, owner, bookmark_id)?;
            let tag = tags::find_or_create(tx, title)?;
            link(tx, bookmark_id, tag.id)?;
            load_owned(tx, owner, bookmark_id)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn attach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<(Bookmark, Tag), DomainError> {
        self.pool.write(|tx| {
            ensure_owned(tx, owner, bookmark_id)?;
            let tag = tags::find_by_id(tx, tag_id)?.ok_or(DomainError::TagNotFound(tag_id))?;
            link(tx, bookmark_id, tag.id)?;
            Ok((load_owned(tx, owner, bookmark_id)?, tag))
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn detach_tag_by_title(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        title: &str,
    ) -> Result<Bookmark, DomainError> {
        self.pool.write(|tx| {
            ensure_owned(tx, owner, bookmark_id)?;
            let removed = tx.execute(
                r#"
                DELETE FROM bookmark_tag
                WHERE bookmark_id = ?1 AND tag_id IN (SELECT id FROM tag WHERE title = ?2)
                "#,
                params![bookmark_id, title],
            )?;
            debug!(bookmark_id, title, removed, "Detached tag by title");
            load_owned(tx, owner, bookmark_id)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn detach_tag_by_id(
        &self,
        owner: OwnerId,
        bookmark_id: i64,
        tag_id: i64,
    ) -> Result<Bookmark, DomainError> {
        self.pool.write(|tx| {
            ensure_owned(tx, owner, bookmark_id)?;
            let removed = tx.execute(
                "DELETE FROM bookmark_tag WHERE bookmark_id = ?1 AND tag_id = ?2",
                params![bookmark_id, tag_id],
            )?;
            debug!(bookmark_id, tag_id, removed, "Detached tag by id");
            load_owned(tx, owner, bookmark_id)
        })
    }
}

/// Insert one bookmark, resolving every requested tag id first so an unknown
/// id fails before anything is written.
fn insert_bookmark(
    conn: &Connection,
    owner: OwnerId,
    request: &NewBookmark,
) -> Result<i64, DomainError> {
    let tag_ids: BTreeSet<i64> = request.tag_ids.iter().copied().collect();
    for tag_id in &tag_ids {
        if tags::find_by_id(conn, *tag_id)?.is_none() {
            debug!(tag_id, "Rejecting bookmark with unknown tag id");
            return Err(DomainError::TagNotFound(*tag_id));
        }
    }

    conn.execute(
        "INSERT INTO bookmark (owner_id, title, url) VALUES (?1, ?2, ?3)",
        params![owner.0, request.title, request.url],
    )?;
    let id = conn.last_insert_rowid();

    for tag_id in tag_ids {
        link(conn, id, tag_id)?;
    }
    Ok(id)
}

fn link(conn: &Connection, bookmark_id: i64, tag_id: i64) -> Result<(), DomainError> {
    conn.execute(
        "INSERT OR IGNORE INTO bookmark_tag (bookmark_id, tag_id) VALUES (?1, ?2)",
        params![bookmark_id, tag_id],
    )?;
    Ok(())
}

fn ensure_owned(conn: &Connection, owner: OwnerId, id: i64) -> Result<(), DomainError> {
    conn.query_row(
        "SELECT 1 FROM bookmark WHERE id = ?1 AND owner_id = ?2",
        params![id, owner.0],
        |_| Ok(()),
    )
    .optional()?
    .ok_or(DomainError::BookmarkNotFound(id))
}

fn load_owned(conn: &Connection, owner: OwnerId, id: i64) -> Result<Bookmark, DomainError> {
    let (title, url): (String, String) = conn
        .query_row(
            "SELECT title, url FROM bookmark WHERE id = ?1 AND owner_id = ?2",
            params![id, owner.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(DomainError::BookmarkNotFound(id))?;

    let mut stmt = conn.prepare(
        r#"
        SELECT t.id, t.title
        FROM tag t
        JOIN bookmark_tag bt ON bt.tag_id = t.id
        WHERE bt.bookmark_id = ?1
        "#,
    )?;
    let tags = stmt
        .query_map([id], tags::row_to_tag)?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Bookmark {
        id,
        title,
        url,
        owner,
        tags,
    })
}
