// src/infrastructure/sqlite/tags.rs
use crate::application::TagRegistry;
use crate::domain::{DomainError, Tag};
use crate::infrastructure::sqlite::{is_unique_violation, SqlitePool};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, instrument};

/// SQLite implementation of TagRegistry
#[derive(Clone)]
pub struct SqliteTagRegistry {
    pool: SqlitePool,
}

impl SqliteTagRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TagRegistry for SqliteTagRegistry {
    #[instrument(level = "debug", skip(self))]
    fn find_or_create(&self, title: &str) -> Result<Tag, DomainError> {
        self.pool.write(|tx| find_or_create(tx, title))
    }

    #[instrument(level = "debug", skip(self))]
    fn find_by_title(&self, title: &str) -> Result<Tag, DomainError> {
        self.pool
            .read(|tx| find_by_title(tx, title))?
            .ok_or_else(|| DomainError::TagTitleNotFound(title.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    fn find_by_id(&self, id: i64) -> Result<Tag, DomainError> {
        self.pool
            .read(|tx| find_by_id(tx, id))?
            .ok_or(DomainError::TagNotFound(id))
    }

    fn list_tags(&self) -> Result<Vec<Tag>, DomainError> {
        self.pool.read(|tx| {
            let mut stmt = tx.prepare("SELECT id, title FROM tag ORDER BY title, id")?;
            let tags = stmt.query_map([], row_to_tag)?.collect::<Result<_, _>>()?;
            Ok(tags)
        })
    }
}

pub(crate) fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        title: row.get(1)?,
    })
}

/// Exact, case-sensitive lookup; the oldest row wins if several exist.
pub(crate) fn find_by_title(conn: &Connection, title: &str) -> Result<Option<Tag>, DomainError> {
    let tag = conn
        .query_row(
            "SELECT id, title FROM tag WHERE title = ?1 ORDER BY id LIMIT 1",
            [title],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}

pub(crate) fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Tag>, DomainError> {
    let tag = conn
        .query_row("SELECT id, title FROM tag WHERE id = ?1", [id], row_to_tag)
        .optional()?;
    Ok(tag)
}

/// Find-or-create on the caller's connection, so it joins the caller's
/// transaction. A unique violation on insert means another writer created the
/// title first; the row is re-read once and a second miss is a `Conflict`.
pub(crate) fn find_or_create(conn: &Connection, title: &str) -> Result<Tag, DomainError> {
    if let Some(tag) = find_by_title(conn, title)? {
        return Ok(tag);
    }

    match conn.execute("INSERT INTO tag (title) VALUES (?1)", [title]) {
        Ok(_) => {
            let tag = Tag::new(conn.last_insert_rowid(), title);
            debug!(tag_id = tag.id, title, "Created tag");
            Ok(tag)
        }
        Err(e) if is_unique_violation(&e) => {
            debug!(title, "Tag created concurrently, re-reading");
            find_by_title(conn, title)?.ok_or_else(|| {
                DomainError::Conflict(format!("tag {title:?} vanished after conflict"))
            })
        }
        Err(e) => Err(e.into()),
    }
}
