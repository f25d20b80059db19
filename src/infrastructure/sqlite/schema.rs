// src/infrastructure/sqlite/schema.rs
use crate::domain::DomainError;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to `SCHEMA_VERSION`.
///
/// The version check and every migration run under one `BEGIN IMMEDIATE`
/// transaction, so concurrent openers of a fresh file migrate it once.
pub fn apply_migrations(conn: &mut Connection) -> Result<(), DomainError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(&tx)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < 1 {
        info!(from = current_version, to = SCHEMA_VERSION, "Applying schema migrations");
        tx.execute_batch(SCHEMA_V1)
            .map_err(|e| DomainError::Storage(format!("Failed to apply v1 schema: {}", e)))?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [1])?;
        info!("Migration v1 applied successfully");
    }

    tx.commit()?;
    Ok(())
}

fn current_version(conn: &Connection) -> Result<i32, DomainError> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

// Join rows carry no ON DELETE CASCADE: deleting a bookmark removes its
// bookmark_tag rows explicitly first, and foreign keys reject anything else.
// Tag titles use BINARY collation, so uniqueness is case-sensitive.
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    token_hash TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS bookmark (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookmark_owner ON bookmark(owner_id);

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE COLLATE BINARY
);

CREATE TABLE IF NOT EXISTS bookmark_tag (
    bookmark_id INTEGER NOT NULL REFERENCES bookmark(id),
    tag_id INTEGER NOT NULL REFERENCES tag(id),
    PRIMARY KEY (bookmark_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_bookmark_tag_tag ON bookmark_tag(tag_id);
"#;
