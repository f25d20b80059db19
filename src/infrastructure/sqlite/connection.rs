// src/infrastructure/sqlite/connection.rs
use crate::config::DatabaseConfig;
use crate::domain::DomainError;
use crate::infrastructure::sqlite::schema;
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared SQLite connection.
///
/// One connection per process behind a mutex; WAL mode plus a busy timeout
/// lets several processes share the same database file.
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePool {
    pub fn open(config: &DatabaseConfig) -> Result<Self, DomainError> {
        info!(path = ?config.path, "Opening SQLite database");

        let mut conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::Storage(format!("Failed to create database directory: {}", e))
                })?;
            }
            Connection::open(&config.path)?
        };

        configure(&conn, config)?;
        schema::apply_migrations(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fresh in-memory database with the schema applied
    pub fn memory() -> Result<Self, DomainError> {
        Self::open(&DatabaseConfig::memory())
    }

    /// Run `f` inside a read transaction.
    pub fn read<F, T>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&Transaction) -> Result<T, DomainError>,
    {
        self.transaction(TransactionBehavior::Deferred, f)
    }

    /// Run `f` inside a write transaction, committing on `Ok`.
    ///
    /// The transaction takes the write lock up front (`BEGIN IMMEDIATE`), so
    /// concurrent writers from other connections queue on the busy timeout
    /// instead of interleaving their reads and writes.
    pub fn write<F, T>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&Transaction) -> Result<T, DomainError>,
    {
        self.transaction(TransactionBehavior::Immediate, f)
    }

    fn transaction<F, T>(&self, behavior: TransactionBehavior, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&Transaction) -> Result<T, DomainError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(behavior)?;
        // Dropping an uncommitted transaction rolls it back.
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn configure(conn: &Connection, config: &DatabaseConfig) -> Result<(), DomainError> {
    debug!(
        wal_mode = config.wal_mode,
        busy_timeout_ms = config.busy_timeout_ms,
        "Configuring SQLite pragmas"
    );

    // Set first so the journal mode switch waits on other openers.
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    if config.wal_mode && !config.is_memory() {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_memory_pool_when_querying_then_schema_exists() {
        let pool = SqlitePool::memory().expect("Failed to create memory pool");

        let tables: Vec<String> = pool
            .read(|tx| {
                let mut stmt =
                    tx.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok(rows.collect::<Result<_, _>>()?)
            })
            .expect("Query failed");

        for table in ["bookmark", "bookmark_tag", "tag", "users"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn given_file_pool_when_opening_then_enables_wal() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::at(dir.path().join("nested").join("test.db"));

        let pool = SqlitePool::open(&config).expect("Failed to open pool");

        let mode: String = pool
            .read(|tx| Ok(tx.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn given_failing_closure_when_writing_then_rolls_back() {
        let pool = SqlitePool::memory().unwrap();

        let result: Result<(), DomainError> = pool.write(|tx| {
            tx.execute("INSERT INTO tag (title) VALUES ('rolled-back')", [])?;
            Err(DomainError::TagNotFound(1))
        });

        assert!(matches!(result, Err(DomainError::TagNotFound(1))));
        let count: i64 = pool
            .read(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM tag", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn given_existing_file_when_reopening_then_migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::at(dir.path().join("again.db"));

        SqlitePool::open(&config).unwrap();
        let reopened = SqlitePool::open(&config);

        assert!(reopened.is_ok());
    }

    #[test]
    fn given_fresh_file_when_opening_concurrently_then_migrates_once() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::at(dir.path().join("fresh.db"));
        let barrier = std::sync::Barrier::new(4);

        // Act
        let results: Vec<Result<SqlitePool, DomainError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        SqlitePool::open(&config)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });

        // Assert
        let pools: Vec<SqlitePool> = results
            .into_iter()
            .map(|r| r.expect("Concurrent open failed"))
            .collect();
        let versions: i64 = pools[0]
            .read(|tx| {
                Ok(tx.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(versions, 1);
    }
}
