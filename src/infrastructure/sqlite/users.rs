// src/infrastructure/sqlite/users.rs
use crate::domain::{DomainError, OwnerId, User};
use crate::infrastructure::sqlite::{is_unique_violation, SqlitePool};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Users and their API tokens. Only the SHA-256 of a token is stored.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user and return it with its freshly minted token.
    /// The token cannot be recovered later.
    #[instrument(level = "debug", skip(self))]
    pub fn create_user(&self, username: &str) -> Result<(User, String), DomainError> {
        let token = Uuid::new_v4().simple().to_string();
        let token_hash = hash_token(&token);

        let id = self.pool.write(|tx| {
            tx.execute(
                "INSERT INTO users (username, token_hash) VALUES (?1, ?2)",
                params![username, token_hash],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Conflict(format!("user {username:?} already exists"))
                } else {
                    e.into()
                }
            })?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(user_id = id, username, "Created user");
        let user = User {
            id: OwnerId(id),
            username: username.to_string(),
        };
        Ok((user, token))
    }

    /// Resolve a bearer token to its user, `None` when no user holds it.
    pub fn authenticate(&self, token: &str) -> Result<Option<User>, DomainError> {
        let token_hash = hash_token(token);
        let user = self.pool.read(|tx| {
            Ok(tx
                .query_row(
                    "SELECT id, username FROM users WHERE token_hash = ?1",
                    [token_hash],
                    |row| {
                        Ok(User {
                            id: OwnerId(row.get(0)?),
                            username: row.get(1)?,
                        })
                    },
                )
                .optional()?)
        })?;
        if user.is_none() {
            debug!("Unknown API token");
        }
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.pool
            .read(|tx| {
                Ok(tx
                    .query_row(
                        "SELECT id, username FROM users WHERE username = ?1",
                        [username],
                        |row| {
                            Ok(User {
                                id: OwnerId(row.get(0)?),
                                username: row.get(1)?,
                            })
                        },
                    )
                    .optional()?)
            })?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }
}

/// Lowercase hex SHA-256 of a token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> SqliteUserStore {
        SqliteUserStore::new(SqlitePool::memory().expect("Failed to create pool"))
    }

    #[test]
    fn given_token_when_hashing_then_returns_sha256_hex() {
        let hash = hash_token("secret");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_token("secret"));
        assert_ne!(hash, hash_token("Secret"));
    }

    #[test]
    fn given_created_user_when_authenticating_with_token_then_returns_user() {
        let users = users();
        let (created, token) = users.create_user("jsmith").unwrap();

        let found = users.authenticate(&token).unwrap();

        assert_eq!(found, Some(created));
    }

    #[test]
    fn given_wrong_token_when_authenticating_then_returns_none() {
        let users = users();
        users.create_user("jsmith").unwrap();

        let found = users.authenticate("not-a-token").unwrap();

        assert!(found.is_none());
    }

    #[test]
    fn given_taken_username_when_creating_then_returns_conflict() {
        let users = users();
        users.create_user("jsmith").unwrap();

        let result = users.create_user("jsmith");

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn given_unknown_username_when_finding_then_returns_user_not_found() {
        let users = users();

        let result = users.find_by_username("ghost");

        assert!(matches!(result, Err(DomainError::UserNotFound(name)) if name == "ghost"));
    }
}
