use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use findfirst::application::BookmarkService;
use findfirst::config::DatabaseConfig;
use findfirst::domain::User;
use findfirst::infrastructure::{
    SqliteBookmarkStore, SqlitePool, SqliteTagRegistry, SqliteUserStore,
};
use findfirst::ports::http::{router, AppState};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test fixture for a throwaway SQLite database file
#[allow(dead_code)]
pub struct TestDatabase {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestDatabase {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
        let path = temp_dir.path().join("findfirst.db");
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    /// Open a new connection to the database; each call is independent
    pub fn open_pool(&self) -> Result<SqlitePool> {
        Ok(SqlitePool::open(&DatabaseConfig::at(&self.path))?)
    }

    pub fn service(&self) -> Result<BookmarkService<SqliteBookmarkStore, SqliteTagRegistry>> {
        let pool = self.open_pool()?;
        Ok(BookmarkService::new(
            SqliteBookmarkStore::new(pool.clone()),
            SqliteTagRegistry::new(pool),
        ))
    }

    pub fn create_user(&self, username: &str) -> Result<User> {
        let (user, _) = SqliteUserStore::new(self.open_pool()?).create_user(username)?;
        Ok(user)
    }

    pub fn count_tags_titled(&self, title: &str) -> Result<i64> {
        let pool = self.open_pool()?;
        Ok(pool.read(|tx| {
            Ok(tx.query_row("SELECT COUNT(*) FROM tag WHERE title = ?1", [title], |row| {
                row.get(0)
            })?)
        })?)
    }
}

/// Router over an in-memory database with two registered users
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub jsmith_token: String,
    pub other_token: String,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Result<Self> {
        let pool = SqlitePool::memory()?;
        let state = AppState::new(pool);
        let (_, jsmith_token) = state.users().create_user("jsmith")?;
        let (_, other_token) = state.users().create_user("jdoe")?;
        Ok(Self {
            router: router(state),
            jsmith_token,
            other_token,
        })
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("Response body is not JSON")?
        };
        Ok((status, value))
    }

    /// Send as jsmith
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        self.send(method, uri, Some(&self.jsmith_token), body).await
    }
}

/// Titles of the tags in a serialized bookmark
#[allow(dead_code)]
pub fn tag_titles(bookmark: &Value) -> Vec<String> {
    bookmark["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
