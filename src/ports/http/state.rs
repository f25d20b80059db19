// src/ports/http/state.rs
use crate::application::{BookmarkService, ServiceError, ServiceResult};
use crate::infrastructure::{SqliteBookmarkStore, SqlitePool, SqliteTagRegistry, SqliteUserStore};
use crate::ports::http::ApiError;
use std::sync::Arc;
use tracing::error;

pub type SqliteBookmarkService = BookmarkService<SqliteBookmarkStore, SqliteTagRegistry>;

#[derive(Clone)]
pub struct AppState {
    service: Arc<SqliteBookmarkService>,
    users: SqliteUserStore,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        let service = BookmarkService::new(
            SqliteBookmarkStore::new(pool.clone()),
            SqliteTagRegistry::new(pool.clone()),
        );
        Self {
            service: Arc::new(service),
            users: SqliteUserStore::new(pool),
        }
    }

    pub fn users(&self) -> &SqliteUserStore {
        &self.users
    }

    /// Run a service call on the blocking pool; SQLite access is synchronous.
    pub async fn run<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SqliteBookmarkService) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let result = tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| {
                error!(error = %e, "Service task failed");
                ApiError::from(ServiceError::Internal)
            })?;
        Ok(result?)
    }
}
