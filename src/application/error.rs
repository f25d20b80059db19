// src/application/error.rs
use crate::domain::DomainError;
use thiserror::Error;
use tracing::error;

/// Failure kinds visible outside the service. Persistence detail never
/// crosses this boundary; it is logged when the error is translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Not found")]
    NotFound,
    #[error("Tag not found")]
    TagNotFound,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Conflicting update, please retry")]
    Conflict,
    #[error("Internal error")]
    Internal,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::BookmarkNotFound(_)
            | DomainError::TagTitleNotFound(_)
            | DomainError::UserNotFound(_) => ServiceError::NotFound,
            DomainError::TagNotFound(_) => ServiceError::TagNotFound,
            DomainError::Conflict(reason) => {
                error!(%reason, "Write conflict");
                ServiceError::Conflict
            }
            DomainError::Storage(reason) => {
                error!(%reason, "Storage failure");
                ServiceError::Internal
            }
        }
    }
}
