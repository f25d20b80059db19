// src/ports/http/auth.rs
use crate::application::ServiceError;
use crate::domain::User;
use crate::ports::http::{ApiError, AppState};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::error;

/// Caller identity resolved from `Authorization: Bearer <token>`.
///
/// Rejects with 401 when the header is missing, malformed, or names no user.
#[derive(Debug, Clone)]
pub struct Authenticated(pub User);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let users = state.users().clone();
        let user = tokio::task::spawn_blocking(move || users.authenticate(&token))
            .await
            .map_err(|e| {
                error!(error = %e, "Authentication task failed");
                ApiError::from(ServiceError::Internal)
            })?
            .map_err(ServiceError::from)?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Authenticated(user))
    }
}
