// src/ports/http/mod.rs
//! JSON-over-HTTP adapter for the bookmark service.

mod auth;
mod error;
mod extract;
mod routes;
mod server;
mod state;

pub use auth::Authenticated;
pub use error::ApiError;
pub use extract::{ApiPath, ApiQuery};
pub use routes::router;
pub use server::serve;
pub use state::{AppState, SqliteBookmarkService};
