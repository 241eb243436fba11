/// API routes and handlers
pub mod blob;
pub mod form;
pub mod health;
pub mod videos;
pub mod wishes;

use crate::context::AppContext;
use axum::Router;
use serde::Serialize;

/// Longest accepted visitor name, in characters
pub const MAX_NAME_LEN: u64 = 100;

/// Longest accepted wish message, in characters
pub const MAX_MESSAGE_LEN: u64 = 5000;

/// Response for endpoints that create a record
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(wishes::routes())
        .merge(videos::routes())
        .merge(blob::routes())
}
