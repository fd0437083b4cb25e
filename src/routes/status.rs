//! Cache statistics endpoint.
//!
//! GET /api/v1/repository/status
//!
//! Reports the size of the cached commit graph, how many commit messages and
//! object sizes are cached, and how long ago the graph was built.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::CacheStats;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/repository/status", get(get_status))
        .with_state(cache)
}

async fn get_status(State(cache): State<SharedCache>) -> Result<Json<CacheStats>> {
    Ok(Json(cache.stats()?))
}
