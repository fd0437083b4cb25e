//! Blame endpoint.
//!
//! GET /api/v1/blame?path=<path>&rev=<optional>
//!
//! Returns, for every line of the file at `rev` (default HEAD), the commit
//! that last modified it.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::BlameResponse;
use crate::routes::resolve_rev;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/blame", get(get_blame))
        .with_state(cache)
}

#[derive(Debug, Deserialize)]
struct BlameQuery {
    path: String,
    rev: Option<String>,
}

async fn get_blame(
    State(cache): State<SharedCache>,
    Query(query): Query<BlameQuery>,
) -> Result<Json<BlameResponse>> {
    let commit = resolve_rev(&cache, query.rev.as_deref().unwrap_or("HEAD"))?;
    let lines = cache.blame(&commit, &query.path)?;

    Ok(Json(BlameResponse {
        path: query.path,
        commit,
        lines,
    }))
}
