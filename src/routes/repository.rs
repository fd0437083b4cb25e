//! Repository summary and sync endpoints.
//!
//! - GET /api/v1/repository
//!   Youngest/oldest commit, commit and tag counts, HEAD and its branch.
//!
//! - POST /api/v1/repository/sync
//!   Drops the cached commit graph if new commits appeared. The next query
//!   rebuilds it.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::{RepositoryInfo, SyncResponse};

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/repository", get(get_repository_info))
        .route("/api/v1/repository/sync", post(sync_repository))
        .with_state(cache)
}

async fn get_repository_info(State(cache): State<SharedCache>) -> Result<Json<RepositoryInfo>> {
    let graph = cache.graph()?;
    let head_branch = cache
        .get_branches()?
        .into_iter()
        .find(|branch| branch.is_current)
        .map(|branch| branch.name);

    Ok(Json(RepositoryInfo {
        path: cache.path().display().to_string(),
        head: cache.head()?,
        head_branch,
        youngest: graph.youngest().map(str::to_string),
        oldest: graph.oldest().map(str::to_string),
        commit_count: graph.len(),
        tag_count: graph.tag_count(),
    }))
}

async fn sync_repository(State(cache): State<SharedCache>) -> Result<Json<SyncResponse>> {
    let changed = cache.sync()?;
    Ok(Json(SyncResponse { changed }))
}
