//! Branch and tag listing.
//!
//! - GET /api/v1/branches
//!   Local branches with the checked-out one first.
//! - GET /api/v1/tags
//!   Tag names.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::BranchInfo;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/branches", get(list_branches))
        .route("/api/v1/tags", get(list_tags))
        .with_state(cache)
}

async fn list_branches(State(cache): State<SharedCache>) -> Result<Json<Vec<BranchInfo>>> {
    Ok(Json(cache.get_branches()?))
}

async fn list_tags(State(cache): State<SharedCache>) -> Result<Json<Vec<String>>> {
    Ok(Json(cache.get_tags()?))
}
