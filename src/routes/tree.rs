use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::TreeEntry;
use crate::routes::resolve_rev;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/tree", get(get_tree))
        .with_state(cache)
}

#[derive(Debug, Deserialize)]
struct TreeQuery {
    rev: Option<String>,
    path: Option<String>,
}

async fn get_tree(
    State(cache): State<SharedCache>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<Vec<TreeEntry>>> {
    let sha = resolve_rev(&cache, query.rev.as_deref().unwrap_or("HEAD"))?;
    let entries = cache.tree_entries(&sha, query.path.as_deref().unwrap_or(""))?;
    Ok(Json(entries))
}
