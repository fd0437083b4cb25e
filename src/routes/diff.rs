use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::Change;
use crate::routes::resolve_rev;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/diff", get(get_diff))
        .with_state(cache)
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    from: Option<String>,
    to: String,
    path: Option<String>,
    #[serde(default)]
    renames: bool,
}

async fn get_diff(
    State(cache): State<SharedCache>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<Vec<Change>>> {
    let to = resolve_rev(&cache, &query.to)?;
    let from = query
        .from
        .as_deref()
        .map(|rev| resolve_rev(&cache, rev))
        .transpose()?;

    let changes = cache.diff_tree(
        from.as_deref(),
        &to,
        query.path.as_deref().unwrap_or(""),
        query.renames,
    )?;
    Ok(Json(changes))
}
