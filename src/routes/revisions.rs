//! Revision endpoints.
//!
//! - GET /api/v1/revisions/{rev}
//!   Full id, shortest unambiguous prefix (min 7) and ordinal.
//! - GET /api/v1/revisions/{rev}/relative?offset=<n>
//!   Commit `n` positions older (negative: younger); null past either end.
//! - GET /api/v1/revisions/{rev}/children?recursive=<bool>
//! - GET /api/v1/revisions/{rev}/parents
//! - GET /api/v1/revisions/{rev}/ancestor-of/{other}

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::git::{RepositoryCache, SharedCache};
use crate::models::{RevisionInfo, RevisionList};
use crate::routes::resolve_rev;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/revisions/{rev}", get(get_revision))
        .route("/api/v1/revisions/{rev}/relative", get(get_relative))
        .route("/api/v1/revisions/{rev}/children", get(get_children))
        .route("/api/v1/revisions/{rev}/parents", get(get_parents))
        .route("/api/v1/revisions/{rev}/ancestor-of/{other}", get(get_ancestry))
        .with_state(cache)
}

fn revision_info(cache: &RepositoryCache, sha: &str) -> Result<RevisionInfo> {
    let graph = cache.graph()?;
    let ordinal = graph
        .ordinal(sha)
        .ok_or_else(|| AppError::UnknownRevision(sha.to_string()))?;

    Ok(RevisionInfo {
        rev: sha.to_string(),
        short: graph.shortrev(sha, 7).unwrap_or_else(|| sha.to_string()),
        ordinal,
    })
}

async fn get_revision(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
) -> Result<Json<RevisionInfo>> {
    let sha = resolve_rev(&cache, &rev)?;
    Ok(Json(revision_info(&cache, &sha)?))
}

#[derive(Debug, Deserialize)]
struct RelativeQuery {
    #[serde(default)]
    offset: isize,
}

async fn get_relative(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
    Query(query): Query<RelativeQuery>,
) -> Result<Json<Option<RevisionInfo>>> {
    let sha = resolve_rev(&cache, &rev)?;
    let target = cache.history_relative_rev(&sha, query.offset)?;
    let info = target.map(|target| revision_info(&cache, &target)).transpose()?;
    Ok(Json(info))
}

#[derive(Debug, Deserialize)]
struct ChildrenQuery {
    #[serde(default)]
    recursive: bool,
}

async fn get_children(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
    Query(query): Query<ChildrenQuery>,
) -> Result<Json<RevisionList>> {
    let sha = resolve_rev(&cache, &rev)?;
    let revs = if query.recursive {
        cache
            .children_recursive(&sha)?
            .map(|rev| rev.to_string())
            .collect::<Vec<_>>()
    } else {
        cache.children(&sha)?
    };
    Ok(Json(revs.into()))
}

async fn get_parents(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
) -> Result<Json<RevisionList>> {
    let sha = resolve_rev(&cache, &rev)?;
    Ok(Json(cache.parents(&sha)?.into()))
}

#[derive(Debug, Serialize)]
struct AncestryResponse {
    ancestor: String,
    descendant: String,
    is_ancestor: bool,
}

async fn get_ancestry(
    State(cache): State<SharedCache>,
    Path((rev, other)): Path<(String, String)>,
) -> Result<Json<AncestryResponse>> {
    let ancestor = resolve_rev(&cache, &rev)?;
    let descendant = resolve_rev(&cache, &other)?;
    let is_ancestor = cache.rev_is_ancestor_of(&ancestor, &descendant)?;

    Ok(Json(AncestryResponse {
        ancestor,
        descendant,
        is_ancestor,
    }))
}
