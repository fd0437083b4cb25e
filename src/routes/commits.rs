//! Commit endpoints.
//!
//! - GET /api/v1/commits?since=&until=
//!   Commits on any ref in a time window (RFC 3339), oldest first.
//! - GET /api/v1/commits?rev=&path=&limit=
//!   History of `path` reachable from `rev`, newest first. Without `rev`,
//!   every known commit.
//! - GET /api/v1/commits/{rev}
//!   Message, header fields, parents and children of one commit.
//! - GET /api/v1/commits/{rev}/changes
//!   Changes against the first parent (or the empty tree for roots).

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedCache;
use crate::models::{Change, CommitDetail, RevisionList};
use crate::routes::resolve_rev;

pub fn routes(cache: SharedCache) -> Router {
    Router::new()
        .route("/api/v1/commits", get(get_commits))
        .route("/api/v1/commits/{rev}", get(get_commit))
        .route("/api/v1/commits/{rev}/changes", get(get_commit_changes))
        .with_state(cache)
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    rev: Option<String>,
    path: Option<String>,
    limit: Option<usize>,
}

async fn get_commits(
    State(cache): State<SharedCache>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<RevisionList>> {
    let revs = if query.since.is_some() || query.until.is_some() {
        let since = query.since.unwrap_or(DateTime::<Utc>::default());
        let until = query.until.unwrap_or_else(Utc::now);
        cache.history_timerange(since, until)?
    } else if let Some(rev) = &query.rev {
        let sha = resolve_rev(&cache, rev)?;
        cache.history(&sha, query.path.as_deref().unwrap_or(""), query.limit)?
    } else {
        let mut revs = cache.all_revs()?;
        if let Some(limit) = query.limit {
            revs.truncate(limit);
        }
        revs
    };

    Ok(Json(revs.into()))
}

async fn get_commit(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
) -> Result<Json<CommitDetail>> {
    let sha = resolve_rev(&cache, &rev)?;
    Ok(Json(cache.commit_detail(&sha)?))
}

async fn get_commit_changes(
    State(cache): State<SharedCache>,
    Path(rev): Path<String>,
) -> Result<Json<Vec<Change>>> {
    let sha = resolve_rev(&cache, &rev)?;
    Ok(Json(cache.commit_changes(&sha)?))
}
