//! JSON adapter over the revision cache.
//!
//! Each submodule defines routes for a feature area:
//! - `repository`: repository summary and explicit sync
//! - `status`: cache statistics
//! - `revisions`: resolve, shorten, navigate and relate revisions
//! - `commits`: commit lists, commit details and per-commit changes
//! - `branches`: branch and tag listing
//! - `tree`: tree listing with blob sizes
//! - `diff`: tree-to-tree changes
//! - `blame`: per-line attribution

pub mod blame;
pub mod branches;
pub mod commits;
pub mod diff;
pub mod repository;
pub mod revisions;
pub mod status;
pub mod tree;

use axum::Router;

use crate::error::{AppError, Result};
use crate::git::{RepositoryCache, SharedCache};

pub fn create_router(cache: SharedCache) -> Router {
    Router::new()
        .merge(repository::routes(cache.clone()))
        .merge(status::routes(cache.clone()))
        .merge(revisions::routes(cache.clone()))
        .merge(commits::routes(cache.clone()))
        .merge(branches::routes(cache.clone()))
        .merge(tree::routes(cache.clone()))
        .merge(diff::routes(cache.clone()))
        .merge(blame::routes(cache))
}

/// Resolve a user-supplied revision or answer 404.
pub(crate) fn resolve_rev(cache: &RepositoryCache, rev: &str) -> Result<String> {
    cache
        .verifyrev(rev)?
        .ok_or_else(|| AppError::UnknownRevision(rev.to_string()))
}
