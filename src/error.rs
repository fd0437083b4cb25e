//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for every failure the revision cache can report and
//! implements Axum's `IntoResponse` so the JSON adapter can return them
//! directly.
//!
//! Error mappings:
//! - `RepoNotFound`, `UnknownRevision` → 404
//! - `Structural` → 422
//! - `MalformedOutput`, `ProviderUnavailable` → 502
//! - `Inconsistent`, `Git`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The location lacks the control files every git directory has.
    #[error("GIT control files not found, maybe wrong directory? ({0})")]
    Structural(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    /// The cached graph disagrees with itself or with the provider.
    #[error("Internal inconsistency detected: {0}")]
    Inconsistent(String),

    #[error("Malformed git output: {0}")]
    MalformedOutput(String),

    #[error("Could not run git: {0}")]
    ProviderUnavailable(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RepoNotFound(_) | AppError::UnknownRevision(_) => StatusCode::NOT_FOUND,
            AppError::Structural(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedOutput(_) | AppError::ProviderUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Inconsistent(_) | AppError::Git(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
