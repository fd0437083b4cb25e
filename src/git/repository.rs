use git2::Repository;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::git::command::{Gateway, GitCli};
use crate::git::parse::parse_version;
use crate::models::GitVersion;

/// Entries every git directory carries
const CONTROL_FILES: [&str; 3] = ["HEAD", "objects", "refs"];

/// Resolve a working tree or git directory to the git directory itself.
pub fn discover_git_dir<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let repo = Repository::discover(&path).map_err(|_| AppError::RepoNotFound(path_str))?;
    Ok(repo.path().to_path_buf())
}

/// Fail fast when `git_dir` does not look like a git directory.
pub fn check_control_files(git_dir: &Path) -> Result<()> {
    let missing: Vec<&str> = CONTROL_FILES
        .into_iter()
        .filter(|name| !git_dir.join(name).exists())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    tracing::error!("GIT control files missing in '{}'", git_dir.display());
    if git_dir.join(".git").exists() {
        tracing::error!(
            "entry '.git' found in '{}' -- maybe use that folder instead...",
            git_dir.display()
        );
    }

    Err(AppError::Structural(format!(
        "{} lacks {}",
        git_dir.display(),
        missing.join(", ")
    )))
}

/// Version of the git binary, for the caller to check against the minimum.
pub fn git_version(git_bin: &str) -> Result<GitVersion> {
    let output = GitCli::new(git_bin, None).version()?;
    parse_version(&output)
}

pub fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}
