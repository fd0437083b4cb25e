//! Tree-diff records.
//!
//! One `Change` per `git diff-tree -z -r` record:
//! `:<old-mode> <new-mode> <old-sha> <new-sha> <action> NUL <path> NUL [<path> NUL]`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    pub old_mode: String,
    pub new_mode: String,
    pub old_sha: String,
    pub new_sha: String,
    pub action: ChangeAction,
    /// Similarity index for renames and copies
    pub score: Option<u8>,
    pub old_path: String,
    /// Only set for renames and copies
    pub new_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
}

impl ChangeAction {
    /// Action for a `diff-tree` status letter
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(ChangeAction::Added),
            'M' => Some(ChangeAction::Modified),
            'D' => Some(ChangeAction::Deleted),
            'R' => Some(ChangeAction::Renamed),
            'C' => Some(ChangeAction::Copied),
            'T' => Some(ChangeAction::TypeChanged),
            'U' => Some(ChangeAction::Unmerged),
            _ => None,
        }
    }

    /// Whether the record carries both a source and a destination path
    pub fn has_two_paths(self) -> bool {
        matches!(self, ChangeAction::Renamed | ChangeAction::Copied)
    }
}
