//! Tree listing and ref DTOs.
//!
//! - `TreeEntry`: one `ls-tree` record, optionally with the blob size
//! - `BranchInfo`: local branch and the commit it points at

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub entry_type: EntryType,
    pub sha: String,
    pub name: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Submodule,
}

impl EntryType {
    /// Classify an `ls-tree` entry by object type and mode.
    pub fn from_ls_tree(kind: &str, mode: &str) -> Option<Self> {
        match kind {
            "blob" if mode == "120000" => Some(EntryType::Symlink),
            "blob" => Some(EntryType::File),
            "tree" => Some(EntryType::Directory),
            "commit" => Some(EntryType::Submodule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub sha: String,
    pub is_current: bool,
}
