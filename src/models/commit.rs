use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw commit object split into its message and header fields.
///
/// Header fields keep every occurrence in order (`parent` repeats on merges);
/// continuation lines are folded into the preceding value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMessage {
    pub message: String,
    pub fields: HashMap<String, Vec<String>>,
}

impl CommitMessage {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.first()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub short: String,
    pub message: String,
    pub author: Option<AuthorInfo>,
    pub committer: Option<AuthorInfo>,
    pub timestamp: Option<i64>,
    pub relative_time: Option<String>,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub fields: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionList {
    pub revs: Vec<String>,
    pub total: usize,
}

impl From<Vec<String>> for RevisionList {
    fn from(revs: Vec<String>) -> Self {
        Self {
            total: revs.len(),
            revs,
        }
    }
}
