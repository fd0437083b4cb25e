use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub path: String,
    pub head: Option<String>,
    pub head_branch: Option<String>,
    pub youngest: Option<String>,
    pub oldest: Option<String>,
    pub commit_count: usize,
    pub tag_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub rev: String,
    pub short: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub changed: bool,
}

/// Version reported by `git version`, checked against the oldest release
/// whose plumbing output the parsers understand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitVersion {
    pub version: String,
    /// Leading numeric components, e.g. `[2, 43, 0]` for `2.43.0.windows.1`
    pub components: Vec<u32>,
    pub minimum: String,
    pub compatible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub commits: usize,
    pub tags: usize,
    pub cached_messages: usize,
    pub cached_sizes: usize,
    /// Seconds since the graph was built, if one is cached
    pub graph_age_secs: Option<u64>,
}
