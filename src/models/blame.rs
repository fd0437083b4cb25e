//! Blame data transfer objects.
//!
//! Per-line attribution parsed from `git blame -p`: which commit last
//! touched each line of a file.

use serde::Serialize;

/// Response for blame request on a file at a specific commit.
#[derive(Debug, Serialize)]
pub struct BlameResponse {
    /// Path of the file
    pub path: String,
    /// Commit where blame was calculated
    pub commit: String,
    /// Per-line blame information
    pub lines: Vec<BlameLine>,
}

/// Blame information for a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameLine {
    /// Commit that last modified this line
    pub sha: String,
    /// Line number in the blamed revision (1-indexed)
    pub line_number: u32,
}
