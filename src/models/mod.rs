//! Data transfer objects shared by the cache and the JSON adapter.
//!
//! - `commit`: CommitMessage, CommitDetail, AuthorInfo, RevisionList
//! - `diff`: Change, ChangeAction for `diff-tree` records
//! - `blame`: BlameResponse, BlameLine for per-line attribution
//! - `tree`: TreeEntry, EntryType, BranchInfo
//! - `repository`: RepositoryInfo, RevisionInfo, GitVersion, CacheStats

pub mod blame;
pub mod commit;
pub mod diff;
pub mod repository;
pub mod tree;

pub use blame::*;
pub use commit::*;
pub use diff::*;
pub use repository::*;
pub use tree::*;
