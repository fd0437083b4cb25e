pub mod cache;
pub mod command;
pub mod diff;
pub mod fifo;
pub mod graph;
pub mod history;
pub mod parse;
pub mod registry;
pub mod repository;
pub mod tree;

use std::sync::Arc;

pub use cache::{CacheConfig, RepositoryCache};
pub use command::{Gateway, GitCli, ObjectKind};
pub use graph::{CommitGraph, Descendants, Sha};
pub use registry::{Registry, Retention};
pub use repository::{discover_git_dir, git_version};

pub type SharedCache = Arc<RepositoryCache>;
