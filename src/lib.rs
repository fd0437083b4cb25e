//! git-revcache - shared, in-memory index of a git repository's history
//!
//! Answers ancestry, ordering and short-id queries from a commit graph that
//! is built once per change of the youngest commit instead of walking the
//! history on every request.
//!
//! # Example
//!
//! ```no_run
//! use git_revcache::git::{CacheConfig, Registry, Retention, discover_git_dir};
//!
//! let registry = Registry::new(CacheConfig::default());
//! let git_dir = discover_git_dir(".").unwrap();
//! let cache = registry.acquire(&git_dir, Retention::Weak).unwrap();
//!
//! let head = cache.head().unwrap().unwrap();
//! println!("{} ({})", cache.shortrev(&head, 7).unwrap().unwrap(), head);
//! ```

pub mod error;
pub mod git;
pub mod models;
pub mod routes;
