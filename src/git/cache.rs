//! Per-repository revision cache.
//!
//! Owns the commit graph plus two bounded caches:
//! - Commit graph: built lazily on first query, dropped by `sync()` when the
//!   youngest commit changes, rebuilt under the graph lock so no caller ever
//!   sees a half-built graph
//! - Commit messages (default 200) and object sizes (default 2000): immutable
//!   per id, so they are never invalidated, only evicted
//!
//! Invalidation is explicit. Nothing polls the repository; callers run
//! `sync()` when they want to pick up new commits.
//!
//! Used by: `Registry` in registry.rs, the query methods in history.rs,
//! tree.rs and diff.rs, and the JSON routes

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::command::{Gateway, GitCli, ObjectKind};
use crate::git::fifo::BoundedCache;
use crate::git::graph::{CommitGraph, Descendants, is_sha};
use crate::git::parse::{first_line, parse_commit, parse_tag_object};
use crate::git::repository::check_control_files;
use crate::models::{CacheStats, CommitMessage};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Executable used for every repository query
    pub git_bin: String,
    pub commit_cache_size: usize,
    pub object_size_cache_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            git_bin: "git".to_string(),
            commit_cache_size: 200,
            object_size_cache_size: 2000,
        }
    }
}

pub struct RepositoryCache {
    git: Arc<dyn Gateway>,
    git_dir: PathBuf,
    graph: Mutex<Option<Arc<CommitGraph>>>,
    commit_messages: BoundedCache<String, CommitMessage>,
    object_sizes: BoundedCache<String, u64>,
    commit_encoding: OnceLock<String>,
}

impl RepositoryCache {
    /// Open the git directory at `git_dir` through the `git` binary.
    ///
    /// Only checks that the control files exist; the graph is built on the
    /// first query.
    pub fn open<P: AsRef<Path>>(git_dir: P, config: &CacheConfig) -> Result<Self> {
        let git_dir = git_dir.as_ref();
        check_control_files(git_dir)?;

        let git = Arc::new(GitCli::new(config.git_bin.clone(), Some(git_dir)));
        Ok(Self::with_gateway(git_dir, git, config))
    }

    /// Build a cache over an arbitrary gateway. No filesystem checks.
    pub fn with_gateway<P: AsRef<Path>>(
        git_dir: P,
        git: Arc<dyn Gateway>,
        config: &CacheConfig,
    ) -> Self {
        let git_dir = git_dir.as_ref().to_path_buf();
        tracing::debug!("revision cache constructed for '{}'", git_dir.display());

        Self {
            git,
            git_dir,
            graph: Mutex::new(None),
            commit_messages: BoundedCache::new(config.commit_cache_size),
            object_sizes: BoundedCache::new(config.object_size_cache_size),
            commit_encoding: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.git_dir
    }

    pub(crate) fn git(&self) -> &dyn Gateway {
        self.git.as_ref()
    }

    fn lock_graph(&self) -> Result<MutexGuard<'_, Option<Arc<CommitGraph>>>> {
        self.graph.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))
    }

    //
    // cache handling
    //

    /// Drop the cached graph if the repository's youngest commit moved.
    ///
    /// Returns whether the graph was invalidated (always true when no graph
    /// was cached).
    pub fn sync(&self) -> Result<bool> {
        let youngest = first_line(&self.git.youngest()?);

        let mut slot = self.lock_graph()?;
        let need_update = match slot.as_ref() {
            Some(graph) if graph.youngest() == youngest.as_deref() => false,
            Some(graph) => {
                tracing::debug!(
                    "invalidated caches ({:?} != {:?})",
                    graph.youngest(),
                    youngest
                );
                true
            }
            None => true,
        };

        if need_update {
            *slot = None;
        }
        Ok(need_update)
    }

    /// Current commit graph, rebuilding it first if it was invalidated.
    pub fn graph(&self) -> Result<Arc<CommitGraph>> {
        let mut slot = self.lock_graph()?;
        if let Some(graph) = slot.as_ref() {
            return Ok(Arc::clone(graph));
        }

        tracing::debug!("triggered rebuild of commit graph for '{}'", self.git_dir.display());
        let start = Instant::now();

        let tags = self.git.tag_targets()?;
        let rev_list = self.git.rev_list_all()?;
        let graph = Arc::new(CommitGraph::build(&rev_list, &tags)?);

        tracing::info!(
            "rebuilt commit graph for '{}' with {} entries in {:?}",
            self.git_dir.display(),
            graph.len(),
            start.elapsed()
        );

        *slot = Some(Arc::clone(&graph));
        Ok(graph)
    }

    pub fn youngest_rev(&self) -> Result<Option<String>> {
        Ok(self.graph()?.youngest().map(str::to_string))
    }

    pub fn oldest_rev(&self) -> Result<Option<String>> {
        Ok(self.graph()?.oldest().map(str::to_string))
    }

    /// All known commit ids, youngest first.
    pub fn all_revs(&self) -> Result<Vec<String>> {
        Ok(self.graph()?.revs().map(|rev| rev.to_string()).collect())
    }

    //
    // revision lookups
    //

    /// Commit `offset` positions away from `sha` in history order; negative
    /// offsets move towards the youngest commit.
    pub fn history_relative_rev(&self, sha: &str, offset: isize) -> Result<Option<String>> {
        let graph = self.graph()?;
        Ok(graph.relative(sha, offset)?.map(|rev| rev.to_string()))
    }

    pub fn hist_next_revision(&self, sha: &str) -> Result<Option<String>> {
        self.history_relative_rev(sha, -1)
    }

    pub fn hist_prev_revision(&self, sha: &str) -> Result<Option<String>> {
        self.history_relative_rev(sha, 1)
    }

    pub fn fullrev(&self, srev: &str) -> Result<Option<String>> {
        Ok(self.graph()?.fullrev(srev).map(|rev| rev.to_string()))
    }

    pub fn shortrev(&self, rev: &str, min_len: usize) -> Result<Option<String>> {
        Ok(self.graph()?.shortrev(rev, min_len))
    }

    /// Resolve any revision expression to a known commit id.
    ///
    /// Hex strings are tried as (short) ids first, then git resolves the
    /// expression. Annotated tags are peeled to the commit they point at.
    pub fn verifyrev(&self, rev: &str) -> Result<Option<String>> {
        let graph = self.graph()?;

        if is_sha(rev) {
            if let Some(full) = graph.fullrev(rev) {
                return Ok(Some(full.to_string()));
            }
        }

        let Some(resolved) = first_line(&self.git.rev_parse_verify(rev)?) else {
            return Ok(None);
        };

        if graph.contains(&resolved) {
            return Ok(Some(resolved));
        }

        if graph.is_tag(&resolved) {
            let raw = self.git.cat_file(ObjectKind::Tag, &resolved)?;
            let target = parse_tag_object(&String::from_utf8_lossy(&raw));
            if target.is_none() {
                tracing::debug!("unexpected result from 'git cat-file tag {}'", resolved);
            }
            return Ok(target);
        }

        Ok(None)
    }

    /// Current HEAD commit id
    pub fn head(&self) -> Result<Option<String>> {
        self.verifyrev("HEAD")
    }

    /// Direct children; empty for unknown ids.
    pub fn children(&self, sha: &str) -> Result<Vec<String>> {
        Ok(self.graph()?.children(sha).iter().map(|rev| rev.to_string()).collect())
    }

    /// Direct parents; empty for unknown ids.
    pub fn parents(&self, sha: &str) -> Result<Vec<String>> {
        Ok(self.graph()?.parents(sha).iter().map(|rev| rev.to_string()).collect())
    }

    /// Lazy breadth-first walk over every descendant of `sha`.
    pub fn children_recursive(&self, sha: &str) -> Result<Descendants> {
        let graph = self.graph()?;
        if !graph.contains(sha) {
            return Err(AppError::UnknownRevision(sha.to_string()));
        }
        Ok(Descendants::new(graph, sha))
    }

    //
    // commit objects
    //

    /// Encoding declared by `i18n.commitEncoding`, read once.
    pub fn commit_encoding(&self) -> Result<String> {
        if let Some(encoding) = self.commit_encoding.get() {
            return Ok(encoding.clone());
        }

        let encoding = first_line(&self.git.config_get("i18n.commitEncoding")?)
            .unwrap_or_else(|| "utf-8".to_string());
        if !matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
            tracing::warn!(
                "commit encoding '{}' is decoded as UTF-8 with replacement characters",
                encoding
            );
        }

        Ok(self.commit_encoding.get_or_init(|| encoding).clone())
    }

    /// Message and header fields of a known commit.
    pub fn read_commit(&self, sha: &str) -> Result<CommitMessage> {
        if sha.is_empty() {
            return Err(AppError::UnknownRevision("read_commit called with empty id".to_string()));
        }

        if !self.graph()?.contains(sha) {
            tracing::info!("read_commit failed for '{}'", sha);
            return Err(AppError::UnknownRevision(sha.to_string()));
        }

        if let Some(commit) = self.commit_messages.get(&sha.to_string())? {
            return Ok(commit);
        }

        // Only warns about non-UTF-8 encodings; decoding is always lossy UTF-8
        self.commit_encoding()?;
        let missing = || AppError::Inconsistent(format!("commit {} has no object", sha));
        let raw = match self.git.cat_file(ObjectKind::Commit, sha) {
            Err(AppError::UnknownRevision(_)) => return Err(missing()),
            raw => raw?,
        };
        let commit = parse_commit(&String::from_utf8_lossy(&raw)).ok_or_else(missing)?;

        self.commit_messages.set(sha.to_string(), commit.clone())?;
        Ok(commit)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let slot = self.lock_graph()?;
        let graph = slot.as_ref();

        Ok(CacheStats {
            commits: graph.map_or(0, |g| g.len()),
            tags: graph.map_or(0, |g| g.tag_count()),
            cached_messages: self.commit_messages.len(),
            cached_sizes: self.object_sizes.len(),
            graph_age_secs: graph.map(|g| g.built_at().elapsed().as_secs()),
        })
    }

    pub(crate) fn object_sizes(&self) -> &BoundedCache<String, u64> {
        &self.object_sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::command::fake::FakeGateway;
    use std::sync::Barrier;
    use std::sync::atomic::Ordering;
    use std::thread;

    fn sha(prefix: &str) -> String {
        format!("{:0<40}", prefix)
    }

    fn history(lines: &[&[&str]]) -> String {
        lines
            .iter()
            .map(|revs| revs.iter().map(|r| sha(r)).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn cache_over(fake: &Arc<FakeGateway>) -> RepositoryCache {
        RepositoryCache::with_gateway("/repo/.git", fake.clone(), &CacheConfig::default())
    }

    /// r1 <- r2 <- r3
    fn linear() -> String {
        history(&[&["3333", "2222"], &["2222", "1111"], &["1111"]])
    }

    #[test]
    fn test_sync_invalidates_once_per_new_commit() {
        let fake = Arc::new(FakeGateway::with_history(&history(&[&["2222", "1111"], &["1111"]])));
        let cache = cache_over(&fake);

        assert!(cache.sync().unwrap(), "nothing cached yet");
        assert_eq!(cache.youngest_rev().unwrap(), Some(sha("2222")));
        assert!(!cache.sync().unwrap());
        assert!(!cache.sync().unwrap());
        cache.graph().unwrap();
        assert_eq!(fake.rev_list_calls.load(Ordering::SeqCst), 1);

        fake.set_history(&linear());
        assert!(cache.sync().unwrap());
        let graph = cache.graph().unwrap();
        assert_eq!(graph.youngest(), Some(sha("3333").as_str()));
        assert_eq!(graph.len(), 3);
        assert!(!cache.sync().unwrap());
        assert_eq!(fake.rev_list_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_readers_share_one_rebuild() {
        let fake = Arc::new(FakeGateway::with_history(&linear()));
        let cache = Arc::new(cache_over(&fake));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.graph().unwrap()
                })
            })
            .collect();

        let graphs: Vec<Arc<CommitGraph>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(graphs.iter().all(|g| Arc::ptr_eq(g, &graphs[0])));
        assert_eq!(fake.rev_list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_rebuild_publishes_nothing() {
        let fake = Arc::new(FakeGateway::with_history(&history(&[&["2222", "1111"]])));
        let cache = cache_over(&fake);

        assert!(matches!(cache.graph(), Err(AppError::Inconsistent(_))));
        assert_eq!(cache.stats().unwrap().commits, 0);

        fake.set_history(&linear());
        assert_eq!(cache.graph().unwrap().len(), 3);
    }

    #[test]
    fn test_history_relative_rev() {
        let fake = Arc::new(FakeGateway::with_history(&linear()));
        let cache = cache_over(&fake);

        assert_eq!(cache.history_relative_rev(&sha("3333"), 2).unwrap(), Some(sha("1111")));
        assert_eq!(cache.history_relative_rev(&sha("1111"), 1).unwrap(), None);
        assert_eq!(cache.history_relative_rev(&sha("2222"), 0).unwrap(), Some(sha("2222")));
        assert_eq!(cache.hist_next_revision(&sha("2222")).unwrap(), Some(sha("3333")));
        assert_eq!(cache.hist_prev_revision(&sha("2222")).unwrap(), Some(sha("1111")));
        assert!(matches!(
            cache.history_relative_rev(&sha("9999"), 1),
            Err(AppError::UnknownRevision(_))
        ));
    }

    #[test]
    fn test_children_recursive_requires_known_commit() {
        let fake = Arc::new(FakeGateway::with_history(&linear()));
        let cache = cache_over(&fake);

        let descendants: Vec<String> = cache
            .children_recursive(&sha("1111"))
            .unwrap()
            .map(|rev| rev.to_string())
            .collect();
        assert_eq!(descendants, vec![sha("2222"), sha("3333")]);
        assert!(matches!(
            cache.children_recursive(&sha("9999")),
            Err(AppError::UnknownRevision(_))
        ));
        assert!(cache.children(&sha("9999")).unwrap().is_empty());
        assert_eq!(cache.parents(&sha("3333")).unwrap(), vec![sha("2222")]);
    }

    #[test]
    fn test_verifyrev_resolves_short_refs_and_tags() {
        let tag_object = sha("7777");
        let tag_body = format!("object {}\ntype commit\ntag v1\n\nfirst release\n", sha("1111"));
        let fake = Arc::new(
            FakeGateway::with_history(&linear())
                .reference("HEAD", &sha("3333"))
                .reference("main~1", &sha("2222"))
                .reference("v1", &tag_object)
                .tag_target(&tag_object)
                .object(ObjectKind::Tag, &tag_object, tag_body.as_bytes()),
        );
        let cache = cache_over(&fake);

        assert_eq!(cache.verifyrev("2222").unwrap(), Some(sha("2222")));
        assert_eq!(cache.head().unwrap(), Some(sha("3333")));
        assert_eq!(cache.verifyrev("main~1").unwrap(), Some(sha("2222")));
        assert_eq!(cache.verifyrev("v1").unwrap(), Some(sha("1111")));
        assert_eq!(cache.verifyrev("nope").unwrap(), None);
    }

    #[test]
    fn test_read_commit_is_cached() {
        let raw = format!(
            "tree {}\nparent {}\nauthor A <a@x> 1700000000 +0000\ncommitter A <a@x> 1700000000 +0000\n\nsecond\n",
            sha("eeee"),
            sha("1111")
        );
        let fake = Arc::new(
            FakeGateway::with_history(&history(&[&["2222", "1111"], &["1111"]]))
                .object(ObjectKind::Commit, &sha("2222"), raw.as_bytes()),
        );
        let cache = cache_over(&fake);

        let first = cache.read_commit(&sha("2222")).unwrap();
        let second = cache.read_commit(&sha("2222")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.message, "second");
        assert_eq!(first.field("parent"), Some(sha("1111").as_str()));
        assert_eq!(fake.cat_file_calls.load(Ordering::SeqCst), 1);

        assert!(matches!(
            cache.read_commit(&sha("9999")),
            Err(AppError::UnknownRevision(_))
        ));
        assert!(matches!(
            cache.read_commit(&sha("1111")),
            Err(AppError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_commit_encoding_defaults_to_utf8() {
        let fake = Arc::new(FakeGateway::with_history(&linear()));
        let cache = cache_over(&fake);
        assert_eq!(cache.commit_encoding().unwrap(), "utf-8");
    }

    #[test]
    fn test_stats_track_graph_state() {
        let fake = Arc::new(FakeGateway::with_history(&linear()).tag_target(&sha("1111")));
        let cache = cache_over(&fake);

        let before = cache.stats().unwrap();
        assert_eq!(before.commits, 0);
        assert!(before.graph_age_secs.is_none());

        cache.graph().unwrap();
        let after = cache.stats().unwrap();
        assert_eq!(after.commits, 3);
        assert_eq!(after.tags, 1);
        assert!(after.graph_age_secs.is_some());
    }
}
