use crate::error::Result;
use crate::git::cache::RepositoryCache;
use crate::git::parse::{parse_blame, parse_diff_tree};
use crate::models::{BlameLine, Change};

impl RepositoryCache {
    /// Changes between two tree-ish ids. Without `tree1` the comparison is
    /// against the empty tree.
    pub fn diff_tree(
        &self,
        tree1: Option<&str>,
        tree2: &str,
        path: &str,
        find_renames: bool,
    ) -> Result<Vec<Change>> {
        let path = path.trim_start_matches('/');
        let raw = self.git().diff_tree(tree1, tree2, path, find_renames)?;
        parse_diff_tree(&raw, tree1.is_none())
    }

    /// Changes introduced by a commit relative to its first parent.
    pub fn commit_changes(&self, sha: &str) -> Result<Vec<Change>> {
        let parents = self.parents(sha)?;
        self.diff_tree(parents.first().map(String::as_str), sha, "", true)
    }

    /// Commit that last touched each line of `path` as of `sha`.
    pub fn blame(&self, sha: &str, path: &str) -> Result<Vec<BlameLine>> {
        let path = path.trim_start_matches('/');
        parse_blame(&self.git().blame(sha, path)?)
    }
}
