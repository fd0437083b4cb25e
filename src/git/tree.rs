use crate::error::{AppError, Result};
use crate::git::cache::RepositoryCache;
use crate::git::command::ObjectKind;
use crate::git::parse::{first_line, parse_branches, parse_ls_tree, parse_rev_lines};
use crate::models::{BranchInfo, EntryType, TreeEntry};

impl RepositoryCache {
    /// Entries of the tree at `rev`, or of the subtree/file at `path` in it.
    pub fn ls_tree(&self, rev: &str, path: &str) -> Result<Vec<TreeEntry>> {
        let path = path.trim_start_matches('/');
        let raw = self.git().ls_tree(rev, path)?;
        parse_ls_tree(&raw)
    }

    /// Like `ls_tree`, with blob sizes filled in from the size cache.
    pub fn tree_entries(&self, rev: &str, path: &str) -> Result<Vec<TreeEntry>> {
        let mut entries = self.ls_tree(rev, path)?;
        for entry in &mut entries {
            if matches!(entry.entry_type, EntryType::File | EntryType::Symlink) {
                entry.size = Some(self.get_obj_size(&entry.sha)?);
            }
        }
        Ok(entries)
    }

    /// Raw blob content
    pub fn get_file(&self, sha: &str) -> Result<Vec<u8>> {
        self.git()
            .cat_file(ObjectKind::Blob, sha)
            .map_err(|err| match err {
                AppError::UnknownRevision(_) => AppError::UnknownRevision(format!("blob '{}' not found", sha)),
                err => err,
            })
    }

    /// Size in bytes of any object, cached per id.
    pub fn get_obj_size(&self, sha: &str) -> Result<u64> {
        let key = sha.to_string();
        if let Some(size) = self.object_sizes().get(&key)? {
            return Ok(size);
        }

        let size = first_line(&self.git().object_size(sha)?)
            .and_then(|line| line.parse::<u64>().ok())
            .ok_or_else(|| AppError::UnknownRevision(format!("object '{}' not found", sha)))?;

        self.object_sizes().set(key, size)?;
        Ok(size)
    }

    /// Local branches, the checked-out one first.
    pub fn get_branches(&self) -> Result<Vec<BranchInfo>> {
        Ok(parse_branches(&self.git().branches()?))
    }

    pub fn get_tags(&self) -> Result<Vec<String>> {
        Ok(parse_rev_lines(&self.git().tags()?))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::git::cache::{CacheConfig, RepositoryCache};
    use crate::git::command::ObjectKind;
    use crate::git::command::fake::FakeGateway;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    const BLOB: &str = "b45ef6fec89518d314f546fd6c3025367b721684";

    #[test]
    fn test_object_size_is_cached() {
        let fake = Arc::new(FakeGateway::default().object(ObjectKind::Blob, BLOB, b"hello world\n"));
        let cache = RepositoryCache::with_gateway("/repo", fake.clone(), &CacheConfig::default());

        assert_eq!(cache.get_obj_size(BLOB).unwrap(), 12);
        assert_eq!(cache.get_obj_size(BLOB).unwrap(), 12);
        assert_eq!(fake.size_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get_file(BLOB).unwrap(), b"hello world\n");

        assert!(matches!(
            cache.get_obj_size("0000000000000000000000000000000000000000"),
            Err(AppError::UnknownRevision(_))
        ));
    }

    #[test]
    fn test_unknown_blob_is_not_an_empty_file() {
        let fake = Arc::new(FakeGateway::default().object(ObjectKind::Blob, BLOB, b""));
        let cache = RepositoryCache::with_gateway("/repo", fake, &CacheConfig::default());

        assert!(cache.get_file(BLOB).unwrap().is_empty());
        assert!(matches!(
            cache.get_file("0000000000000000000000000000000000000000"),
            Err(AppError::UnknownRevision(_))
        ));
    }

    #[test]
    fn test_size_cache_respects_capacity() {
        let fake = Arc::new(
            FakeGateway::default()
                .object(ObjectKind::Blob, "aaaa", b"a")
                .object(ObjectKind::Blob, "bbbb", b"bb")
                .object(ObjectKind::Blob, "cccc", b"ccc"),
        );
        let config = CacheConfig {
            object_size_cache_size: 2,
            ..CacheConfig::default()
        };
        let cache = RepositoryCache::with_gateway("/repo", fake.clone(), &config);

        for sha in ["aaaa", "bbbb", "cccc", "aaaa"] {
            cache.get_obj_size(sha).unwrap();
        }
        assert_eq!(fake.size_calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.stats().unwrap().cached_sizes, 2);
    }

    #[test]
    fn test_branches() {
        let mut fake = FakeGateway::default();
        fake.branch_output = format!(
            "  dev  {} wip\n* main {} tip\n",
            "1".repeat(40),
            "2".repeat(40)
        );
        let cache = RepositoryCache::with_gateway("/repo", Arc::new(fake), &CacheConfig::default());

        let branches = cache.get_branches().unwrap();
        assert_eq!(branches[0].name, "main");
        assert_eq!(branches[1].name, "dev");
    }
}
