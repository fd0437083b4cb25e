use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::git::cache::RepositoryCache;
use crate::git::parse::{first_line, parse_rev_lines, parse_signature};
use crate::git::repository::format_relative_time;
use crate::models::CommitDetail;

impl RepositoryCache {
    /// Most recent commit reachable from `sha` that touched `path`.
    pub fn last_change(&self, sha: &str, path: &str) -> Result<Option<String>> {
        let output = self.git().rev_list_path(sha, path, Some(1))?;
        Ok(first_line(&output))
    }

    /// Commits reachable from `sha` that touched `path`, newest first.
    pub fn history(&self, sha: &str, path: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let output = self.git().rev_list_path(sha, path, limit)?;
        Ok(parse_rev_lines(&output))
    }

    /// Commits on any ref made between `start` and `stop`, oldest first.
    pub fn history_timerange(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Vec<String>> {
        let output = self.git().rev_list_timerange(start.timestamp(), stop.timestamp())?;
        Ok(parse_rev_lines(&output))
    }

    /// Whether `rev2` descends from `rev1`.
    pub fn rev_is_ancestor_of(&self, rev1: &str, rev2: &str) -> Result<bool> {
        let rev2 = rev2.trim();
        Ok(self
            .children_recursive(rev1.trim())?
            .any(|rev| &*rev == rev2))
    }

    /// Commit metadata joined with its position in the graph.
    pub fn commit_detail(&self, sha: &str) -> Result<CommitDetail> {
        let commit = self.read_commit(sha)?;
        let graph = self.graph()?;

        let author = commit.field("author").and_then(parse_signature);
        let committer = commit.field("committer").and_then(parse_signature);
        let timestamp = committer.as_ref().or(author.as_ref()).map(|(_, ts)| *ts);

        Ok(CommitDetail {
            sha: sha.to_string(),
            short: graph.shortrev(sha, 7).unwrap_or_else(|| sha.to_string()),
            message: commit.message.clone(),
            author: author.map(|(info, _)| info),
            committer: committer.map(|(info, _)| info),
            timestamp,
            relative_time: timestamp.map(format_relative_time),
            parents: graph.parents(sha).iter().map(|rev| rev.to_string()).collect(),
            children: graph.children(sha).iter().map(|rev| rev.to_string()).collect(),
            fields: commit.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::git::cache::{CacheConfig, RepositoryCache};
    use crate::git::command::ObjectKind;
    use crate::git::command::fake::FakeGateway;
    use std::sync::Arc;

    fn sha(prefix: &str) -> String {
        format!("{:0<40}", prefix)
    }

    /// a <- b, a <- c, {b, c} <- d
    fn merge_history() -> String {
        [
            format!("{} {} {}", sha("dddd"), sha("bbbb"), sha("cccc")),
            format!("{} {}", sha("cccc"), sha("aaaa")),
            format!("{} {}", sha("bbbb"), sha("aaaa")),
            sha("aaaa"),
        ]
        .join("\n")
    }

    #[test]
    fn test_ancestry() {
        let fake = Arc::new(FakeGateway::with_history(&merge_history()));
        let cache = RepositoryCache::with_gateway("/repo", fake, &CacheConfig::default());

        assert!(cache.rev_is_ancestor_of(&sha("aaaa"), &sha("dddd")).unwrap());
        assert!(cache.rev_is_ancestor_of(&sha("bbbb"), &sha("dddd")).unwrap());
        assert!(!cache.rev_is_ancestor_of(&sha("bbbb"), &sha("cccc")).unwrap());
        assert!(!cache.rev_is_ancestor_of(&sha("dddd"), &sha("aaaa")).unwrap());
        assert!(!cache.rev_is_ancestor_of(&sha("aaaa"), &sha("aaaa")).unwrap());
    }

    #[test]
    fn test_commit_detail() {
        let raw = format!(
            "tree {t}\nparent {b}\nparent {c}\nauthor Alice <alice@example.com> 1700000000 +0100\n\
             committer Bob <bob@example.com> 1700000500 +0000\n\nMerge branch 'c'\n",
            t = sha("eeee"),
            b = sha("bbbb"),
            c = sha("cccc")
        );
        let fake = Arc::new(
            FakeGateway::with_history(&merge_history()).object(ObjectKind::Commit, &sha("dddd"), raw.as_bytes()),
        );
        let cache = RepositoryCache::with_gateway("/repo", fake, &CacheConfig::default());

        let detail = cache.commit_detail(&sha("dddd")).unwrap();
        assert_eq!(detail.short, "dddd000");
        assert_eq!(detail.message, "Merge branch 'c'");
        assert_eq!(detail.author.unwrap().name, "Alice");
        assert_eq!(detail.committer.unwrap().email, "bob@example.com");
        assert_eq!(detail.timestamp, Some(1_700_000_500));
        assert_eq!(detail.parents, vec![sha("bbbb"), sha("cccc")]);
        assert!(detail.children.is_empty());
        assert_eq!(detail.fields["parent"].len(), 2);
    }
}
