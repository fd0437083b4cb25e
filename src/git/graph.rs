//! In-memory commit graph.
//!
//! Built in one pass over `git rev-list --parents --all` (newest first) and
//! never mutated afterwards; the owning cache swaps in a whole new graph when
//! it goes stale.
//!
//! - Nodes: parents, children and a dense ordinal (1 = youngest)
//! - Short-id buckets keyed by the first four hex digits, for `fullrev` and
//!   `shortrev` without scanning the node table
//! - Ordinal index for constant-time relative history navigation
//!
//! Used by: `RepositoryCache` in cache.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AppError, Result};

/// Shared commit id; one allocation per id across nodes, edges and buckets.
pub type Sha = Arc<str>;

/// Minimum short-rev length
pub const SHORT_REV_MIN: usize = 4;

/// Above this many distinct buckets a flat 64K table is cheaper than a map.
const DENSE_INDEX_THRESHOLD: usize = 5000;

/// Whether `rev` could be a (possibly abbreviated) commit id.
pub fn is_sha(rev: &str) -> bool {
    (SHORT_REV_MIN..=40).contains(&rev.len()) && rev.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Bucket key from the first four hex digits.
fn rev_key(rev: &str) -> Option<u16> {
    rev.get(..SHORT_REV_MIN)
        .and_then(|prefix| u16::from_str_radix(prefix, 16).ok())
}

#[derive(Debug, Clone)]
pub struct CommitNode {
    pub parents: Vec<Sha>,
    pub children: Vec<Sha>,
    /// 1 for the youngest commit, 0 only while a forward reference
    pub ordinal: usize,
}

impl CommitNode {
    fn stand_in() -> Self {
        Self {
            parents: Vec::new(),
            children: Vec::new(),
            ordinal: 0,
        }
    }
}

enum ShortIndex {
    Sparse(HashMap<u16, Vec<Sha>>),
    Dense(Vec<Vec<Sha>>),
}

impl ShortIndex {
    fn from_buckets(buckets: HashMap<u16, Vec<Sha>>) -> Self {
        if buckets.len() <= DENSE_INDEX_THRESHOLD {
            return ShortIndex::Sparse(buckets);
        }

        let size = buckets.keys().max().map_or(0, |&k| k as usize + 1);
        let mut table = vec![Vec::new(); size];
        for (key, revs) in buckets {
            table[key as usize] = revs;
        }
        ShortIndex::Dense(table)
    }

    fn bucket(&self, key: u16) -> &[Sha] {
        match self {
            ShortIndex::Sparse(map) => map.get(&key).map(Vec::as_slice).unwrap_or(&[]),
            ShortIndex::Dense(table) => table.get(key as usize).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

pub struct CommitGraph {
    youngest: Option<Sha>,
    oldest: Option<Sha>,
    nodes: HashMap<Sha, CommitNode>,
    /// `by_ordinal[n - 1]` is the commit with ordinal `n`
    by_ordinal: Vec<Sha>,
    tags: HashSet<Sha>,
    short_index: ShortIndex,
    built_at: Instant,
}

impl CommitGraph {
    /// Build the graph from `rev-list --parents --all` output and the
    /// `rev-parse --tags` target list.
    pub fn build(rev_list: &str, tag_targets: &str) -> Result<Self> {
        let mut seen: HashSet<Sha> = HashSet::new();
        let mut intern = |rev: &str| -> Sha {
            if let Some(existing) = seen.get(rev) {
                return existing.clone();
            }
            let rev: Sha = Arc::from(rev);
            seen.insert(rev.clone());
            rev
        };

        let tags: HashSet<Sha> = tag_targets
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(&mut intern)
            .collect();

        let mut nodes: HashMap<Sha, CommitNode> = HashMap::new();
        let mut buckets: HashMap<u16, Vec<Sha>> = HashMap::new();
        let mut by_ordinal: Vec<Sha> = Vec::new();

        for line in rev_list.lines() {
            let mut revs = line.split_whitespace().map(&mut intern);
            let Some(rev) = revs.next() else {
                continue;
            };
            let parents: Vec<Sha> = revs.collect();

            let key = rev_key(&rev)
                .filter(|_| is_sha(&rev))
                .ok_or_else(|| AppError::MalformedOutput(format!("not a commit id: {}", line)))?;

            let ordinal = by_ordinal.len() + 1;

            match nodes.get_mut(&rev) {
                // Seen before as somebody's parent; complete the stand-in
                Some(node) => {
                    if node.ordinal != 0 || !node.parents.is_empty() {
                        return Err(AppError::Inconsistent(format!(
                            "commit {} listed twice",
                            rev
                        )));
                    }
                    node.parents = parents.clone();
                    node.ordinal = ordinal;
                }
                None => {
                    nodes.insert(
                        rev.clone(),
                        CommitNode {
                            parents: parents.clone(),
                            children: Vec::new(),
                            ordinal,
                        },
                    );
                }
            }

            for parent in &parents {
                let node = nodes.entry(parent.clone()).or_insert_with(CommitNode::stand_in);
                if !node.children.contains(&rev) {
                    node.children.push(rev.clone());
                }
            }

            buckets.entry(key).or_default().push(rev.clone());
            by_ordinal.push(rev);
        }

        if let Some((rev, _)) = nodes.iter().find(|(_, node)| node.ordinal == 0) {
            return Err(AppError::Inconsistent(format!(
                "parent {} referenced but never listed",
                rev
            )));
        }
        if nodes.len() != by_ordinal.len() {
            return Err(AppError::Inconsistent(format!(
                "{} nodes for {} ordinals",
                nodes.len(),
                by_ordinal.len()
            )));
        }

        Ok(Self {
            youngest: by_ordinal.first().cloned(),
            oldest: by_ordinal.last().cloned(),
            nodes,
            by_ordinal,
            tags,
            short_index: ShortIndex::from_buckets(buckets),
            built_at: Instant::now(),
        })
    }

    pub fn youngest(&self) -> Option<&str> {
        self.youngest.as_deref()
    }

    pub fn oldest(&self) -> Option<&str> {
        self.oldest.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, rev: &str) -> bool {
        self.nodes.contains_key(rev)
    }

    pub fn ordinal(&self, rev: &str) -> Option<usize> {
        self.nodes.get(rev).map(|node| node.ordinal)
    }

    pub fn parents(&self, rev: &str) -> &[Sha] {
        self.nodes.get(rev).map(|n| n.parents.as_slice()).unwrap_or(&[])
    }

    pub fn children(&self, rev: &str) -> &[Sha] {
        self.nodes.get(rev).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_tag(&self, rev: &str) -> bool {
        self.tags.contains(rev)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// All commit ids, youngest first.
    pub fn revs(&self) -> impl Iterator<Item = &Sha> {
        self.by_ordinal.iter()
    }

    pub fn built_at(&self) -> Instant {
        self.built_at
    }

    /// Expand a short id. Ambiguous prefixes resolve to `None`, same as
    /// unknown ones.
    pub fn fullrev(&self, srev: &str) -> Option<&Sha> {
        if srev.len() == 40 {
            if let Some((rev, _)) = self.nodes.get_key_value(srev) {
                return Some(rev);
            }
        }

        if !is_sha(srev) {
            return None;
        }

        let srev = srev.to_ascii_lowercase();
        let key = rev_key(&srev)?;
        let mut matches = self
            .short_index
            .bucket(key)
            .iter()
            .filter(|rev| rev.starts_with(srev.as_str()));

        match (matches.next(), matches.next()) {
            (Some(rev), None) => Some(rev),
            _ => None,
        }
    }

    /// Shortest prefix of at least `min_len` characters that `fullrev`
    /// resolves back to `rev`.
    pub fn shortrev(&self, rev: &str, min_len: usize) -> Option<String> {
        let min_len = min_len.max(SHORT_REV_MIN);

        if !self.nodes.contains_key(rev) {
            return None;
        }
        if min_len >= rev.len() {
            return Some(rev.to_string());
        }

        let bucket = self.short_index.bucket(rev_key(rev)?);
        if bucket.len() == 1 {
            return Some(rev[..min_len].to_string());
        }

        let others: Vec<&Sha> = bucket.iter().filter(|other| other.as_ref() != rev).collect();
        for len in min_len..rev.len() {
            let prefix = &rev[..len];
            if !others.iter().any(|other| other.starts_with(prefix)) {
                return Some(prefix.to_string());
            }
        }

        Some(rev.to_string())
    }

    /// Commit `offset` steps away from `rev` in ordinal order (negative is
    /// younger). `Ok(None)` when the target falls outside the history.
    pub fn relative(&self, rev: &str, offset: isize) -> Result<Option<&Sha>> {
        let (key, node) = self
            .nodes
            .get_key_value(rev)
            .ok_or_else(|| AppError::UnknownRevision(rev.to_string()))?;

        if offset == 0 {
            return Ok(Some(key));
        }

        let target = match (node.ordinal as isize).checked_add(offset) {
            Some(target) if target >= 1 && target as usize <= self.nodes.len() => target as usize,
            _ => return Ok(None),
        };

        self.by_ordinal
            .get(target - 1)
            .map(Some)
            .ok_or_else(|| AppError::Inconsistent(format!("no commit with ordinal {}", target)))
    }
}

/// Breadth-first walk over all descendants of a commit.
///
/// Holds its own reference to the graph, so it stays valid if the cache
/// swaps in a newer graph mid-iteration.
pub struct Descendants {
    graph: Arc<CommitGraph>,
    queue: VecDeque<Sha>,
    seen: HashSet<Sha>,
}

impl Descendants {
    pub fn new(graph: Arc<CommitGraph>, rev: &str) -> Self {
        let start: Vec<Sha> = graph.children(rev).to_vec();
        Self {
            seen: start.iter().cloned().collect(),
            queue: start.into(),
            graph,
        }
    }
}

impl Iterator for Descendants {
    type Item = Sha;

    fn next(&mut self) -> Option<Sha> {
        let rev = self.queue.pop_front()?;
        for child in self.graph.children(&rev) {
            if self.seen.insert(child.clone()) {
                self.queue.push_back(child.clone());
            }
        }
        Some(rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha(prefix: &str) -> String {
        format!("{:0<40}", prefix)
    }

    fn rev_list(lines: &[&[&str]]) -> String {
        lines
            .iter()
            .map(|revs| revs.iter().map(|r| sha(r)).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// r1 <- r2 <- r3
    fn linear() -> CommitGraph {
        let text = rev_list(&[&["3333", "2222"], &["2222", "1111"], &["1111"]]);
        CommitGraph::build(&text, "").unwrap()
    }

    /// a <- b, a <- c, {b, c} <- d (merge), d <- e
    fn diamond() -> CommitGraph {
        let text = rev_list(&[
            &["eeee", "dddd"],
            &["dddd", "bbbb", "cccc"],
            &["cccc", "aaaa"],
            &["bbbb", "aaaa"],
            &["aaaa"],
        ]);
        CommitGraph::build(&text, "").unwrap()
    }

    #[test]
    fn test_linear_ordinals() {
        let graph = linear();
        assert_eq!(graph.ordinal(&sha("3333")), Some(1));
        assert_eq!(graph.ordinal(&sha("2222")), Some(2));
        assert_eq!(graph.ordinal(&sha("1111")), Some(3));
        assert_eq!(graph.youngest(), Some(sha("3333").as_str()));
        assert_eq!(graph.oldest(), Some(sha("1111").as_str()));
        assert_eq!(graph.ordinal(graph.oldest().unwrap()), Some(graph.len()));
    }

    #[test]
    fn test_relative_navigation() {
        let graph = linear();
        let r1 = sha("1111");
        let r3 = sha("3333");

        assert_eq!(graph.relative(&r3, 2).unwrap().map(|r| r.to_string()), Some(r1.clone()));
        assert!(graph.relative(&r1, 1).unwrap().is_none());
        assert!(graph.relative(&r3, -1).unwrap().is_none());
        assert_eq!(graph.relative(&r1, 0).unwrap().map(|r| r.to_string()), Some(r1.clone()));

        for rev in graph.revs() {
            for k in -3isize..=3 {
                if let Some(moved) = graph.relative(rev, k).unwrap() {
                    let back = graph.relative(moved, -k).unwrap().unwrap();
                    assert_eq!(back, rev);
                }
            }
        }
    }

    #[test]
    fn test_relative_unknown_revision() {
        let graph = linear();
        let err = graph.relative(&sha("9999"), 1).unwrap_err();
        assert!(matches!(err, AppError::UnknownRevision(_)));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let graph = diamond();
        for rev in graph.revs() {
            for parent in graph.parents(rev) {
                assert!(graph.children(parent).contains(rev));
            }
            for child in graph.children(rev) {
                assert!(graph.parents(child).contains(rev));
            }
        }
        assert_eq!(graph.parents(&sha("dddd")).len(), 2);
        assert_eq!(graph.children(&sha("aaaa")).len(), 2);
    }

    #[test]
    fn test_ordinals_are_dense() {
        let graph = diamond();
        let mut ordinals: Vec<usize> = graph.revs().map(|r| graph.ordinal(r).unwrap()).collect();
        ordinals.sort_unstable();
        assert_eq!(ordinals, (1..=graph.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_descendants_visit_each_once() {
        let graph = Arc::new(diamond());
        let root = sha("aaaa");

        let found: Vec<String> = Descendants::new(Arc::clone(&graph), &root)
            .map(|r| r.to_string())
            .collect();

        assert_eq!(found.len(), 4);
        assert!(!found.contains(&root));
        let unique: HashSet<&String> = found.iter().collect();
        assert_eq!(unique.len(), found.len());
        // Breadth first: the merge and its child come after both branches
        assert_eq!(found[2], sha("dddd"));
        assert_eq!(found[3], sha("eeee"));

        assert_eq!(Descendants::new(graph, &sha("eeee")).count(), 0);
    }

    #[test]
    fn test_short_and_full_revs_round_trip() {
        let text = rev_list(&[
            &["abcd1234", "abcd1299"],
            &["abcd1299", "abcd5"],
            &["abcd5", "1234"],
            &["1234"],
        ]);
        let graph = CommitGraph::build(&text, "").unwrap();

        for rev in graph.revs() {
            for k in SHORT_REV_MIN..=40 {
                let short = graph.shortrev(rev, k).unwrap();
                assert!(short.len() >= k.max(SHORT_REV_MIN));
                assert!(rev.starts_with(short.as_str()));
                assert_eq!(graph.fullrev(&short), Some(rev));
            }
        }

        assert_eq!(graph.shortrev(&sha("1234"), 2).unwrap(), "1234");
        assert_eq!(graph.shortrev(&sha("abcd1234"), 4).unwrap(), "abcd123");
        assert_eq!(graph.shortrev(&sha("abcd5"), 4).unwrap(), "abcd5");
    }

    #[test]
    fn test_fullrev_rejects_ambiguous_and_invalid() {
        let text = rev_list(&[&["abcd1234", "abcd1299"], &["abcd1299"]]);
        let graph = CommitGraph::build(&text, "").unwrap();

        assert!(graph.fullrev("abcd12").is_none());
        assert!(graph.fullrev("abc").is_none());
        assert!(graph.fullrev("abcz1234").is_none());
        assert!(graph.fullrev("ffff").is_none());
        assert_eq!(graph.fullrev("ABCD123").map(|r| r.to_string()), Some(sha("abcd1234")));
        assert!(graph.shortrev(&sha("ffff"), 7).is_none());
    }

    #[test]
    fn test_large_history_uses_dense_index() {
        let ids: Vec<String> = (0..6000u32).map(|i| format!("{:04x}{:036x}", i, i)).collect();
        let mut text = String::new();
        for pair in ids.windows(2).rev() {
            text.push_str(&format!("{} {}\n", pair[1], pair[0]));
        }
        text.push_str(&ids[0]);

        let graph = CommitGraph::build(&text, "").unwrap();
        assert!(matches!(graph.short_index, ShortIndex::Dense(_)));
        assert_eq!(graph.len(), 6000);
        assert_eq!(graph.youngest(), Some(ids[5999].as_str()));

        for id in ids.iter().step_by(97) {
            let short = graph.shortrev(id, 4).unwrap();
            assert_eq!(short, id[..4]);
            assert_eq!(graph.fullrev(&short).map(|r| &**r), Some(id.as_str()));
        }
    }

    #[test]
    fn test_missing_parent_is_inconsistent() {
        let text = rev_list(&[&["2222", "1111"]]);
        let err = CommitGraph::build(&text, "").err().unwrap();
        assert!(matches!(err, AppError::Inconsistent(_)));
    }

    #[test]
    fn test_duplicate_record_is_inconsistent() {
        let text = rev_list(&[&["2222", "1111"], &["1111"], &["2222", "1111"]]);
        let err = CommitGraph::build(&text, "").err().unwrap();
        assert!(matches!(err, AppError::Inconsistent(_)));
    }

    #[test]
    fn test_garbage_line_is_malformed() {
        let err = CommitGraph::build("fatal: bad revision\n", "").err().unwrap();
        assert!(matches!(err, AppError::MalformedOutput(_)));
    }

    #[test]
    fn test_empty_history() {
        let graph = CommitGraph::build("", "").unwrap();
        assert!(graph.is_empty());
        assert!(graph.youngest().is_none());
        assert!(graph.oldest().is_none());
    }

    #[test]
    fn test_tags_are_recorded() {
        let text = rev_list(&[&["2222", "1111"], &["1111"]]);
        let graph = CommitGraph::build(&text, &format!("{}\n{}\n", sha("1111"), sha("7777"))).unwrap();
        assert!(graph.is_tag(&sha("1111")));
        assert!(graph.is_tag(&sha("7777")));
        assert!(!graph.is_tag(&sha("2222")));
        assert_eq!(graph.tag_count(), 2);
    }
}
