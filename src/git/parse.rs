//! Parsers for git plumbing output.
//!
//! The two stateful ones are `parse_diff_tree` (NUL-delimited `diff-tree -z`
//! records) and `parse_blame` (`blame -p` porcelain). The rest split simple
//! line formats: `ls-tree -z`, raw commit objects, annotated tags,
//! `branch -v` and `git version`.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{
    AuthorInfo, BlameLine, BranchInfo, Change, ChangeAction, CommitMessage, EntryType, GitVersion,
    TreeEntry,
};

/// Oldest git whose plumbing output these parsers were written against
pub const GIT_VERSION_MIN_REQUIRED: [u32; 3] = [1, 5, 2];

/// Non-empty, trimmed lines of a command's output.
pub fn parse_rev_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First non-empty line, if any.
pub fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

struct ChangeHeader {
    old_mode: String,
    new_mode: String,
    old_sha: String,
    new_sha: String,
    action: ChangeAction,
    score: Option<u8>,
}

impl ChangeHeader {
    fn parse(token: &str) -> Result<Self> {
        let fields: Vec<&str> = token.trim_start_matches(':').split_whitespace().collect();
        let [old_mode, new_mode, old_sha, new_sha, status] = fields[..] else {
            return Err(AppError::MalformedOutput(format!(
                "diff-tree header with {} fields: {}",
                fields.len(),
                token
            )));
        };

        let mut chars = status.chars();
        let action = chars
            .next()
            .and_then(ChangeAction::from_code)
            .ok_or_else(|| AppError::MalformedOutput(format!("unknown change code: {}", status)))?;
        let score = chars.as_str().parse::<u8>().ok();

        Ok(Self {
            old_mode: old_mode.to_string(),
            new_mode: new_mode.to_string(),
            old_sha: old_sha.to_string(),
            new_sha: new_sha.to_string(),
            action,
            score,
        })
    }

    /// Paths that follow this header in the stream
    fn path_count(&self) -> usize {
        if self.action.has_two_paths() { 2 } else { 1 }
    }

    fn finish(self, mut paths: Vec<String>) -> Result<Change> {
        if paths.len() != self.path_count() {
            return Err(AppError::MalformedOutput(format!(
                "diff-tree record for {} has {} paths, expected {}",
                self.new_sha,
                paths.len(),
                self.path_count()
            )));
        }
        let new_path = if paths.len() == 2 { paths.pop() } else { None };
        let old_path = paths.pop().unwrap_or_default();

        Ok(Change {
            old_mode: self.old_mode,
            new_mode: self.new_mode,
            old_sha: self.old_sha,
            new_sha: self.new_sha,
            action: self.action,
            score: self.score,
            old_path,
            new_path,
        })
    }
}

enum DiffState {
    AwaitingHeader,
    Collecting(ChangeHeader, Vec<String>),
}

/// Parse `diff-tree -z -r` output into change records.
///
/// With `against_root` (a single tree-ish compared to the empty tree) git
/// prints the commit id as the first token; it is dropped.
pub fn parse_diff_tree(raw: &[u8], against_root: bool) -> Result<Vec<Change>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.last() != Some(&0) {
        return Err(AppError::MalformedOutput(
            "diff-tree output not NUL-terminated".to_string(),
        ));
    }

    let mut tokens = raw[..raw.len() - 1]
        .split(|&b| b == 0)
        .map(|token| String::from_utf8_lossy(token).into_owned())
        .peekable();

    if against_root && tokens.peek().is_some_and(|t| !t.starts_with(':')) {
        tokens.next();
    }

    let mut changes = Vec::new();
    let mut state = DiffState::AwaitingHeader;

    // Paths may start with ':' too, so the header decides how many follow
    for token in tokens {
        state = match state {
            DiffState::AwaitingHeader if token.starts_with(':') => {
                DiffState::Collecting(ChangeHeader::parse(&token)?, Vec::new())
            }
            DiffState::AwaitingHeader => {
                return Err(AppError::MalformedOutput(format!(
                    "diff-tree path without a header: {}",
                    token
                )));
            }
            DiffState::Collecting(header, mut paths) => {
                paths.push(token);
                if paths.len() == header.path_count() {
                    changes.push(header.finish(paths)?);
                    DiffState::AwaitingHeader
                } else {
                    DiffState::Collecting(header, paths)
                }
            }
        };
    }

    if let DiffState::Collecting(header, paths) = state {
        return Err(AppError::MalformedOutput(format!(
            "diff-tree output ended inside the record for {} after {} of {} paths",
            header.new_sha,
            paths.len(),
            header.path_count()
        )));
    }

    Ok(changes)
}

/// Parse `blame -p` output into `(sha, final line number)` pairs.
///
/// Each group starts with `<sha> <orig-line> <final-line> [<count>]`,
/// followed by optional metadata lines and exactly one content line that
/// begins with a tab.
pub fn parse_blame(output: &str) -> Result<Vec<BlameLine>> {
    let mut lines = Vec::new();
    let mut in_metadata = false;

    for line in output.lines() {
        if in_metadata {
            in_metadata = !line.starts_with('\t');
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (sha, final_line) = match fields[..] {
            [sha, _orig, final_line] | [sha, _orig, final_line, _] => (sha, final_line),
            _ => {
                return Err(AppError::MalformedOutput(format!(
                    "unexpected blame header: {}",
                    line
                )));
            }
        };

        if sha.len() != 40 || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::MalformedOutput(format!("bad blame sha: {}", sha)));
        }
        let line_number = final_line
            .parse::<u32>()
            .map_err(|_| AppError::MalformedOutput(format!("bad blame line number: {}", line)))?;

        lines.push(BlameLine {
            sha: sha.to_string(),
            line_number,
        });
        in_metadata = true;
    }

    if in_metadata {
        return Err(AppError::MalformedOutput(
            "blame output ended inside a metadata block".to_string(),
        ));
    }

    Ok(lines)
}

/// Parse `ls-tree -z` records of the form `<mode> <type> <sha>\t<name>`.
pub fn parse_ls_tree(raw: &[u8]) -> Result<Vec<TreeEntry>> {
    raw.split(|&b| b == 0)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let record = String::from_utf8_lossy(record);
            let malformed = || AppError::MalformedOutput(format!("bad ls-tree record: {}", record));

            let (meta, name) = record.split_once('\t').ok_or_else(malformed)?;
            let fields: Vec<&str> = meta.split(' ').collect();
            let [mode, kind, sha] = fields[..] else {
                return Err(malformed());
            };
            let entry_type = EntryType::from_ls_tree(kind, mode).ok_or_else(malformed)?;

            Ok(TreeEntry {
                mode: mode.to_string(),
                entry_type,
                sha: sha.to_string(),
                name: name.to_string(),
                size: None,
            })
        })
        .collect()
}

/// Split a raw commit object into header fields and message.
///
/// Returns `None` for empty input, which is what `cat-file` prints for an
/// unknown id.
pub fn parse_commit(raw: &str) -> Option<CommitMessage> {
    if raw.is_empty() {
        return None;
    }

    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut last_key: Option<String> = None;
    let mut lines = raw.lines();

    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }

        // Multi-line headers (gpgsig, mergetag) continue with a leading space
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some(value) = last_key
                .as_ref()
                .and_then(|key| fields.get_mut(key))
                .and_then(|values| values.last_mut())
            {
                value.push('\n');
                value.push_str(continuation);
            }
            continue;
        }

        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        fields
            .entry(key.to_string())
            .or_default()
            .push(value.trim().to_string());
        last_key = Some(key.to_string());
    }

    Some(CommitMessage {
        message: lines.collect::<Vec<_>>().join("\n"),
        fields,
    })
}

/// Split an `author`/`committer` value: `Name <email> <epoch> <tz>`.
pub fn parse_signature(value: &str) -> Option<(AuthorInfo, i64)> {
    let (name, rest) = value.split_once('<')?;
    let (email, rest) = rest.split_once('>')?;
    let timestamp = rest.split_whitespace().next()?.parse::<i64>().ok()?;

    Some((
        AuthorInfo {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        },
        timestamp,
    ))
}

/// Target of an annotated tag object (`object <sha>` on its first line).
pub fn parse_tag_object(raw: &str) -> Option<String> {
    let mut first = raw.lines().next()?.split_whitespace();
    match (first.next(), first.next()) {
        (Some("object"), Some(sha)) => Some(sha.to_string()),
        _ => None,
    }
}

/// Parse `branch -v --no-abbrev`; the checked-out branch comes first.
pub fn parse_branches(output: &str) -> Vec<BranchInfo> {
    let mut branches = Vec::new();

    for line in output.lines() {
        let is_current = line.starts_with('*');
        let rest = line.get(1..).unwrap_or("").trim_start();

        // "(HEAD detached at ...)" and similar are not branches
        if rest.is_empty() || rest.starts_with('(') {
            continue;
        }

        let mut fields = rest.split_whitespace();
        let (Some(name), Some(sha)) = (fields.next(), fields.next()) else {
            continue;
        };

        let branch = BranchInfo {
            name: name.to_string(),
            sha: sha.to_string(),
            is_current,
        };
        if is_current {
            branches.insert(0, branch);
        } else {
            branches.push(branch);
        }
    }

    branches
}

/// Parse `git version` output, e.g. `git version 2.43.0` or
/// `git version 1.5.4.GIT`.
pub fn parse_version(output: &str) -> Result<GitVersion> {
    let line = first_line(output)
        .ok_or_else(|| AppError::MalformedOutput("empty git version output".to_string()))?;

    let version = match line.split_whitespace().collect::<Vec<_>>()[..] {
        ["git", "version", version, ..] => version.to_string(),
        _ => {
            return Err(AppError::MalformedOutput(format!(
                "could not retrieve git version from {:?}",
                line
            )));
        }
    };

    let components: Vec<u32> = version
        .split('.')
        .map_while(|part| part.parse::<u32>().ok())
        .collect();
    if components.is_empty() {
        return Err(AppError::MalformedOutput(format!(
            "git version {:?} has no numeric components",
            version
        )));
    }

    let minimum = GIT_VERSION_MIN_REQUIRED
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".");

    Ok(GitVersion {
        compatible: components.as_slice() >= GIT_VERSION_MIN_REQUIRED.as_slice(),
        version,
        components,
        minimum,
    })
}
