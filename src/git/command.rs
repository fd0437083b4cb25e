//! Read-only command surface of a git repository.
//!
//! `Gateway` enumerates every query the cache issues against a repository.
//! Implementations return the raw text or bytes git prints; parsing happens
//! in `parse.rs` and interpretation in `cache.rs`. `GitCli` runs the `git`
//! binary against a fixed `--git-dir`.
//!
//! A query git refuses (non-zero exit) is an `UnknownRevision` error. Only
//! `rev_parse_verify` and `config_get` report a miss as empty output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::{AppError, Result};

/// Object kinds accepted by `git cat-file <kind> <sha>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Blob,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }
}

pub trait Gateway: Send + Sync {
    /// `rev-list --parents --all`: `sha parent...` per line, newest first.
    fn rev_list_all(&self) -> Result<String>;

    /// `rev-list --max-count=1 --all`: the current youngest commit.
    fn youngest(&self) -> Result<String>;

    /// `rev-parse --tags`: one tag target per line.
    fn tag_targets(&self) -> Result<String>;

    /// `rev-parse --verify <rev>`; empty output when the lookup fails.
    fn rev_parse_verify(&self, rev: &str) -> Result<String>;

    /// Fails with `UnknownRevision` when no object of `kind` has this id.
    fn cat_file(&self, kind: ObjectKind, sha: &str) -> Result<Vec<u8>>;

    /// `cat-file -s <sha>`
    fn object_size(&self, sha: &str) -> Result<String>;

    /// `ls-tree -z <rev> [-- <path>]`
    fn ls_tree(&self, rev: &str, path: &str) -> Result<Vec<u8>>;

    /// `diff-tree -z -r [-M] <tree1|--root> <tree2> [-- <path>]`
    fn diff_tree(
        &self,
        tree1: Option<&str>,
        tree2: &str,
        path: &str,
        find_renames: bool,
    ) -> Result<Vec<u8>>;

    /// `blame -p -- <path> <sha>`
    fn blame(&self, sha: &str, path: &str) -> Result<String>;

    /// `rev-list [--max-count=<n>] <sha> [-- <path>]`
    fn rev_list_path(&self, sha: &str, path: &str, max_count: Option<usize>) -> Result<String>;

    /// `rev-list --reverse --max-age=<start> --min-age=<stop> --all`
    fn rev_list_timerange(&self, start: i64, stop: i64) -> Result<String>;

    /// `branch -v --no-abbrev`
    fn branches(&self) -> Result<String>;

    /// `tag -l`
    fn tags(&self) -> Result<String>;

    /// `config --get <key>`; empty output when unset.
    fn config_get(&self, key: &str) -> Result<String>;

    /// `git version`
    fn version(&self) -> Result<String>;
}

/// Gateway backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_bin: String,
    git_dir: Option<PathBuf>,
}

impl GitCli {
    pub fn new(git_bin: impl Into<String>, git_dir: Option<&Path>) -> Self {
        Self {
            git_bin: git_bin.into(),
            git_dir: git_dir.map(Path::to_path_buf),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.git_bin);
        if let Some(dir) = &self.git_dir {
            cmd.arg(format!("--git-dir={}", dir.display()));
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::trace!("running {} {:?}", self.git_bin, args);
        let output = cmd.output()?;

        if !output.status.success() {
            tracing::debug!(
                "git {:?} exited with {}: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output)
    }

    /// Stdout of a query that must succeed. Every query here is read-only,
    /// so a non-zero exit means git rejected a revision, object or path.
    fn execute(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(AppError::UnknownRevision(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }

    fn execute_text(&self, args: &[&str]) -> Result<String> {
        let stdout = self.execute(args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Stdout of a lookup whose miss is a non-zero exit; a miss is empty.
    fn execute_lookup(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Gateway for GitCli {
    fn rev_list_all(&self) -> Result<String> {
        self.execute_text(&["rev-list", "--parents", "--all"])
    }

    fn youngest(&self) -> Result<String> {
        self.execute_text(&["rev-list", "--max-count=1", "--all"])
    }

    fn tag_targets(&self) -> Result<String> {
        self.execute_text(&["rev-parse", "--tags"])
    }

    fn rev_parse_verify(&self, rev: &str) -> Result<String> {
        self.execute_lookup(&["rev-parse", "--verify", "--quiet", rev])
    }

    fn cat_file(&self, kind: ObjectKind, sha: &str) -> Result<Vec<u8>> {
        self.execute(&["cat-file", kind.as_str(), sha])
    }

    fn object_size(&self, sha: &str) -> Result<String> {
        self.execute_text(&["cat-file", "-s", sha])
    }

    fn ls_tree(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        if path.is_empty() {
            self.execute(&["ls-tree", "-z", rev])
        } else {
            self.execute(&["ls-tree", "-z", rev, "--", path])
        }
    }

    fn diff_tree(
        &self,
        tree1: Option<&str>,
        tree2: &str,
        path: &str,
        find_renames: bool,
    ) -> Result<Vec<u8>> {
        let mut args = vec!["diff-tree", "-z", "-r"];
        if find_renames {
            args.push("-M");
        }
        args.push(tree1.unwrap_or("--root"));
        args.push(tree2);
        if !path.is_empty() {
            args.extend(["--", path]);
        }
        self.execute(&args)
    }

    fn blame(&self, sha: &str, path: &str) -> Result<String> {
        self.execute_text(&["blame", "-p", sha, "--", path])
    }

    fn rev_list_path(&self, sha: &str, path: &str, max_count: Option<usize>) -> Result<String> {
        let max_count = max_count.map(|n| format!("--max-count={}", n));
        let mut args = vec!["rev-list"];
        if let Some(arg) = &max_count {
            args.push(arg);
        }
        args.push(sha);
        if !path.is_empty() {
            args.extend(["--", path]);
        }
        self.execute_text(&args)
    }

    fn rev_list_timerange(&self, start: i64, stop: i64) -> Result<String> {
        let max_age = format!("--max-age={}", start);
        let min_age = format!("--min-age={}", stop);
        self.execute_text(&["rev-list", "--reverse", &max_age, &min_age, "--all"])
    }

    fn branches(&self) -> Result<String> {
        self.execute_text(&["branch", "-v", "--no-abbrev"])
    }

    fn tags(&self) -> Result<String> {
        self.execute_text(&["tag", "-l"])
    }

    fn config_get(&self, key: &str) -> Result<String> {
        self.execute_lookup(&["config", "--get", key])
    }

    fn version(&self) -> Result<String> {
        self.execute_text(&["version"])
    }
}
