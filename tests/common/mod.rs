//! Fixture repositories built with git2, queried through the real `git` binary.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

pub struct Fixture {
    pub dir: TempDir,
    pub repo: Repository,
    clock: i64,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self {
            dir,
            repo,
            clock: 1_700_000_000,
        }
    }

    pub fn git_dir(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }

    /// Write `content` to `path`, stage it and commit on HEAD.
    pub fn commit_file(&mut self, path: &str, content: &str, message: &str) -> String {
        let workdir = self.repo.workdir().unwrap().to_path_buf();
        let file = workdir.join(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(std::path::Path::new(path)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();

        self.commit_tree(tree_id, message)
    }

    fn commit_tree(&mut self, tree_id: Oid, message: &str) -> String {
        // Distinct timestamps keep `rev-list` order deterministic
        self.clock += 60;
        let sig = Signature::new("Test Author", "test@example.com", &Time::new(self.clock, 0)).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .map(|oid| self.repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    pub fn annotated_tag(&self, name: &str, target: &str) -> String {
        let sig = Signature::new("Test Author", "test@example.com", &Time::new(self.clock, 0)).unwrap();
        let object = self.repo.revparse_single(target).unwrap();
        self.repo
            .tag(name, &object, &sig, "release", false)
            .unwrap()
            .to_string()
    }
}
