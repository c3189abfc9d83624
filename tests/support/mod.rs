//! Shared fixtures for integration tests.
//!
//! Repositories are built through `git2` with explicit signatures so every
//! author and committer timestamp is fixed by the test.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

/// A real repository in a temporary directory, on branch `main`.
pub struct TestRepo {
    repo: Repository,
    root: PathBuf,
    // Dropped last so the repository is closed before its directory goes.
    _temp: Option<TempDir>,
}

impl TestRepo {
    /// Create an empty repository in a fresh temporary directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().to_path_buf();
        let mut repo = Self::init_at(&root);
        repo._temp = Some(temp);
        repo
    }

    /// Create an empty repository at `root`; the caller owns the directory.
    pub fn init_at(root: &Path) -> Self {
        fs::create_dir_all(root).unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(root, &opts).expect("failed to init repo");
        Self {
            repo,
            root: root.to_path_buf(),
            _temp: None,
        }
    }

    /// Work tree root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Metadata store.
    pub fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Write a file in the work tree, creating parent directories.
    pub fn write(&self, path: &str, content: &str) -> &Self {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
        self
    }

    /// Remove a file from the work tree.
    pub fn remove(&self, path: &str) -> &Self {
        fs::remove_file(self.root.join(path)).unwrap();
        self
    }

    /// Commit the whole work tree with author and committer time `seconds`.
    pub fn commit(&self, message: &str, seconds: i64) -> String {
        self.commit_with(message, seconds, seconds)
    }

    /// Commit the whole work tree with distinct author and committer times.
    pub fn commit_with(&self, message: &str, author_secs: i64, commit_secs: i64) -> String {
        self.commit_as("Test User", "test@example.com", message, author_secs, commit_secs, &[])
    }

    /// Commit as a specific author.
    pub fn commit_by(&self, name: &str, email: &str, message: &str, seconds: i64) -> String {
        self.commit_as(name, email, message, seconds, seconds, &[])
    }

    /// Commit the work tree as a merge of HEAD and `other`.
    pub fn merge(&self, message: &str, other: &str, seconds: i64) -> String {
        self.commit_as(
            "Test User",
            "test@example.com",
            message,
            seconds,
            seconds,
            &[other],
        )
    }

    fn commit_as(
        &self,
        name: &str,
        email: &str,
        message: &str,
        author_secs: i64,
        commit_secs: i64,
        extra_parents: &[&str],
    ) -> String {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        let author = Signature::new(name, email, &Time::new(author_secs, 0)).unwrap();
        let committer =
            Signature::new("Test Committer", "committer@example.com", &Time::new(commit_secs, 0))
                .unwrap();

        let mut parents = Vec::new();
        if let Ok(head) = self.repo.head() {
            parents.push(head.peel_to_commit().unwrap());
        }
        for oid in extra_parents {
            parents.push(self.repo.find_commit(git2::Oid::from_str(oid).unwrap()).unwrap());
        }
        let parent_refs: Vec<_> = parents.iter().collect();

        self.repo
            .commit(Some("HEAD"), &author, &committer, message, &tree, &parent_refs)
            .unwrap()
            .to_string()
    }

    /// Create a branch at HEAD.
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }

    /// Switch HEAD and the work tree to `branch`.
    pub fn checkout(&self, branch: &str) {
        self.repo.set_head(&format!("refs/heads/{branch}")).unwrap();
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force().remove_untracked(true)))
            .unwrap();
    }

    /// Path of the loose object file for `oid`.
    pub fn loose_object_path(&self, oid: &str) -> PathBuf {
        self.git_dir().join("objects").join(&oid[..2]).join(&oid[2..])
    }
}
