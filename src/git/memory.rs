//! git::memory
//!
//! In-memory object graph for deterministic testing.
//!
//! # Design
//!
//! `MemoryGraph` implements [`ObjectGraph`] over plain maps. Commits are
//! created with explicit timestamps and full file snapshots, and tree diffs
//! are computed by comparing those snapshots, so history shapes that are
//! awkward to produce with a real repository (reversed author times, merges
//! introducing new paths) take a few lines to set up.
//!
//! # Example
//!
//! ```
//! use provenance::git::memory::MemoryGraph;
//! use provenance::git::ObjectGraph;
//!
//! let mut graph = MemoryGraph::new();
//! let root = graph.commit_at(&[], 100, &[("deploy.yaml", "v1")]);
//! let next = graph.commit_at(&[&root], 200, &[("deploy.yaml", "v2")]);
//!
//! assert_eq!(graph.head().unwrap(), next);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::interface::{Change, ChangeKind, CommitRecord, GitError, ObjectGraph, Tree};
use crate::core::types::Oid;

/// In-memory commit graph.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    commits: HashMap<Oid, CommitRecord>,
    trees: HashMap<Oid, Tree>,
    blobs: HashMap<String, Oid>,
    head: Option<Oid>,
    broken: HashSet<Oid>,
    next_id: u64,
}

impl MemoryGraph {
    /// Create an empty graph with an unborn head.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit whose author and committer times are both `seconds`.
    ///
    /// `files` is the full snapshot as `(path, content)` pairs. The new commit
    /// becomes the head.
    pub fn commit_at(&mut self, parents: &[&Oid], seconds: i64, files: &[(&str, &str)]) -> Oid {
        self.commit_with(parents, seconds, seconds, files)
    }

    /// Add a commit with distinct author and committer times.
    pub fn commit_with(
        &mut self,
        parents: &[&Oid],
        author_seconds: i64,
        commit_seconds: i64,
        files: &[(&str, &str)],
    ) -> Oid {
        let tree: Tree = files
            .iter()
            .map(|(path, content)| (path.to_string(), self.blob(content)))
            .collect();
        let tree_oid = self.next_oid();
        self.trees.insert(tree_oid.clone(), tree);

        let oid = self.next_oid();
        let record = CommitRecord {
            oid: oid.clone(),
            parents: parents.iter().map(|p| (*p).clone()).collect(),
            tree: tree_oid,
            author_name: "Test User".to_string(),
            author_email: "test@example.com".to_string(),
            author_time: timestamp(author_seconds),
            commit_time: timestamp(commit_seconds),
            message: format!("commit {}\n", self.next_id),
        };
        self.commits.insert(oid.clone(), record);
        self.head = Some(oid.clone());
        oid
    }

    /// Point the head at an existing commit.
    pub fn set_head(&mut self, oid: &Oid) {
        self.head = Some(oid.clone());
    }

    /// Make reads of this commit fail with [`GitError::ObjectNotFound`].
    pub fn break_commit(&mut self, oid: &Oid) {
        self.broken.insert(oid.clone());
    }

    /// The recorded commit, for assertions.
    pub fn record(&self, oid: &Oid) -> Option<&CommitRecord> {
        self.commits.get(oid)
    }

    fn blob(&mut self, content: &str) -> Oid {
        if let Some(oid) = self.blobs.get(content) {
            return oid.clone();
        }
        let oid = self.next_oid();
        self.blobs.insert(content.to_string(), oid.clone());
        oid
    }

    fn next_oid(&mut self) -> Oid {
        self.next_id += 1;
        Oid::synthetic(self.next_id)
    }

    fn find_tree(&self, oid: &Oid) -> Result<&Tree, GitError> {
        self.trees.get(oid).ok_or_else(|| GitError::ObjectNotFound {
            oid: oid.to_string(),
        })
    }
}

impl ObjectGraph for MemoryGraph {
    fn head(&self) -> Result<Oid, GitError> {
        self.head.clone().ok_or(GitError::UnbornHead)
    }

    fn commit(&self, oid: &Oid) -> Result<CommitRecord, GitError> {
        if self.broken.contains(oid) {
            return Err(GitError::ObjectNotFound {
                oid: oid.to_string(),
            });
        }
        self.commits
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn tree(&self, oid: &Oid) -> Result<Tree, GitError> {
        self.find_tree(oid).cloned()
    }

    fn diff_trees(&self, from: &Oid, to: &Oid) -> Result<Vec<Change>, GitError> {
        let old = self.find_tree(from)?;
        let new = self.find_tree(to)?;

        let mut kinds: BTreeMap<&str, ChangeKind> = BTreeMap::new();
        for (path, blob) in new {
            match old.get(path) {
                None => {
                    kinds.insert(path, ChangeKind::Added);
                }
                Some(previous) if previous != blob => {
                    kinds.insert(path, ChangeKind::Modified);
                }
                Some(_) => {}
            }
        }
        for path in old.keys() {
            if !new.contains_key(path) {
                kinds.insert(path, ChangeKind::Deleted);
            }
        }

        Ok(kinds
            .into_iter()
            .map(|(path, kind)| Change {
                path: path.to_string(),
                old_path: None,
                kind,
            })
            .collect())
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
