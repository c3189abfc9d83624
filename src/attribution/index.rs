//! attribution::index
//!
//! The path → last-modifying-commit index.
//!
//! # Algorithm
//!
//! 1. Walk every commit reachable from HEAD.
//! 2. Skip merge commits entirely. Paths changed only by a merge receive no
//!    attribution from it.
//! 3. Diff each remaining commit against its parent. A root commit adds
//!    every path in its tree.
//! 4. Each changed path (both sides of a rename) is a candidate for that
//!    commit. A candidate replaces the recorded commit only when its author
//!    time is strictly later.
//!
//! # Ties
//!
//! On equal author times the first candidate seen is kept. The walk visits
//! commits newest-first by committer time, so the winner of a tie is the
//! commit with the later committer time, falling back to walk order. The
//! result is deterministic for a given repository.
//!
//! # Invariants
//!
//! - The index is built in full or not at all; a read error aborts the build
//! - Merge commits never appear as an attribution

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use super::CommitView;
use crate::core::types::{Oid, RepoPath};
use crate::git::{walk, CommitRecord, GitError, ObjectGraph};

/// Complete attribution for every path touched by a non-merge commit.
#[derive(Debug, Clone)]
pub struct AttributionIndex {
    entries: HashMap<String, Arc<CommitView>>,
    head: Oid,
    commits_scanned: usize,
    merges_skipped: usize,
}

impl AttributionIndex {
    /// Build the index from the full history of `graph`'s HEAD.
    ///
    /// # Errors
    ///
    /// Any failure to resolve HEAD or to read a commit or tree aborts the
    /// build. No partial index is returned.
    pub fn build<G: ObjectGraph + ?Sized>(graph: &G) -> Result<Self, GitError> {
        let head = graph.head()?;
        let mut entries = HashMap::new();
        let mut commits_scanned = 0;
        let mut merges_skipped = 0;

        for commit in walk(graph, &head) {
            let commit = commit?;
            commits_scanned += 1;

            if commit.is_merge() {
                merges_skipped += 1;
                tracing::trace!(commit = %commit.oid.short(7), "skipping merge commit");
                continue;
            }

            let paths = changed_paths(graph, &commit)?;
            let view = Arc::new(CommitView::from(&commit));
            for path in paths {
                offer(&mut entries, path, &view);
            }
        }

        tracing::debug!(
            head = %head.short(7),
            paths = entries.len(),
            commits = commits_scanned,
            merges = merges_skipped,
            "attribution index built"
        );

        Ok(Self {
            entries,
            head,
            commits_scanned,
            merges_skipped,
        })
    }

    /// The commit that last modified `path`, if any.
    pub fn get(&self, path: &RepoPath) -> Option<&CommitView> {
        self.entries.get(path.as_str()).map(Arc::as_ref)
    }

    /// All entries, sorted by path.
    pub fn entries(&self) -> Vec<(&str, &CommitView)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(path, view)| (path.as_str(), view.as_ref()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of attributed paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no path has an attribution.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The HEAD commit the index was built from.
    pub fn head(&self) -> &Oid {
        &self.head
    }

    /// Number of commits visited, merges included.
    pub fn commits_scanned(&self) -> usize {
        self.commits_scanned
    }

    /// Number of merge commits excluded from attribution.
    pub fn merges_skipped(&self) -> usize {
        self.merges_skipped
    }
}

/// Paths a non-merge commit changed relative to its parent.
fn changed_paths<G: ObjectGraph + ?Sized>(
    graph: &G,
    commit: &CommitRecord,
) -> Result<Vec<String>, GitError> {
    match commit.parents.first() {
        Some(parent) => {
            let parent = graph.commit(parent)?;
            let changes = graph.diff_trees(&parent.tree, &commit.tree)?;
            Ok(changes
                .iter()
                .flat_map(|change| change.touched_paths())
                .map(String::from)
                .collect())
        }
        None => Ok(graph.tree(&commit.tree)?.into_keys().collect()),
    }
}

/// Record `candidate` for `path` unless the current entry is at least as recent.
fn offer(entries: &mut HashMap<String, Arc<CommitView>>, path: String, candidate: &Arc<CommitView>) {
    match entries.entry(path) {
        Entry::Vacant(slot) => {
            slot.insert(Arc::clone(candidate));
        }
        Entry::Occupied(mut slot) => {
            if candidate.author_date > slot.get().author_date {
                slot.insert(Arc::clone(candidate));
            }
        }
    }
}
