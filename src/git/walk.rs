//! git::walk
//!
//! Ancestry traversal from a head commit.
//!
//! The walk is driven by an explicit priority queue and a visited set rather
//! than recursion through parent links:
//!
//! - Commits are yielded newest-first by committer time (ties broken by the
//!   order in which they were discovered).
//! - Every commit reachable from the head is yielded exactly once, including
//!   commits reached through several children (diamond history).
//! - Commits are read lazily as the iterator advances.
//! - The first read error is yielded and the walk stops; a truncated walk is
//!   never presented as complete history.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::interface::{CommitRecord, GitError, ObjectGraph};
use crate::core::types::Oid;

/// Start a walk over every commit reachable from `head`.
///
/// Calling `walk` again restarts from scratch; walks share no state.
pub fn walk<'g, G: ObjectGraph + ?Sized>(graph: &'g G, head: &Oid) -> HistoryWalk<'g, G> {
    let mut walk = HistoryWalk {
        graph,
        queue: BinaryHeap::new(),
        seen: HashSet::new(),
        pending: None,
        sequence: 0,
        done: false,
    };
    walk.pending = Some(head.clone());
    walk.seen.insert(head.clone());
    walk
}

/// Lazy iterator over commit history. See [`walk`].
pub struct HistoryWalk<'g, G: ObjectGraph + ?Sized> {
    graph: &'g G,
    queue: BinaryHeap<Queued>,
    seen: HashSet<Oid>,
    /// The head, read on the first call to `next`.
    pending: Option<Oid>,
    sequence: u64,
    done: bool,
}

struct Queued {
    commit: CommitRecord,
    sequence: u64,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Newest commit time first; earlier discovery first on ties.
        self.commit
            .commit_time
            .cmp(&other.commit.commit_time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Queued {}

impl<G: ObjectGraph + ?Sized> HistoryWalk<'_, G> {
    fn enqueue(&mut self, oid: &Oid) -> Result<(), GitError> {
        let commit = self.graph.commit(oid)?;
        self.sequence += 1;
        self.queue.push(Queued {
            commit,
            sequence: self.sequence,
        });
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<CommitRecord>, GitError> {
        if let Some(head) = self.pending.take() {
            self.enqueue(&head)?;
        }

        let Some(Queued { commit, .. }) = self.queue.pop() else {
            return Ok(None);
        };

        for parent in &commit.parents {
            if self.seen.insert(parent.clone()) {
                self.enqueue(parent)?;
            }
        }

        tracing::trace!(commit = %commit.oid.short(7), parents = commit.parents.len(), "visited");
        Ok(Some(commit))
    }
}

impl<G: ObjectGraph + ?Sized> Iterator for HistoryWalk<'_, G> {
    type Item = Result<CommitRecord, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(commit)) => Some(Ok(commit)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<G: ObjectGraph + ?Sized> std::iter::FusedIterator for HistoryWalk<'_, G> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryGraph;

    #[test]
    fn linear_history_newest_first() {
        let mut graph = MemoryGraph::new();
        let a = graph.commit_at(&[], 100, &[("a", "1")]);
        let b = graph.commit_at(&[&a], 200, &[("a", "1"), ("b", "1")]);
        let c = graph.commit_at(&[&b], 300, &[("a", "2"), ("b", "1")]);

        let order: Vec<_> = walk(&graph, &c).map(|r| r.unwrap().oid).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn diamond_visits_each_commit_once() {
        let mut graph = MemoryGraph::new();
        let root = graph.commit_at(&[], 100, &[("a", "1")]);
        let left = graph.commit_at(&[&root], 200, &[("a", "2")]);
        let right = graph.commit_at(&[&root], 300, &[("a", "3")]);
        let merge = graph.commit_at(&[&left, &right], 400, &[("a", "4")]);

        let order: Vec<_> = walk(&graph, &merge).map(|r| r.unwrap().oid).collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order, vec![merge, right, left, root.clone()]);
        assert_eq!(order.iter().filter(|o| **o == root).count(), 1);
    }

    #[test]
    fn walk_is_restartable() {
        let mut graph = MemoryGraph::new();
        let a = graph.commit_at(&[], 100, &[("a", "1")]);
        let b = graph.commit_at(&[&a], 200, &[("a", "2")]);

        let first: Vec<_> = walk(&graph, &b).map(|r| r.unwrap().oid).collect();
        let second: Vec<_> = walk(&graph, &b).map(|r| r.unwrap().oid).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn read_failure_stops_the_walk() {
        let mut graph = MemoryGraph::new();
        let a = graph.commit_at(&[], 100, &[("a", "1")]);
        let b = graph.commit_at(&[&a], 200, &[("a", "2")]);
        graph.break_commit(&a);

        let results: Vec<_> = walk(&graph, &b).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(GitError::ObjectNotFound { .. })));
    }

    #[test]
    fn unreadable_head_is_an_error() {
        let mut graph = MemoryGraph::new();
        let a = graph.commit_at(&[], 100, &[("a", "1")]);
        graph.break_commit(&a);

        let mut iter = walk(&graph, &a);
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }
}
