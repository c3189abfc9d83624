//! attribution
//!
//! Last-commit attribution for repository paths.
//!
//! # Architecture
//!
//! ```text
//! locate -> Git (ObjectGraph) -> walk -> AttributionIndex -> RepositoryHandle
//! ```
//!
//! [`RepositoryHandle`] is the consumer-facing API. It owns a located
//! repository and builds the [`AttributionIndex`] once, on the first lookup.
//! Results are returned as [`CommitView`], which carries no `git2` types.
//!
//! # Expected outcomes vs failures
//!
//! - [`AttributionError::NoAttribution`] is normal: the path was never
//!   touched by a non-merge commit (or does not exist). Report it as unknown.
//! - [`AttributionError::Build`] means history could not be read. It is an
//!   operation failure and should be surfaced.
//!
//! # Staleness
//!
//! The index reflects HEAD at build time. A handle never re-validates it;
//! callers that mutate the repository should open a new handle.
//!
//! # Example
//!
//! ```no_run
//! use provenance::attribution::{HandleOptions, RepositoryHandle};
//!
//! let handle = RepositoryHandle::open(".", HandleOptions::default())?;
//! match handle.last_commit_for("deploy/app.yaml") {
//!     Ok(commit) => println!("{} by {}", commit.sha, commit.author_name),
//!     Err(e) if e.is_not_found() => println!("unknown"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod handle;
mod index;

pub use handle::{HandleOptions, IndexFailurePolicy, IndexState, OpenError, RepositoryHandle};
pub use index::AttributionIndex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::git::{CommitRecord, GitError};

/// Errors from attribution lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributionError {
    /// No non-merge commit ever touched the path.
    #[error("no attribution available for path: {path}")]
    NoAttribution {
        /// The path as requested
        path: String,
    },

    /// The path cannot name a file inside the work tree.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as requested
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// History could not be read while building the index.
    #[error("failed to build history index: {0}")]
    Build(#[from] GitError),

    /// A thread panicked while holding the build guard.
    #[error("history index build was interrupted by a panic")]
    Poisoned,
}

impl AttributionError {
    /// True for the expected, non-fatal "no attribution" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AttributionError::NoAttribution { .. })
    }
}

/// A commit as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitView {
    /// Full commit hash
    pub sha: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Authorship timestamp
    pub author_date: DateTime<Utc>,
    /// Full commit message
    pub message: String,
}

impl CommitView {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Abbreviated hash.
    pub fn short_sha(&self) -> &str {
        let end = 7.min(self.sha.len());
        &self.sha[..end]
    }
}

impl From<&CommitRecord> for CommitView {
    fn from(commit: &CommitRecord) -> Self {
        Self {
            sha: commit.oid.to_string(),
            author_name: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            author_date: commit.author_time,
            message: commit.message.clone(),
        }
    }
}
