//! attribution::handle
//!
//! Repository handle with a lazily built, cached attribution index.
//!
//! # State Machine
//!
//! ```text
//! Unindexed --first lookup--> Indexing --ok--> Indexed (terminal)
//!                                      \--err--> Failed
//! ```
//!
//! - The build runs under a mutex, so concurrent first lookups trigger
//!   exactly one full history pass. Late arrivals re-check the published
//!   index after acquiring the guard.
//! - A finished index is published through a `OnceLock`; later lookups
//!   read it without locking.
//! - On failure, [`IndexFailurePolicy`] decides what the next lookup does.
//!   `Sticky` (the default) re-raises the recorded error without walking
//!   history again. `Retry` starts a fresh build, but only for lookups that
//!   arrive after the failed build finished; callers already waiting on it
//!   receive its error.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, TryLockError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::index::AttributionIndex;
use super::{AttributionError, CommitView};
use crate::core::types::RepoPath;
use crate::git::{locate, Git, GitError, LocateError, RepoLocation};

/// Errors from opening a handle.
#[derive(Debug, Error)]
pub enum OpenError {
    /// No metadata store was found for the path.
    #[error("not a git repository (or any parent): {path}")]
    NotARepo {
        /// The path the search started from
        path: PathBuf,
    },

    /// Discovery failed.
    #[error(transparent)]
    Locate(#[from] LocateError),
}

/// What a handle does after its index build failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFailurePolicy {
    /// Remember the error and return it on every later lookup.
    #[default]
    Sticky,
    /// Forget the error; the next lookup builds again.
    Retry,
}

/// Options for opening a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOptions {
    /// Search parent directories for the metadata store.
    pub detect_parents: bool,
    /// Behavior after a failed index build.
    pub failure_policy: IndexFailurePolicy,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            detect_parents: true,
            failure_policy: IndexFailurePolicy::Sticky,
        }
    }
}

/// Observable index state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No build has completed.
    Unindexed,
    /// A build is running on another thread.
    Indexing,
    /// The index is available.
    Indexed,
    /// The last build failed and the failure is being kept.
    Failed,
}

/// A located repository plus its attribution cache.
///
/// `Send + Sync`: share it behind an `Arc` to serve lookups from several
/// threads. The repository itself is opened only for the duration of the
/// index build.
#[derive(Debug)]
pub struct RepositoryHandle {
    location: RepoLocation,
    options: HandleOptions,
    index: OnceLock<Arc<AttributionIndex>>,
    /// Guards the build; holds the error of the last failed build.
    failure: Mutex<Option<GitError>>,
    builds: AtomicUsize,
    /// Builds that have run to completion. Only written under `failure`.
    finished: AtomicUsize,
}

impl RepositoryHandle {
    /// Locate the repository containing `start` and create a handle for it.
    ///
    /// # Errors
    ///
    /// - [`OpenError::NotARepo`] if no metadata store is found
    /// - [`OpenError::Locate`] if discovery fails
    pub fn open(start: impl AsRef<Path>, options: HandleOptions) -> Result<Self, OpenError> {
        let start = start.as_ref();
        let location = locate(start, options.detect_parents)?.ok_or_else(|| OpenError::NotARepo {
            path: start.to_path_buf(),
        })?;
        Ok(Self::from_location(location, options))
    }

    /// Create a handle for an already located repository.
    pub fn from_location(location: RepoLocation, options: HandleOptions) -> Self {
        Self {
            location,
            options,
            index: OnceLock::new(),
            failure: Mutex::new(None),
            builds: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// The located repository.
    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    /// Work tree root.
    pub fn work_dir(&self) -> &Path {
        &self.location.work_dir
    }

    /// Metadata store.
    pub fn git_dir(&self) -> &Path {
        &self.location.git_dir
    }

    /// Options the handle was created with.
    pub fn options(&self) -> HandleOptions {
        self.options
    }

    /// Number of full history passes started on this handle.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Current index state.
    pub fn state(&self) -> IndexState {
        if self.index.get().is_some() {
            return IndexState::Indexed;
        }
        let sticky = self.options.failure_policy == IndexFailurePolicy::Sticky;
        match self.failure.try_lock() {
            Ok(failure) if sticky && failure.is_some() => IndexState::Failed,
            Ok(_) => IndexState::Unindexed,
            Err(TryLockError::WouldBlock) => IndexState::Indexing,
            Err(TryLockError::Poisoned(_)) => IndexState::Failed,
        }
    }

    /// The commit that most recently modified `path`.
    ///
    /// `path` is relative to the work tree root, or absolute inside it.
    /// Builds the index on first use.
    ///
    /// # Errors
    ///
    /// - [`AttributionError::NoAttribution`] if no non-merge commit touched the path
    /// - [`AttributionError::InvalidPath`] if the path is outside the work tree
    /// - [`AttributionError::Build`] if history could not be read
    pub fn last_commit_for(&self, path: &str) -> Result<CommitView, AttributionError> {
        let key = self.repo_path(path)?;
        let index = self.index()?;
        index
            .get(&key)
            .cloned()
            .ok_or_else(|| AttributionError::NoAttribution {
                path: path.to_string(),
            })
    }

    /// The complete index, building it if needed.
    pub fn index(&self) -> Result<Arc<AttributionIndex>, AttributionError> {
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        let seen = self.finished.load(Ordering::SeqCst);
        let mut failure = self.failure.lock().map_err(|_| AttributionError::Poisoned)?;

        // Another caller may have finished while we waited.
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        // A build that completed while we waited failed; share its result.
        let waited_on_build = self.finished.load(Ordering::SeqCst) != seen;
        let sticky = self.options.failure_policy == IndexFailurePolicy::Sticky;
        if let Some(err) = failure.as_ref().filter(|_| sticky || waited_on_build) {
            tracing::warn!(error = %err, "returning recorded index build failure");
            return Err(AttributionError::Build(err.clone()));
        }

        self.builds.fetch_add(1, Ordering::SeqCst);
        let result = self.build();
        self.finished.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(index) => {
                let index = Arc::new(index);
                // Only the guard holder sets the cell, so this cannot already be set.
                let _ = self.index.set(Arc::clone(&index));
                *failure = None;
                Ok(index)
            }
            Err(err) => {
                *failure = Some(err.clone());
                Err(AttributionError::Build(err))
            }
        }
    }

    fn build(&self) -> Result<AttributionIndex, GitError> {
        let started = Instant::now();
        tracing::debug!(git_dir = %self.location.git_dir.display(), "building attribution index");

        let git = Git::open(&self.location)?;
        let index = AttributionIndex::build(&git)?;

        tracing::debug!(
            paths = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "attribution index ready"
        );
        Ok(index)
    }

    /// Normalize a caller path to an index key.
    fn repo_path(&self, path: &str) -> Result<RepoPath, AttributionError> {
        let invalid = |reason: String| AttributionError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        let candidate = Path::new(path);
        if candidate.is_absolute() {
            let relative = candidate
                .strip_prefix(&self.location.work_dir)
                .map_err(|_| invalid("outside the work tree".to_string()))?;
            return RepoPath::new(relative.to_string_lossy()).map_err(|e| invalid(e.to_string()));
        }

        RepoPath::new(path).map_err(|e| invalid(e.to_string()))
    }
}
