//! git
//!
//! Single interface for all repository reads.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Metadata store discovery,
//! object reads and history traversal all live here; no other module imports
//! `git2`. Nothing in this module writes to the repository.
//!
//! # Responsibilities
//!
//! - [`locate`]: find the metadata store from any path, following `gitdir:`
//!   indirection used by worktrees and submodules
//! - [`Git`] / [`ObjectGraph`]: resolve HEAD, read commits and trees, diff trees
//! - [`walk`]: lazy, exactly-once ancestry traversal
//! - [`memory::MemoryGraph`]: in-memory graph for deterministic tests
//!
//! # Example
//!
//! ```no_run
//! use provenance::git::{locate, walk, Git, ObjectGraph};
//! use std::path::Path;
//!
//! let location = locate(Path::new("."), true)?.expect("inside a repository");
//! let git = Git::open(&location)?;
//! let head = git.head()?;
//! for commit in walk(&git, &head) {
//!     let commit = commit?;
//!     println!("{} {}", commit.oid.short(7), commit.summary());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod interface;
mod locate;
pub mod memory;
mod walk;

pub use interface::{
    Change, ChangeKind, CommitRecord, Git, GitError, HeadInfo, ObjectGraph, RepoInfo, Tree,
};
pub use locate::{locate, LocateError, LocationKind, RepoLocation, GIT_DIR_NAME};
pub use walk::{walk, HistoryWalk};
