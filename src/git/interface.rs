//! git::interface
//!
//! Read-only object graph access implemented with git2.
//!
//! This module is the **single doorway** to the object database. Loose
//! objects, packfiles and their encodings are handled entirely by `git2`;
//! everything above this module works with the plain records defined here
//! ([`CommitRecord`], [`Tree`], [`Change`]) and never sees a `git2` type.
//!
//! # Error Handling
//!
//! Git errors are normalized into typed variants:
//! - [`GitError::NotARepo`]: The located store could not be opened
//! - [`GitError::UnbornHead`]: HEAD points at a branch with no commits
//! - [`GitError::ObjectNotFound`]: A commit or tree could not be read
//!
//! # Example
//!
//! ```ignore
//! use provenance::git::{locate, Git, ObjectGraph};
//! use std::path::Path;
//!
//! let location = locate(Path::new("."), true)?.expect("inside a repository");
//! let git = Git::open(&location)?;
//! let head = git.head()?;
//! let commit = git.commit(&head)?;
//! println!("{} {}", head.short(7), commit.summary());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::locate::RepoLocation;
use crate::core::types::{Oid, TypeError};

/// Errors from object graph reads.
///
/// `Clone` so that a failed index build can be recorded on a handle and
/// re-raised to later callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// The metadata store could not be opened as a repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The store that was opened
        path: PathBuf,
    },

    /// HEAD names a branch that has no commits yet.
    #[error("HEAD does not point at a commit (unborn branch)")]
    UnbornHead,

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The object (or ref) that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::UnbornBranch => GitError::UnbornHead,
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: err.message().to_string(),
            },
            git2::ErrorCode::UnbornBranch => GitError::UnbornHead,
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidPath(msg) => GitError::Internal { message: msg },
        }
    }
}

/// Information about an opened repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the metadata store
    pub git_dir: PathBuf,
    /// Path to the shared store (differs from `git_dir` in linked worktrees)
    pub common_dir: PathBuf,
    /// Path to working directory, if git2 knows one
    pub work_dir: Option<PathBuf>,
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HeadInfo {
    /// The commit HEAD resolves to
    pub oid: Oid,
    /// Short branch name, `None` when detached
    pub branch: Option<String>,
}

/// A commit as read from the object database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// The commit OID
    pub oid: Oid,
    /// Parent OIDs in order; empty for root commits
    pub parents: Vec<Oid>,
    /// Root tree of the snapshot
    pub tree: Oid,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Authorship timestamp
    pub author_time: DateTime<Utc>,
    /// Committer timestamp, used for walk ordering
    pub commit_time: DateTime<Utc>,
    /// Full commit message
    pub message: String,
}

impl CommitRecord {
    /// A commit with two or more parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }

    /// A commit with no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A directory snapshot: every blob path (recursive, `/`-separated) to its
/// content id. Submodule entries are included as paths.
pub type Tree = BTreeMap<String, Oid>;

/// Classification of a path between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// One entry of a tree-to-tree diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// The affected path; the removed path for deletions, the new path for renames
    pub path: String,
    /// The previous path of a rename
    pub old_path: Option<String>,
    /// What happened to the path
    pub kind: ChangeKind,
}

impl Change {
    /// A newly added path.
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            kind: ChangeKind::Added,
        }
    }

    /// Every path the change touches: the new path, plus the old path of a rename.
    pub fn touched_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.path.as_str()).chain(self.old_path.as_deref())
    }
}

/// Read access to a commit graph.
///
/// [`Git`] is the production implementation. The history walker and the
/// attribution index are written against this trait only.
pub trait ObjectGraph {
    /// Resolve HEAD to a commit.
    fn head(&self) -> Result<Oid, GitError>;

    /// Read a commit.
    fn commit(&self, oid: &Oid) -> Result<CommitRecord, GitError>;

    /// Read a tree recursively.
    fn tree(&self, oid: &Oid) -> Result<Tree, GitError>;

    /// Paths that differ between two trees.
    fn diff_trees(&self, from: &Oid, to: &Oid) -> Result<Vec<Change>, GitError>;
}

/// The git2-backed object graph reader.
///
/// Not `Sync`; open one per thread (or per index build).
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening and Info
    // =========================================================================

    /// Open the metadata store named by a located repository.
    ///
    /// No discovery is performed here; the location is trusted as-is.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if the store cannot be opened
    pub fn open(location: &RepoLocation) -> Result<Self, GitError> {
        Self::open_git_dir(&location.git_dir)
    }

    /// Open a metadata store by path.
    pub fn open_git_dir(git_dir: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open_ext(
            git_dir,
            git2::RepositoryOpenFlags::NO_SEARCH,
            std::iter::empty::<&std::ffi::OsStr>(),
        )
        .map_err(|e| {
            tracing::debug!(git_dir = %git_dir.display(), error = %e.message(), "open failed");
            GitError::NotARepo {
                path: git_dir.to_path_buf(),
            }
        })?;

        Ok(Self { repo })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
        }
    }

    /// Describe where HEAD points.
    ///
    /// # Errors
    ///
    /// - [`GitError::UnbornHead`] in a repository without commits
    pub fn head_info(&self) -> Result<HeadInfo, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        let branch = if head.is_branch() {
            head.shorthand().map(String::from)
        } else {
            None
        };

        Ok(HeadInfo {
            oid: to_oid(oid)?,
            branch,
        })
    }

    // =========================================================================
    // Remote Information
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }

    /// Get the default remote name.
    ///
    /// Prefers "origin"; otherwise the first remote, or `None` if there are none.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok(Some("origin".to_string()));
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    fn find_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

impl ObjectGraph for Git {
    fn head(&self) -> Result<Oid, GitError> {
        self.head_info().map(|info| info.oid)
    }

    fn commit(&self, oid: &Oid) -> Result<CommitRecord, GitError> {
        let commit = self
            .repo
            .find_commit(Self::find_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let parents = commit
            .parent_ids()
            .map(to_oid)
            .collect::<Result<Vec<_>, _>>()?;

        let author = commit.author();
        let committer = commit.committer();

        Ok(CommitRecord {
            oid: oid.clone(),
            parents,
            tree: to_oid(commit.tree_id())?,
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            author_time: to_utc(author.when(), oid)?,
            commit_time: to_utc(committer.when(), oid)?,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        })
    }

    fn tree(&self, oid: &Oid) -> Result<Tree, GitError> {
        let tree = self
            .repo
            .find_tree(Self::find_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut raw = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            // Blobs and gitlinks are paths; subtrees are recursed into.
            if matches!(
                entry.kind(),
                Some(git2::ObjectType::Blob) | Some(git2::ObjectType::Commit)
            ) {
                let name = String::from_utf8_lossy(entry.name_bytes());
                raw.push((format!("{root}{name}"), entry.id()));
            }
            git2::TreeWalkResult::Ok
        })
        .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        raw.into_iter()
            .map(|(path, id)| Ok((path, to_oid(id)?)))
            .collect()
    }

    fn diff_trees(&self, from: &Oid, to: &Oid) -> Result<Vec<Change>, GitError> {
        let old_tree = self
            .repo
            .find_tree(Self::find_git2_oid(from)?)
            .map_err(|e| GitError::from_git2(e, from.as_str()))?;
        let new_tree = self
            .repo
            .find_tree(Self::find_git2_oid(to)?)
            .map_err(|e| GitError::from_git2(e, to.as_str()))?;

        let mut opts = git2::DiffOptions::new();
        opts.ignore_filemode(true);

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, to.as_str()))?;

        let mut find_opts = git2::DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta.old_file().path().map(path_to_string);
            let new_path = delta.new_file().path().map(path_to_string);

            let change = match delta.status() {
                git2::Delta::Added | git2::Delta::Copied => new_path.map(Change::added),
                git2::Delta::Modified | git2::Delta::Typechange => {
                    new_path.map(|path| Change {
                        path,
                        old_path: None,
                        kind: ChangeKind::Modified,
                    })
                }
                git2::Delta::Deleted => old_path.map(|path| Change {
                    path,
                    old_path: None,
                    kind: ChangeKind::Deleted,
                }),
                git2::Delta::Renamed => new_path.map(|path| Change {
                    path,
                    old_path,
                    kind: ChangeKind::Renamed,
                }),
                _ => None,
            };

            changes.extend(change);
        }

        Ok(changes)
    }
}

fn to_oid(id: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(id.to_string()).map_err(GitError::from)
}

fn to_utc(time: git2::Time, oid: &Oid) -> Result<DateTime<Utc>, GitError> {
    DateTime::from_timestamp(time.seconds(), 0).ok_or_else(|| GitError::Internal {
        message: format!("{oid}: timestamp {} out of range", time.seconds()),
    })
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
