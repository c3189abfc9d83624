//! git::locate
//!
//! Metadata store discovery.
//!
//! Finds the `.git` store for an arbitrary filesystem path without asking
//! `git2` to do it. The store may live outside the work tree: linked
//! worktrees and submodules replace the `.git` directory with a small file
//! of the form `gitdir: <path>`.
//!
//! # Outcomes
//!
//! - `Ok(Some(location))`: a store was found
//! - `Ok(None)`: nothing found; the path is a plain directory
//! - `Err(LocateError::Malformed)`: a `.git` file without the `gitdir:` prefix
//! - `Err(LocateError::Io)`: any filesystem error other than "not found",
//!   which aborts the search immediately
//!
//! # Example
//!
//! ```no_run
//! use provenance::git::locate;
//! use std::path::Path;
//!
//! if let Some(location) = locate(Path::new("deploy/manifests"), true)? {
//!     println!("work tree at {}", location.work_dir.display());
//! }
//! # Ok::<(), provenance::git::LocateError>(())
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Reserved name of the metadata entry inside a work tree.
pub const GIT_DIR_NAME: &str = ".git";

const GITDIR_PREFIX: &str = "gitdir: ";

/// Errors from metadata store discovery.
#[derive(Debug, Error)]
pub enum LocateError {
    /// A `.git` file exists but does not reference a store.
    #[error("malformed metadata reference '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// A filesystem error other than "not found".
    #[error("failed to probe '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The starting path was relative and the process directory is unreadable.
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(io::Error),
}

/// How the metadata store was reached from the work tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// `.git` is the store itself.
    Directory,
    /// `.git` is a `gitdir:` reference (worktree or submodule).
    GitFile,
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationKind::Directory => write!(f, "directory"),
            LocationKind::GitFile => write!(f, "gitdir file"),
        }
    }
}

/// A located repository: metadata store plus the work tree it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLocation {
    /// Absolute path to the metadata store.
    pub git_dir: PathBuf,
    /// Absolute path to the work tree root.
    pub work_dir: PathBuf,
    /// Whether the store was found directly or through a `gitdir:` file.
    pub kind: LocationKind,
}

/// Locate the metadata store for `start`.
///
/// When `detect_parents` is set, parent directories are probed up to the
/// filesystem root, and a `start` that names a regular file is searched
/// from its containing directory.
pub fn locate(start: &Path, detect_parents: bool) -> Result<Option<RepoLocation>, LocateError> {
    let mut candidate = std::path::absolute(start).map_err(LocateError::CurrentDir)?;

    match fs::metadata(&candidate) {
        Ok(meta) if meta.is_file() => {
            if !detect_parents {
                tracing::debug!(path = %candidate.display(), "start path is a file; not a work tree");
                return Ok(None);
            }
            if let Some(parent) = candidate.parent() {
                candidate = parent.to_path_buf();
            }
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(LocateError::Io {
                path: candidate,
                source: e,
            })
        }
    }

    loop {
        let entry = candidate.join(GIT_DIR_NAME);
        tracing::trace!(path = %entry.display(), "probing for metadata store");

        match fs::metadata(&entry) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(git_dir = %entry.display(), "found metadata directory");
                return Ok(Some(RepoLocation {
                    git_dir: entry,
                    work_dir: candidate,
                    kind: LocationKind::Directory,
                }));
            }
            Ok(_) => {
                let git_dir = read_gitdir_file(&entry, &candidate)?;
                tracing::debug!(
                    git_dir = %git_dir.display(),
                    reference = %entry.display(),
                    "followed gitdir reference"
                );
                return Ok(Some(RepoLocation {
                    git_dir,
                    work_dir: candidate,
                    kind: LocationKind::GitFile,
                }));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(LocateError::Io {
                    path: entry,
                    source: e,
                })
            }
        }

        if !detect_parents {
            break;
        }
        match candidate.parent() {
            Some(parent) => candidate = parent.to_path_buf(),
            None => break,
        }
    }

    tracing::debug!(start = %start.display(), "no metadata store found");
    Ok(None)
}

/// Read a `.git` file and resolve the store it points at.
///
/// Only the first line is considered. Relative targets are resolved against
/// the directory holding the `.git` file.
fn read_gitdir_file(entry: &Path, work_dir: &Path) -> Result<PathBuf, LocateError> {
    let contents = fs::read_to_string(entry).map_err(|e| LocateError::Io {
        path: entry.to_path_buf(),
        source: e,
    })?;

    let line = contents.lines().next().unwrap_or("");
    let target = line
        .strip_prefix(GITDIR_PREFIX)
        .ok_or_else(|| LocateError::Malformed {
            path: entry.to_path_buf(),
            reason: format!("missing '{}' prefix", GITDIR_PREFIX.trim_end()),
        })?
        .trim();

    if target.is_empty() {
        return Err(LocateError::Malformed {
            path: entry.to_path_buf(),
            reason: "empty gitdir target".to_string(),
        });
    }

    let target = Path::new(target);
    if target.is_absolute() {
        Ok(normalize_lexically(target))
    } else {
        Ok(normalize_lexically(&work_dir.join(target)))
    }
}

/// Remove `.` and resolve `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn work_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(GIT_DIR_NAME)).unwrap();
        dir
    }

    #[test]
    fn finds_directory_at_root() {
        let dir = work_tree();
        let location = locate(dir.path(), false).unwrap().unwrap();

        assert_eq!(location.work_dir, dir.path());
        assert_eq!(location.git_dir, dir.path().join(".git"));
        assert_eq!(location.kind, LocationKind::Directory);
    }

    #[test]
    fn io_error_aborts_detection() {
        let dir = work_tree();
        fs::write(dir.path().join("file.txt"), "x").unwrap();
        let start = dir.path().join("file.txt/sub");

        // The parent's `.git` must not be reported.
        match locate(&start, true) {
            Err(LocateError::Io { path, source }) => {
                assert_eq!(path, start);
                assert_eq!(source.kind(), io::ErrorKind::NotADirectory);
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn nested_path_found_with_parent_detection() {
        let dir = work_tree();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let location = locate(&nested, true).unwrap().unwrap();
        assert_eq!(location.work_dir, dir.path());
    }

    #[test]
    fn nested_path_not_found_without_parent_detection() {
        let dir = work_tree();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        assert!(locate(&nested, false).unwrap().is_none());
    }

    #[test]
    fn file_start_searches_containing_directory() {
        let dir = work_tree();
        let file = dir.path().join("values.yaml");
        fs::write(&file, "replicas: 1\n").unwrap();

        let location = locate(&file, true).unwrap().unwrap();
        assert_eq!(location.work_dir, dir.path());
        assert!(locate(&file, false).unwrap().is_none());
    }

    #[test]
    fn relative_gitdir_resolves_against_entry_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::create_dir_all(dir.path().join("modules/foo")).unwrap();
        fs::write(sub.join(".git"), "gitdir: ../modules/foo\n").unwrap();

        let location = locate(&sub, false).unwrap().unwrap();
        assert_eq!(location.git_dir, dir.path().join("modules/foo"));
        assert_eq!(location.work_dir, sub);
        assert_eq!(location.kind, LocationKind::GitFile);
    }

    #[test]
    fn absolute_gitdir_used_directly() {
        let store = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".git"),
            format!("gitdir: {}\n", store.path().display()),
        )
        .unwrap();

        let location = locate(dir.path(), false).unwrap().unwrap();
        assert_eq!(location.git_dir, store.path());
    }

    #[test]
    fn gitdir_target_is_trimmed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".git"), "gitdir: store   \r\nignored\n").unwrap();

        let location = locate(dir.path(), false).unwrap().unwrap();
        assert_eq!(location.git_dir, dir.path().join("store"));
    }

    #[test]
    fn missing_prefix_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".git"), "../modules/foo\n").unwrap();

        let err = locate(dir.path(), true).unwrap_err();
        assert!(matches!(err, LocateError::Malformed { .. }));
        assert!(err.to_string().contains("gitdir:"));
    }

    #[test]
    fn empty_target_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".git"), "gitdir:   \n").unwrap();

        assert!(matches!(
            locate(dir.path(), false),
            Err(LocateError::Malformed { .. })
        ));
    }

    #[test]
    fn plain_directory_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(locate(dir.path(), false).unwrap().is_none());
    }

    #[test]
    fn normalize_resolves_parent_components() {
        assert_eq!(
            normalize_lexically(Path::new("/w/sub/../modules/./foo")),
            PathBuf::from("/w/modules/foo")
        );
    }
}
