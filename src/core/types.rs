//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RepoPath`] - Repository-relative, `/`-separated file path
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so lookups never have to re-check them.
//!
//! # Examples
//!
//! ```
//! use provenance::core::types::{Oid, RepoPath};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! let path = RepoPath::new("./deploy//app.yaml").unwrap();
//! assert_eq!(path.as_str(), "deploy/app.yaml");
//!
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(RepoPath::new("../outside").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid repository path: {0}")]
    InvalidPath(String),
}

/// A validated Git object identifier.
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use provenance::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID if `len` is larger.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A 40-digit id spelled from a counter, for synthetic graphs.
    pub(crate) fn synthetic(n: u64) -> Self {
        Self(format!("{n:040x}"))
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path relative to the repository root, always `/`-separated.
///
/// This is the key type of the attribution index. Construction normalizes
/// the forms callers tend to pass in:
/// - Backslash separators become `/`
/// - Leading `./` and repeated or trailing separators are dropped
/// - `.` components are removed
///
/// Absolute paths and `..` components are rejected; those must be made
/// relative to the work tree first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Create a normalized repository path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` for empty, absolute, or escaping paths.
    pub fn new(path: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = path.as_ref().replace('\\', "/");

        if raw.starts_with('/') {
            return Err(TypeError::InvalidPath(format!(
                "path must be relative to the repository root: {raw}"
            )));
        }

        let mut components = Vec::new();
        for component in raw.split('/') {
            match component {
                "" | "." => continue,
                ".." => {
                    return Err(TypeError::InvalidPath(format!(
                        "path cannot contain '..': {raw}"
                    )))
                }
                c => components.push(c),
            }
        }

        if components.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }

        Ok(Self(components.join("/")))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod oid {
        use super::*;

        #[test]
        fn valid_sha1() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.as_str().len(), 40);
        }

        #[test]
        fn valid_sha256() {
            let hex = "a".repeat(64);
            assert!(Oid::new(hex).is_ok());
        }

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
            assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(matches!(Oid::new("abc123"), Err(TypeError::InvalidOid(_))));
        }

        #[test]
        fn rejects_non_hex() {
            let bad = "g".repeat(40);
            assert!(matches!(Oid::new(bad), Err(TypeError::InvalidOid(_))));
        }

        #[test]
        fn synthetic_ids_are_valid() {
            let oid = Oid::synthetic(u64::MAX);
            assert_eq!(Oid::new(oid.as_str()).unwrap(), oid);
            assert_eq!(Oid::synthetic(1).as_str(), format!("{}1", "0".repeat(39)));
        }

        #[test]
        fn short_clamps_to_length() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.short(7), "abc123d");
            assert_eq!(oid.short(100).len(), 40);
        }

        #[test]
        fn serde_as_string() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            let json = serde_json::to_string(&oid).unwrap();
            assert_eq!(json, "\"abc123def4567890abc123def4567890abc12345\"");
            let parsed: Oid = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, oid);
        }
    }

    mod repo_path {
        use super::*;

        #[test]
        fn plain_path_unchanged() {
            assert_eq!(RepoPath::new("a/b/c.yaml").unwrap().as_str(), "a/b/c.yaml");
        }

        #[test]
        fn strips_dot_prefix_and_duplicate_separators() {
            assert_eq!(
                RepoPath::new("./a//b/./c.yaml/").unwrap().as_str(),
                "a/b/c.yaml"
            );
        }

        #[test]
        fn converts_backslashes() {
            assert_eq!(RepoPath::new("a\\b.yaml").unwrap().as_str(), "a/b.yaml");
        }

        #[test]
        fn rejects_absolute() {
            assert!(RepoPath::new("/etc/passwd").is_err());
        }

        #[test]
        fn rejects_parent_components() {
            assert!(RepoPath::new("a/../b").is_err());
        }

        #[test]
        fn rejects_empty() {
            assert!(RepoPath::new("").is_err());
            assert!(RepoPath::new("./").is_err());
        }
    }
}
