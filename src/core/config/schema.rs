//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$PROVENANCE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/provenance/config.toml`
//! 3. `~/.provenance/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git_dir>/provenance/config.toml`. For worktrees and
//! submodules this is inside the resolved metadata store, not the work tree.
//!
//! # Validation
//!
//! Enumerated values such as `failure_policy` are checked by serde while
//! parsing. Free-form values are validated after parsing (e.g., `output`
//! must name a known format).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::attribution::IndexFailurePolicy;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// detect_parents = true
/// output = "json"
///
/// [index]
/// failure_policy = "retry"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Search parent directories for the metadata store
    pub detect_parents: Option<bool>,

    /// Default output format ("text" or "json")
    pub output: Option<String>,

    /// Index build settings
    pub index: Option<IndexConfig>,
}

impl GlobalConfig {
    /// Valid output formats.
    pub const VALID_OUTPUTS: &'static [&'static str] = &["text", "json"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(output) = &self.output {
            if !Self::VALID_OUTPUTS.contains(&output.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid output format '{}', must be one of: {}",
                    output,
                    Self::VALID_OUTPUTS.join(", ")
                )));
            }
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "upstream"
///
/// [index]
/// failure_policy = "sticky"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote reported by `prov locate` (default: "origin")
    pub remote: Option<String>,

    /// Index build settings
    pub index: Option<IndexConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Index build settings, valid in both scopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Behavior after a failed build ("sticky" or "retry")
    pub failure_policy: Option<IndexFailurePolicy>,
}
