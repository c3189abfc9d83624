//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Per-repository overrides, stored inside the metadata store
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$PROVENANCE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/provenance/config.toml`
//! 3. `~/.provenance/config.toml`
//!
//! # Repo Config Location
//!
//! `<git_dir>/provenance/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use provenance::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Remote: {}", config.remote());
//! println!("Policy: {:?}", config.failure_policy());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, IndexConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::attribution::{HandleOptions, IndexFailurePolicy};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "PROVENANCE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically. Repo config overrides global
/// config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads the repo config stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be read, parsed or
    /// validated. Missing config files are not an error (defaults are used).
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let global_path = Self::find_global(&mut warnings);
        let mut result = Self::load_from(global_path.as_deref(), git_dir)?;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Load configuration from an explicit global file.
    ///
    /// `global_path` of `None` means no global file; defaults are used.
    pub fn load_from(
        global_path: Option<&Path>,
        git_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global = match global_path {
            Some(path) => Self::read_config::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (repo, repo_path) = match git_dir {
            Some(git_dir) => {
                let path = Self::repo_config_path(git_dir);
                if path.exists() {
                    (Some(Self::read_config::<RepoConfig>(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path: global_path.map(Path::to_path_buf),
                repo_path,
            },
            warnings: Vec::new(),
        })
    }

    /// Find the global config file in the standard locations.
    fn find_global(warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf> {
        // 1. Check $PROVENANCE_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warnings.push(ConfigWarning {
                message: format!("{} points to a missing file, ignoring it", CONFIG_ENV),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/provenance/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("provenance/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.provenance/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".provenance/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the repo config inside a metadata store.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("provenance/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Whether discovery searches parent directories.
    ///
    /// Defaults to `true` if not configured.
    pub fn detect_parents(&self) -> bool {
        self.global.detect_parents.unwrap_or(true)
    }

    /// Whether output defaults to JSON.
    ///
    /// Defaults to `false` (text) if not configured.
    pub fn json_output(&self) -> bool {
        self.global.output.as_deref() == Some("json")
    }

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Behavior after a failed index build.
    ///
    /// Defaults to [`IndexFailurePolicy::Sticky`] if not configured.
    pub fn failure_policy(&self) -> IndexFailurePolicy {
        let repo = self.repo.as_ref().and_then(|r| r.index.as_ref());
        let global = self.global.index.as_ref();

        [repo, global]
            .into_iter()
            .flatten()
            .find_map(|index| index.failure_policy)
            .unwrap_or_default()
    }

    /// Handle options derived from this configuration.
    pub fn handle_options(&self) -> HandleOptions {
        HandleOptions {
            detect_parents: self.detect_parents(),
            failure_policy: self.failure_policy(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_config(git_dir: &Path, contents: &str) {
        let path = Config::repo_config_path(git_dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_from(None, None).unwrap();
        let config = result.config;

        assert!(config.detect_parents());
        assert!(!config.json_output());
        assert_eq!(config.remote(), "origin");
        assert_eq!(config.failure_policy(), IndexFailurePolicy::Sticky);
        assert!(config.global_config_loaded_from().is_none());
        assert!(config.repo_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "output = \"json\"\n").unwrap();

        std::env::set_var(CONFIG_ENV, &config_path);
        let result = Config::load(None);
        std::env::remove_var(CONFIG_ENV);

        let config = result.unwrap().config;
        assert!(config.json_output());
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_global_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
            detect_parents = false

            [index]
            failure_policy = "retry"
            "#,
        )
        .unwrap();

        let config = Config::load_from(Some(&config_path), None).unwrap().config;
        assert!(!config.detect_parents());
        assert_eq!(
            config.handle_options(),
            HandleOptions {
                detect_parents: false,
                failure_policy: IndexFailurePolicy::Retry,
            }
        );
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().join(".git");
        write_repo_config(&git_dir, "remote = \"upstream\"\n");

        let result = Config::load_from(None, Some(&git_dir)).unwrap();
        let config = result.config;

        assert_eq!(config.remote(), "upstream");
        assert_eq!(
            config.repo_config_loaded_from(),
            Some(git_dir.join("provenance/config.toml").as_path())
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn missing_repo_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(None, Some(temp.path())).unwrap().config;
        assert!(config.repo.is_none());
    }

    #[test]
    fn repo_policy_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_path = temp.path().join("global.toml");
        fs::write(&global_path, "[index]\nfailure_policy = \"retry\"\n").unwrap();

        let git_dir = temp.path().join("repo.git");
        write_repo_config(&git_dir, "[index]\nfailure_policy = \"sticky\"\n");

        let config = Config::load_from(Some(&global_path), Some(&git_dir))
            .unwrap()
            .config;
        assert_eq!(config.failure_policy(), IndexFailurePolicy::Sticky);
    }

    #[test]
    fn global_policy_applies_without_repo_override() {
        let temp = TempDir::new().unwrap();
        let global_path = temp.path().join("global.toml");
        fs::write(&global_path, "[index]\nfailure_policy = \"retry\"\n").unwrap();

        let git_dir = temp.path().join("repo.git");
        write_repo_config(&git_dir, "remote = \"origin\"\n");

        let config = Config::load_from(Some(&global_path), Some(&git_dir))
            .unwrap()
            .config;
        assert_eq!(config.failure_policy(), IndexFailurePolicy::Retry);
    }

    #[test]
    fn invalid_policy_rejected() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().join(".git");
        write_repo_config(&git_dir, "[index]\nfailure_policy = \"never\"\n");

        let result = Config::load_from(None, Some(&git_dir));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().join(".git");
        write_repo_config(
            &git_dir,
            r#"
            remote = "origin"
            unknown_field = true
            "#,
        );

        let result = Config::load_from(None, Some(&git_dir));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn unreadable_global_is_an_error() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be read as a file.
        let result = Config::load_from(Some(temp.path()), None);
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
