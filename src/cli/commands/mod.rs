//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository through [`Context::open_repo`] (except `completion`)
//! 2. Queries the attribution layer
//! 3. Formats and displays output, as text or JSON
//!
//! Handlers never write to the repository.

mod completion;
mod index;
mod last_commit;
mod locate;

pub use completion::completion;
pub use index::index;
pub use last_commit::last_commit;
pub use locate::locate;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::attribution::{HandleOptions, OpenError, RepositoryHandle};
use crate::cli::args::Command;
use crate::core::config::Config;
use crate::ui::output::{self, Verbosity};

/// Settings shared by every command, resolved from flags and global config.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory discovery starts from.
    pub cwd: PathBuf,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Search parent directories for the repository.
    pub detect_parents: bool,
}

/// A located repository with its merged configuration.
#[derive(Debug)]
pub struct OpenRepo {
    /// Attribution handle for the repository.
    pub handle: RepositoryHandle,
    /// Global config merged with the repo config.
    pub config: Config,
}

impl Context {
    /// Locate the repository for `cwd` and load its configuration.
    pub fn open_repo(&self) -> Result<OpenRepo> {
        let location = crate::git::locate(&self.cwd, self.detect_parents)
            .with_context(|| format!("failed to search for a repository from {}", self.cwd.display()))?
            .ok_or_else(|| OpenError::NotARepo {
                path: self.cwd.clone(),
            })?;

        let loaded = Config::load(Some(&location.git_dir)).with_context(|| {
            format!(
                "failed to load configuration for {}",
                location.git_dir.display()
            )
        })?;
        if let Some(path) = loaded.config.repo_config_loaded_from() {
            output::debug(format!("repo config: {}", path.display()), self.verbosity);
        }

        let options = HandleOptions {
            detect_parents: self.detect_parents,
            ..loaded.config.handle_options()
        };

        Ok(OpenRepo {
            handle: RepositoryHandle::from_location(location, options),
            config: loaded.config,
        })
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Locate => locate::locate(ctx),
        Command::LastCommit { paths } => last_commit::last_commit(ctx, &paths),
        Command::Index => index::index(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}
