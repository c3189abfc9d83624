//! cli
//!
//! Command-line interface for provenance.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Resolve global configuration and build the command [`Context`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Repository discovery and attribution live in
//! [`crate::git`] and [`crate::attribution`]; handlers only wire flags and
//! configuration into them and format the results.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};
pub use commands::Context;

use crate::core::config::Config;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity);

    let cwd = match cli.cwd {
        Some(ref cwd) => cwd.clone(),
        None => std::env::current_dir().context("failed to read the current directory")?,
    };

    // Global scope only; repo config is read once the repository is located.
    let loaded = Config::load(None).context("failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    let config = loaded.config;

    // CLI flags override configuration.
    let ctx = Context {
        cwd,
        verbosity,
        json: cli.json || config.json_output(),
        detect_parents: !cli.no_detect_parents && config.detect_parents(),
    };

    commands::dispatch(cli.command, &ctx)
}
