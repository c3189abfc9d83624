//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output
//! - `--no-detect-parents`: Only look for `.git` in the start directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provenance - last-commit attribution for files in a git repository
#[derive(Parser, Debug)]
#[command(name = "prov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if prov was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not search parent directories for the repository
    #[arg(long, global = true)]
    pub no_detect_parents: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the repository containing the working directory
    #[command(
        name = "locate",
        long_about = "Show the repository containing the working directory.\n\n\
            Searches the working directory and, unless --no-detect-parents is given, \
            each parent directory for a `.git` entry. Worktrees and submodules whose \
            `.git` is a `gitdir:` file are followed to their metadata store.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Where is the repository for this directory?
    prov locate

    # Check a different directory without changing into it
    prov --cwd deploy/overlays/prod locate

    # Only accept a repository rooted exactly here
    prov --no-detect-parents locate"
    )]
    Locate,

    /// Show the last commit that modified each path
    #[command(
        name = "last-commit",
        visible_alias = "lc",
        long_about = "Show the last commit that modified each path.\n\n\
            Walks the full history reachable from HEAD once and reports, for every \
            requested path, the non-merge commit with the latest author date that \
            changed it. Paths that no non-merge commit touched are reported as \
            `unknown`; they do not stop the remaining lookups.\n\n\
            Relative paths are resolved against the work tree root, not the current \
            directory, so the same path works from anywhere inside the repository. \
            Absolute paths must point inside the work tree.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Attribute a single manifest
    prov last-commit deploy/app.yaml

    # From a subdirectory, still name paths from the root
    cd deploy && prov lc deploy/app.yaml

    # Several paths at once (history is walked only once)
    prov lc deploy/app.yaml deploy/service.yaml

    # Machine-readable; unknown paths have \"commit\": null
    prov --json lc deploy/app.yaml"
    )]
    LastCommit {
        /// Paths relative to the work tree root, not the current directory
        /// (or absolute inside the work tree)
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,
    },

    /// Print the attribution of every path in history
    #[command(
        name = "index",
        long_about = "Print the attribution of every path in history.\n\n\
            Builds the full attribution index and prints one line per path, sorted \
            by path. Deleted paths are included; they are attributed to the commit \
            that removed them. With --debug, a summary of the history walk follows.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Everything, as text
    prov index

    # As a JSON object keyed by path
    prov --json index"
    )]
    Index,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for prov commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    prov completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    prov completion zsh >> ~/.zshrc

    # Fish
    prov completion fish > ~/.config/fish/completions/prov.fish

    # PowerShell
    prov completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["prov", "index", "--json", "--cwd", "/tmp"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
        assert!(matches!(cli.command, Command::Index));
    }

    #[test]
    fn last_commit_alias() {
        let cli = Cli::try_parse_from(["prov", "lc", "a.yaml", "b.yaml"]).unwrap();
        match cli.command {
            Command::LastCommit { paths } => assert_eq!(paths, vec!["a.yaml", "b.yaml"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn last_commit_help_names_root_relative_paths() {
        let mut cmd = Cli::command();
        let help = cmd
            .find_subcommand_mut("last-commit")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("resolved against the work tree root"));
    }

    #[test]
    fn last_commit_requires_a_path() {
        assert!(Cli::try_parse_from(["prov", "last-commit"]).is_err());
    }
}
