//! Provenance - last-commit attribution for files in a git repository
//!
//! Given any directory inside a work tree, provenance locates the
//! repository's metadata store, walks the full history reachable from HEAD
//! once, and answers "which commit last modified this path?" for every path
//! ever touched by a non-merge commit. Only local repository data is read.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, formats results)
//! - [`attribution`] - Path → last-commit index and the cached repository handle
//! - [`git`] - Single interface for all Git reads: discovery, objects, history
//! - [`core`] - Strong types and configuration
//! - [`ui`] - Output and logging
//!
//! # Correctness Invariants
//!
//! 1. The repository is never written to
//! 2. Merge commits are never reported as an attribution
//! 3. An index is built in full or not at all
//! 4. A handle walks history at most once, however many threads ask

pub mod attribution;
pub mod cli;
pub mod core;
pub mod git;
pub mod ui;
