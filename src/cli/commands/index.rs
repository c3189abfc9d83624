//! index command - Print the attribution of every path in history

use std::collections::BTreeMap;

use anyhow::{Context as _, Result};

use super::last_commit::describe;
use super::Context;
use crate::attribution::CommitView;
use crate::ui::output;

/// Dump the full attribution index, sorted by path.
pub fn index(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let index = repo
        .handle
        .index()
        .context("failed to build attribution index")?;

    if ctx.json {
        let map: BTreeMap<&str, &CommitView> = index.entries().into_iter().collect();
        output::print_json(&map)?;
    } else {
        for (path, commit) in index.entries() {
            output::print(format!("{}\t{}", path, describe(commit)), ctx.verbosity);
        }
    }

    output::debug(
        format!(
            "head {}: {} paths, {} commits scanned, {} merges skipped",
            index.head().short(7),
            index.len(),
            index.commits_scanned(),
            index.merges_skipped()
        ),
        ctx.verbosity,
    );
    Ok(())
}
