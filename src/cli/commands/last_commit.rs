//! last-commit command - Show the last commit that modified each path

use anyhow::{Context as _, Result};
use chrono::SecondsFormat;
use serde::Serialize;

use super::Context;
use crate::attribution::CommitView;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct PathAttribution<'a> {
    path: &'a str,
    commit: Option<CommitView>,
}

/// Attribute each of `paths`.
///
/// Paths without attribution are reported as unknown; any other failure
/// aborts the command.
pub fn last_commit(ctx: &Context, paths: &[String]) -> Result<()> {
    let repo = ctx.open_repo()?;

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let commit = match repo.handle.last_commit_for(path) {
            Ok(commit) => Some(commit),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e).with_context(|| format!("failed to attribute {path}")),
        };
        results.push(PathAttribution {
            path: path.as_str(),
            commit,
        });
    }

    output::debug(
        format!("history passes: {}", repo.handle.build_count()),
        ctx.verbosity,
    );

    if ctx.json {
        output::print_json(&results)?;
        return Ok(());
    }

    for result in &results {
        let line = match &result.commit {
            Some(commit) => format!("{}\t{}", result.path, describe(commit)),
            None => format!("{}\tunknown", result.path),
        };
        output::print(line, ctx.verbosity);
    }
    Ok(())
}

/// One-line commit description: short sha, date, author, summary.
pub(super) fn describe(commit: &CommitView) -> String {
    format!(
        "{}  {}  {} <{}>  {}",
        commit.short_sha(),
        commit.author_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        commit.author_name,
        commit.author_email,
        commit.summary()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn describe_format() {
        let commit = CommitView {
            sha: "0123456789abcdef0123456789abcdef01234567".into(),
            author_name: "Alice".into(),
            author_email: "alice@example.com".into(),
            author_date: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            message: "Pin image digest\n\nbody".into(),
        };
        assert_eq!(
            describe(&commit),
            "0123456  2023-11-14T22:13:20Z  Alice <alice@example.com>  Pin image digest"
        );
    }

    #[test]
    fn unknown_serializes_as_null() {
        let value = serde_json::to_value(PathAttribution {
            path: "a.yaml",
            commit: None,
        })
        .unwrap();
        assert_eq!(value["path"], "a.yaml");
        assert!(value["commit"].is_null());
    }
}
