//! locate command - Show the repository containing the working directory

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::Context;
use crate::git::{Git, GitError, HeadInfo, RepoLocation};
use crate::ui::output::{self, format_field};

#[derive(Debug, Serialize)]
struct LocateReport<'a> {
    #[serde(flatten)]
    location: &'a RepoLocation,
    head: Option<HeadInfo>,
    remote: Option<RemoteReport>,
}

#[derive(Debug, Serialize)]
struct RemoteReport {
    name: String,
    url: String,
}

/// Show the located repository.
pub fn locate(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let location = repo.handle.location();
    let git = Git::open(location).context("failed to open repository")?;

    let head = match git.head_info() {
        Ok(head) => Some(head),
        Err(GitError::UnbornHead) => None,
        Err(e) => return Err(e).context("failed to resolve HEAD"),
    };

    let remote = find_remote(&git, repo.config.remote()).context("failed to read remotes")?;

    let report = LocateReport {
        location,
        head,
        remote,
    };

    if ctx.json {
        output::print_json(&report)?;
        return Ok(());
    }

    print_text(&report, ctx);
    Ok(())
}

/// The configured remote, or the repository's default one.
fn find_remote(git: &Git, configured: &str) -> Result<Option<RemoteReport>, GitError> {
    if let Some(url) = git.remote_url(configured)? {
        return Ok(Some(RemoteReport {
            name: configured.to_string(),
            url,
        }));
    }

    let Some(name) = git.default_remote()? else {
        return Ok(None);
    };
    Ok(git
        .remote_url(&name)?
        .map(|url| RemoteReport { name, url }))
}

fn print_text(report: &LocateReport<'_>, ctx: &Context) {
    const WIDTH: usize = 9;
    let v = ctx.verbosity;

    output::print(
        format_field("work tree", report.location.work_dir.display(), WIDTH),
        v,
    );
    output::print(
        format_field("git dir", report.location.git_dir.display(), WIDTH),
        v,
    );

    output::print(format_field("kind", report.location.kind, WIDTH), v);

    let head = match &report.head {
        Some(HeadInfo {
            oid,
            branch: Some(branch),
        }) => format!("{} ({})", oid.short(7), branch),
        Some(HeadInfo { oid, branch: None }) => format!("{} (detached)", oid.short(7)),
        None => "(no commits)".to_string(),
    };
    output::print(format_field("head", head, WIDTH), v);

    let remote = match &report.remote {
        Some(remote) => format!("{} {}", remote.name, remote.url),
        None => "(none)".to_string(),
    };
    output::print(format_field("remote", remote, WIDTH), v);
}
