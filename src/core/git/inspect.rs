use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::shell::CommandRunner;

use super::{query_git, require_git};

/// Point-in-time view of one repository. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    pub is_clean: bool,
    pub current_branch: String,
    pub behind_count: u32,
    pub ahead_count: u32,
}

/// True iff there are no staged, unstaged, or untracked changes.
pub fn is_clean(runner: &dyn CommandRunner, path: &Path) -> Result<bool> {
    let stdout = require_git(runner, path, &["status", "--porcelain"])?;
    Ok(stdout.trim().is_empty())
}

/// Resolve the branch HEAD points at.
///
/// `git symbolic-ref --quiet` exits 1 when HEAD is detached; every other
/// non-zero code is a real git failure.
pub fn current_branch(runner: &dyn CommandRunner, path: &Path) -> Result<String> {
    let (command, result) = query_git(runner, path, &["symbolic-ref", "--quiet", "--short", "HEAD"])?;

    match result.exit_code {
        0 => {
            let branch = result.stdout.trim();
            if branch.is_empty() {
                return Err(Error::git_unexpected_output(&command, path, &result.stdout));
            }
            Ok(branch.to_string())
        }
        1 => Err(Error::detached_head(path)),
        _ => Err(Error::git_command_failed(&command, path, &result)),
    }
}

/// Count commits only on `reference` (behind) and only on HEAD (ahead).
pub fn behind_ahead(runner: &dyn CommandRunner, path: &Path, reference: &str) -> Result<(u32, u32)> {
    let range = format!("{}...HEAD", reference);
    let (command, result) = query_git(runner, path, &["rev-list", "--left-right", "--count", &range])?;

    if !result.success() {
        return Err(Error::git_command_failed(&command, path, &result));
    }

    parse_behind_ahead(&result.stdout)
        .ok_or_else(|| Error::git_unexpected_output(&command, path, &result.stdout))
}

/// Name to compare `reference` against in this repository.
///
/// `<remote>/<reference>` when the remote has a tracking branch of that name,
/// otherwise the bare reference, which covers tags and local-only branches.
pub fn resolve_reference(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: Option<&str>,
    reference: &str,
) -> Result<String> {
    let Some(remote) = remote else {
        return Ok(reference.to_string());
    };

    let tracking = format!("refs/remotes/{}/{}", remote, reference);
    let (command, result) = query_git(runner, path, &["rev-parse", "--verify", "--quiet", &tracking])?;

    match result.exit_code {
        0 => Ok(format!("{}/{}", remote, reference)),
        1 => Ok(reference.to_string()),
        _ => Err(Error::git_command_failed(&command, path, &result)),
    }
}

/// Parse `git rev-list --left-right --count A...B` output.
///
/// The left field counts commits reachable only from the reference (behind),
/// the right field commits reachable only from HEAD (ahead).
pub fn parse_behind_ahead(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let behind = parts.next()?.parse::<u32>().ok()?;
    let ahead = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((behind, ahead))
}

/// Gather cleanliness, branch and drift for one repository.
pub fn snapshot(runner: &dyn CommandRunner, path: &Path, reference: &str) -> Result<RepositoryState> {
    let is_clean = is_clean(runner, path)?;
    let current_branch = current_branch(runner, path)?;
    let (behind_count, ahead_count) = behind_ahead(runner, path, reference)?;

    Ok(RepositoryState {
        is_clean,
        current_branch,
        behind_count,
        ahead_count,
    })
}
