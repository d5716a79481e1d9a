//! Mutating git operations used by the release pipeline.
//!
//! Failures here are `ShellCommandFail`, not `GitError`: the pipeline treats
//! fetches, commits and pushes like any other external step.

use std::path::Path;

use crate::error::Result;
use crate::shell::{run_checked, CommandRunner};

use super::git_command;

pub fn fetch_all(runner: &dyn CommandRunner, path: &Path, silent: bool) -> Result<()> {
    run_checked(runner, &git_command(&["fetch", "--all"]), path, silent)?;
    Ok(())
}

pub fn pull(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: &str,
    branch: &str,
    silent: bool,
) -> Result<()> {
    run_checked(runner, &git_command(&["pull", remote, branch]), path, silent)?;
    Ok(())
}

/// Stage everything, including untracked files.
pub fn add_all(runner: &dyn CommandRunner, path: &Path, silent: bool) -> Result<()> {
    run_checked(runner, &git_command(&["add", "-A"]), path, silent)?;
    Ok(())
}

pub fn commit(runner: &dyn CommandRunner, path: &Path, message: &str, silent: bool) -> Result<()> {
    run_checked(runner, &git_command(&["commit", "-m", message]), path, silent)?;
    Ok(())
}

pub fn push_branch(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: &str,
    branch: &str,
    silent: bool,
) -> Result<()> {
    run_checked(runner, &git_command(&["push", remote, branch]), path, silent)?;
    Ok(())
}

pub fn push_tag(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: &str,
    tag: &str,
    silent: bool,
) -> Result<()> {
    run_checked(runner, &git_command(&["push", remote, tag]), path, silent)?;
    Ok(())
}
