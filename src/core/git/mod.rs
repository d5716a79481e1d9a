mod inspect;
mod operations;

pub use inspect::*;
pub use operations::*;

use std::path::Path;

use crate::error::{Error, Result};
use crate::shell::{quote_args, CommandRunner, ExecutionResult};

/// Run a read-only git query silently.
///
/// Returns the raw result; callers decide which exit codes are meaningful.
fn query_git(
    runner: &dyn CommandRunner,
    path: &Path,
    args: &[&str],
) -> Result<(String, ExecutionResult)> {
    let command = git_command(args);
    let result = runner.run(&command, path, true)?;
    Ok((command, result))
}

/// Run a git query and treat any non-zero exit as a `GitError`.
fn require_git(runner: &dyn CommandRunner, path: &Path, args: &[&str]) -> Result<String> {
    let (command, result) = query_git(runner, path, args)?;
    if !result.success() {
        return Err(Error::git_command_failed(&command, path, &result));
    }
    Ok(result.stdout)
}

pub fn git_command(args: &[&str]) -> String {
    format!("git {}", quote_args(args))
}
