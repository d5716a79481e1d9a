//! Structured error contract shared by the library and the CLI.
//!
//! Every failure carries a stable [`ErrorCode`], a human message, a JSON
//! `details` payload and optional remediation hints. The CLI renders all of
//! it in the response envelope and maps the code to a process exit status.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::shell::ExecutionResult;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    InvalidArguments,
    InvalidCommand,
    InvalidConfig,
    ProjectNotFound,

    InvalidRepositoryState,
    InvalidRepositoryBranch,
    DetachedHead,
    CommitsBehind,

    GitError,
    ShellCommandFail,

    InternalIo,
    InternalJson,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArguments => "validation.invalid_arguments",
            ErrorCode::InvalidCommand => "validation.invalid_command",
            ErrorCode::InvalidConfig => "config.invalid",
            ErrorCode::ProjectNotFound => "project.not_found",

            ErrorCode::InvalidRepositoryState => "repository.dirty",
            ErrorCode::InvalidRepositoryBranch => "repository.protected_branch",
            ErrorCode::DetachedHead => "repository.detached_head",
            ErrorCode::CommitsBehind => "git.commits_behind",

            ErrorCode::GitError => "git.command_failed",
            ErrorCode::ShellCommandFail => "shell.command_failed",

            ErrorCode::InternalIo => "internal.io_error",
            ErrorCode::InternalJson => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Hint {
    pub message: String,
}

impl Hint {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub cwd: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandFailedDetails {
    fn from_result(command: &str, cwd: &Path, result: &ExecutionResult) -> Self {
        Self {
            command: command.to_string(),
            cwd: cwd.display().to_string(),
            exit_code: result.exit_code,
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitsBehindDetails {
    pub path: String,
    pub reference: String,
    pub behind: u32,
    pub ahead: u32,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(Hint::new(hint));
        self
    }

    // === Validation ===

    pub fn invalid_arguments(field: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidArguments,
            message,
            json!({ "field": field }),
        )
    }

    pub fn invalid_command(command: &str, suggestions: Vec<String>) -> Self {
        let err = Self::new(
            ErrorCode::InvalidCommand,
            format!("Unrecognized command or project: {}", command),
            json!({ "command": command, "suggestions": suggestions }),
        )
        .with_hint("Run `pairship --help` for the list of commands");

        if suggestions.is_empty() {
            err.with_hint("Configure a project first: pairship config <PROJECT> --client <path> --server <path>")
        } else {
            err.with_hint(format!("Did you mean: {}", suggestions.join(", ")))
        }
    }

    // === Configuration ===

    pub fn invalid_config(message: impl Into<String>, details: Value) -> Self {
        Self::new(ErrorCode::InvalidConfig, message, details)
    }

    pub fn invalid_json(err: serde_json::Error, context: &str, path: Option<&Path>) -> Self {
        Self::new(
            ErrorCode::InvalidConfig,
            format!("Invalid JSON in {}: {}", context, err),
            json!({
                "context": context,
                "path": path.map(|p| p.display().to_string()),
                "line": err.line(),
                "column": err.column(),
            }),
        )
    }

    pub fn project_not_found(id: &str, suggestions: Vec<String>) -> Self {
        let err = Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project '{}' is not configured", id),
            json!({ "project": id, "suggestions": suggestions }),
        );
        if suggestions.is_empty() {
            err.with_hint(format!(
                "Configure it: pairship config {} --client <path> --server <path>",
                id
            ))
        } else {
            err.with_hint(format!("Did you mean: {}", suggestions.join(", ")))
        }
    }

    // === Repository gates ===

    pub fn repository_dirty(path: &Path) -> Self {
        Self::new(
            ErrorCode::InvalidRepositoryState,
            format!("Working tree is not clean: {}", path.display()),
            json!({ "path": path.display().to_string() }),
        )
        .with_hint("Commit or stash local changes, then re-run the pipeline")
    }

    pub fn protected_branch(path: &Path, branch: &str, protected: &[String]) -> Self {
        Self::new(
            ErrorCode::InvalidRepositoryBranch,
            format!(
                "Branch '{}' is protected in {}",
                branch,
                path.display()
            ),
            json!({
                "path": path.display().to_string(),
                "branch": branch,
                "protectedBranches": protected,
            }),
        )
        .with_hint("Check out a feature branch before releasing")
    }

    pub fn detached_head(path: &Path) -> Self {
        Self::new(
            ErrorCode::DetachedHead,
            format!("HEAD is not on a branch: {}", path.display()),
            json!({ "path": path.display().to_string() }),
        )
        .with_hint("Check out a branch: git checkout <branch>")
    }

    pub fn commits_behind(path: &Path, reference: &str, behind: u32, ahead: u32) -> Self {
        let details = CommitsBehindDetails {
            path: path.display().to_string(),
            reference: reference.to_string(),
            behind,
            ahead,
        };
        Self::new(
            ErrorCode::CommitsBehind,
            format!(
                "{} is {} commit(s) behind {} ({} ahead)",
                path.display(),
                behind,
                reference,
                ahead
            ),
            serde_json::to_value(details).unwrap_or(Value::Null),
        )
        .with_hint(format!("Merge or rebase onto {} and re-run", reference))
    }

    // === External commands ===

    pub fn git_command_failed(command: &str, cwd: &Path, result: &ExecutionResult) -> Self {
        let details = CommandFailedDetails::from_result(command, cwd, result);
        Self::new(
            ErrorCode::GitError,
            format!(
                "Git command failed (exit {}): {}",
                result.exit_code, command
            ),
            serde_json::to_value(details).unwrap_or(Value::Null),
        )
    }

    pub fn git_unexpected_output(command: &str, cwd: &Path, output: &str) -> Self {
        Self::new(
            ErrorCode::GitError,
            format!("Unexpected output from `{}`: {:?}", command, output),
            json!({
                "command": command,
                "cwd": cwd.display().to_string(),
                "stdout": output,
            }),
        )
    }

    pub fn shell_command_failed(command: &str, cwd: &Path, result: &ExecutionResult) -> Self {
        let details = CommandFailedDetails::from_result(command, cwd, result);
        Self::new(
            ErrorCode::ShellCommandFail,
            format!("Command failed (exit {}): {}", result.exit_code, command),
            serde_json::to_value(details).unwrap_or(Value::Null),
        )
    }

    // === Internal ===

    pub fn internal_io(message: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIo,
            message,
            json!({ "context": context }),
        )
    }

    pub fn internal_json(message: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJson,
            message,
            json!({ "context": context }),
        )
    }

    pub fn internal_unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalUnexpected, message, Value::Null)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for Error {}
