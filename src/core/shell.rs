//! Shell execution and argument quoting.
//!
//! Commands are passed as complete command lines and run through the
//! platform shell in an explicit working directory. Nothing here escapes the
//! command; callers quote interpolated values with [`quote_arg`].

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use serde::Serialize;

use crate::error::{Error, Result};

/// Captured result of a single command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a fully formed command line in `cwd` and waits for it to exit.
///
/// `Err` is reserved for commands that could not be started at all; a
/// non-zero exit is reported through [`ExecutionResult::exit_code`].
pub trait CommandRunner {
    fn run(&self, command: &str, cwd: &Path, silent: bool) -> Result<ExecutionResult>;
}

/// Runs commands on the local machine through `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalShell;

impl LocalShell {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for LocalShell {
    fn run(&self, command: &str, cwd: &Path, silent: bool) -> Result<ExecutionResult> {
        let mut cmd = shell_command(command);
        cmd.current_dir(cwd);

        if silent {
            let out = cmd.output().map_err(|e| spawn_error(command, cwd, e))?;
            return Ok(ExecutionResult {
                exit_code: out.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            });
        }

        run_echoed(cmd, command, cwd)
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    let cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    cmd
}

fn spawn_error(command: &str, cwd: &Path, e: io::Error) -> Error {
    Error::internal_io(
        format!("Failed to start `{}` in {}: {}", command, cwd.display(), e),
        Some("spawn command".to_string()),
    )
}

// Output is echoed to stderr so stdout stays reserved for the JSON envelope.
fn run_echoed(mut cmd: Command, command: &str, cwd: &Path) -> Result<ExecutionResult> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(command, cwd, e))?;

    let stderr_pipe = child.stderr.take();
    let stderr_thread = thread::spawn(move || tee_to_stderr(stderr_pipe));
    let stdout = tee_to_stderr(child.stdout.take());
    let stderr = stderr_thread.join().unwrap_or_default();

    let status = child
        .wait()
        .map_err(|e| Error::internal_io(e.to_string(), Some("wait for command".to_string())))?;

    Ok(ExecutionResult {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

fn tee_to_stderr<R: Read>(pipe: Option<R>) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };

    let mut captured = String::new();
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();
    while let Ok(n) = reader.read_until(b'\n', &mut line) {
        if n == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        let _ = io::stderr().write_all(text.as_bytes());
        captured.push_str(&text);
        line.clear();
    }
    captured
}

/// Run a command and require exit code 0.
///
/// Any other exit code is a `ShellCommandFail`, whatever was written to
/// stderr.
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &str,
    cwd: &Path,
    silent: bool,
) -> Result<ExecutionResult> {
    let result = runner.run(command, cwd, silent)?;
    if !result.success() {
        return Err(Error::shell_command_failed(command, cwd, &result));
    }
    Ok(result)
}

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for shell execution.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Quote and join multiple arguments for shell execution.
pub fn quote_args(args: &[&str]) -> String {
    args.iter()
        .map(|a| quote_arg(a))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedRunner {
        result: ExecutionResult,
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for FixedRunner {
        fn run(&self, command: &str, _cwd: &Path, _silent: bool) -> Result<ExecutionResult> {
            self.calls.borrow_mut().push(command.to_string());
            Ok(self.result.clone())
        }
    }

    fn fixed(exit_code: i32, stderr: &str) -> FixedRunner {
        FixedRunner {
            result: ExecutionResult {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn run_checked_accepts_zero_even_with_stderr() {
        let runner = fixed(0, "npm WARN deprecated something");
        let result = run_checked(&runner, "npm test", Path::new("/tmp"), true);
        assert!(result.is_ok());
    }

    #[test]
    fn run_checked_rejects_any_nonzero_exit() {
        for code in [1, 2, 127, -1] {
            let runner = fixed(code, "");
            let err = run_checked(&runner, "npm test", Path::new("/tmp"), true).unwrap_err();
            assert_eq!(err.code, crate::error::ErrorCode::ShellCommandFail);
            assert_eq!(err.details["exitCode"], code);
        }
    }

    #[cfg(unix)]
    #[test]
    fn local_shell_captures_output_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalShell
            .run("echo out; echo err 1>&2; exit 3", dir.path(), true)
            .unwrap();
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn local_shell_echoed_mode_still_captures() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalShell.run("echo hello", dir.path(), false).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn local_shell_runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let result = LocalShell.run("ls", dir.path(), true).unwrap();
        assert!(result.stdout.contains("marker.txt"));
    }

    #[test]
    fn quote_arg_simple() {
        assert_eq!(quote_arg("feature/x"), "feature/x");
        assert_eq!(quote_arg("v1.2.0-0"), "v1.2.0-0");
    }

    #[test]
    fn quote_arg_with_spaces() {
        assert_eq!(quote_arg("Update client to 1.0.0"), "'Update client to 1.0.0'");
    }

    #[test]
    fn quote_arg_with_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn quote_args_mixed() {
        assert_eq!(
            quote_args(&["commit", "-m", "client 1.0"]),
            "commit -m 'client 1.0'"
        );
    }
}
