//! Progress reporting for long-running commands.
//!
//! The command that starts a run owns the reporter and hands it to the
//! pipeline, which announces every step it enters and how that step ended.

use crate::error::Error;

pub trait Progress {
    fn report_start(&mut self, step: &str);
    fn report_success(&mut self, step: &str);
    fn report_failure(&mut self, step: &str, error: &Error);
}

/// Prefixed status lines on stderr, shown only when stderr is a terminal.
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl Progress for TerminalProgress {
    fn report_start(&mut self, step: &str) {
        log_status!("make", "{}...", step);
    }

    fn report_success(&mut self, step: &str) {
        log_status!("make", "{} ok", step);
    }

    fn report_failure(&mut self, step: &str, error: &Error) {
        log_status!("make", "{} failed: {}", step, error.message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(String),
    Succeeded(String),
    Failed { step: String, code: String },
}

/// Keeps every event in memory. Used by tests and by callers that want the
/// step history after the run.
#[derive(Debug, Default)]
pub struct RecordedProgress {
    pub events: Vec<ProgressEvent>,
}

impl RecordedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps that started and finished successfully, in order.
    pub fn completed(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Succeeded(step) => Some(step.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failure(&self) -> Option<(&str, &str)> {
        self.events.iter().find_map(|e| match e {
            ProgressEvent::Failed { step, code } => Some((step.as_str(), code.as_str())),
            _ => None,
        })
    }
}

impl Progress for RecordedProgress {
    fn report_start(&mut self, step: &str) {
        self.events.push(ProgressEvent::Started(step.to_string()));
    }

    fn report_success(&mut self, step: &str) {
        self.events.push(ProgressEvent::Succeeded(step.to_string()));
    }

    fn report_failure(&mut self, step: &str, error: &Error) {
        self.events.push(ProgressEvent::Failed {
            step: step.to_string(),
            code: error.code.as_str().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::Value;

    #[test]
    fn recorder_tracks_outcomes() {
        let mut progress = RecordedProgress::new();
        progress.report_start("fetched");
        progress.report_success("fetched");
        progress.report_start("tested client");
        progress.report_failure(
            "tested client",
            &Error::new(ErrorCode::ShellCommandFail, "boom", Value::Null),
        );

        assert_eq!(progress.completed(), vec!["fetched"]);
        assert_eq!(
            progress.failure(),
            Some(("tested client", "shell.command_failed"))
        );
    }
}
