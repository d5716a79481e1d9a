use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::git::RepositoryState;
use crate::validation;

/// Pipeline gates, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    ConfigValidated,
    Fetched,
    BranchGated,
    DriftGated,
    Tested,
    Built,
    Released,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::ConfigValidated => "config_validated",
            Gate::Fetched => "fetched",
            Gate::BranchGated => "branch_gated",
            Gate::DriftGated => "drift_gated",
            Gate::Tested => "tested",
            Gate::Built => "built",
            Gate::Released => "released",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryRole {
    Client,
    Server,
}

impl RepositoryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryRole::Client => "client",
            RepositoryRole::Server => "server",
        }
    }
}

impl fmt::Display for RepositoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release stage: names the default drift reference and the build script
/// suffix (`build-<stage>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Stage(String);

impl Stage {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        validation::validate_ref_name("stage", value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, de-duplicated branch names a release may not run from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProtectedBranches(Vec<String>);

impl ProtectedBranches {
    pub fn new<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for branch in branches {
            let branch = branch.into().trim().to_string();
            if !branch.is_empty() && !seen.contains(&branch) {
                seen.push(branch);
            }
        }
        Self(seen)
    }

    pub fn contains(&self, branch: &str) -> bool {
        self.0.iter().any(|b| b == branch)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseOptions {
    pub stage: String,
    /// Overrides the project's drift reference for this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub release: bool,
    pub dry_run: bool,
    pub silent: bool,
}

/// One gate passed, optionally for a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateRecord {
    pub gate: Gate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryRole>,
}

/// What a run learned about one repository.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// The drift reference as resolved in this repository, e.g. `origin/development` or `v2.0.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead_count: Option<u32>,
    /// Manifest version before any bump.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Version after the bump, or the predicted one on a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

/// A command a dry run would have executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommand {
    pub gate: Gate,
    pub repository: RepositoryRole,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRun {
    pub project: String,
    pub stage: Stage,
    pub drift_reference: String,
    pub dry_run: bool,
    pub release: bool,
    pub gates: Vec<GateRecord>,
    pub client: RepositoryReport,
    pub server: RepositoryReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PlannedCommand>,
    pub started_at: String,
    pub finished_at: String,
}

impl ReleaseRun {
    pub fn last_gate(&self) -> Option<Gate> {
        self.gates.last().map(|r| r.gate)
    }
}

/// Read-only view of one repository for `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStatus {
    pub path: String,
    pub drift_reference: String,
    #[serde(flatten)]
    pub state: RepositoryState,
    pub protected_branch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStatus {
    pub project: String,
    pub drift_reference: String,
    pub client: RepositoryStatus,
    pub server: RepositoryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn protected_branches_dedup_in_order() {
        let set = ProtectedBranches::new(["main", "production", "main", " ", "production"]);
        assert_eq!(set.as_slice(), &["main".to_string(), "production".to_string()]);
        assert!(set.contains("main"));
        assert!(!set.contains("feature/x"));
    }

    #[test]
    fn stage_rejects_shell_metacharacters() {
        assert_eq!(Stage::parse("production").unwrap().as_str(), "production");
        assert_eq!(Stage::parse("release/2.1").unwrap().as_str(), "release/2.1");
        let err = Stage::parse("prod; rm -rf /").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArguments);
        assert!(Stage::parse("").is_err());
    }

    #[test]
    fn gate_order_is_declaration_order() {
        let gates = [
            Gate::ConfigValidated,
            Gate::Fetched,
            Gate::BranchGated,
            Gate::DriftGated,
            Gate::Tested,
            Gate::Built,
            Gate::Released,
        ];
        let names: Vec<&str> = gates.iter().map(Gate::as_str).collect();
        assert_eq!(names[2], "branch_gated");
        assert_eq!(serde_json::to_value(Gate::DriftGated).unwrap(), "drift_gated");
    }
}
