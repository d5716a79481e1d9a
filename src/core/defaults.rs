use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config;
use crate::error::Result;
use crate::paths;

/// Pipeline defaults, overridable via settings.json.
///
/// Every field is optional in the file; missing fields take the built-in
/// value. Settings are resolved once, at the start of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    #[serde(default = "default_test_command")]
    pub test_command: String,

    #[serde(default = "default_build_script_prefix")]
    pub build_script_prefix: String,

    /// Argument to `<packageManager> version`.
    #[serde(default = "default_version_increment")]
    pub version_increment: String,

    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,

    /// Remote used for drift comparison, pulls and pushes. A reference with
    /// no tracking branch on this remote (a tag, a local branch) is compared
    /// as-is. `null` always compares as-is and pushes to the default remote.
    #[serde(default = "default_remote")]
    pub remote: Option<String>,

    #[serde(default)]
    pub pull_stage: bool,

    /// `{version}` is replaced with the new client version.
    #[serde(default = "default_dependent_commit_message")]
    pub dependent_commit_message: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            package_manager: default_package_manager(),
            test_command: default_test_command(),
            build_script_prefix: default_build_script_prefix(),
            version_increment: default_version_increment(),
            protected_branches: default_protected_branches(),
            remote: default_remote(),
            pull_stage: false,
            dependent_commit_message: default_dependent_commit_message(),
        }
    }
}

impl PipelineSettings {
    pub fn tracking_remote(&self) -> Option<&str> {
        self.remote.as_deref().filter(|r| !r.is_empty())
    }

    pub fn push_remote(&self) -> &str {
        self.remote
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("origin")
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_test_command() -> String {
    "npm test".to_string()
}

fn default_build_script_prefix() -> String {
    "build-".to_string()
}

fn default_version_increment() -> String {
    "prerelease".to_string()
}

pub fn default_protected_branches() -> Vec<String> {
    vec!["production".to_string(), "development".to_string()]
}

fn default_remote() -> Option<String> {
    Some("origin".to_string())
}

fn default_dependent_commit_message() -> String {
    "Update client to {version}".to_string()
}

// =============================================================================
// Loading
// =============================================================================

/// Load settings from the config directory, falling back to built-ins when
/// the file does not exist. A malformed file is an error, not a fallback.
pub fn load_settings() -> Result<PipelineSettings> {
    load_settings_from(&paths::settings_json()?)
}

pub fn load_settings_from(path: &Path) -> Result<PipelineSettings> {
    match config::read_optional(path)? {
        Some(content) => config::from_str(&content, path),
        None => Ok(PipelineSettings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_builtin_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, PipelineSettings::default());
        assert_eq!(settings.protected_branches, vec!["production", "development"]);
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"testCommand": "yarn test", "pullStage": true}"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.test_command, "yarn test");
        assert!(settings.pull_stage);
        assert_eq!(settings.package_manager, "npm");
        assert_eq!(settings.remote.as_deref(), Some("origin"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();
        assert!(load_settings_from(&path).is_err());
    }

    #[test]
    fn null_remote_still_pushes_to_origin() {
        let mut settings = PipelineSettings::default();
        assert_eq!(settings.tracking_remote(), Some("origin"));
        settings.remote = None;
        assert_eq!(settings.tracking_remote(), None);
        assert_eq!(settings.push_remote(), "origin");
    }
}
