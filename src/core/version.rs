//! Version and build driver: reads, bumps and publishes package versions and
//! runs the package manager's test and build scripts.

use std::path::Path;

use semver::{Prerelease, Version};
use serde_json::json;

use crate::defaults::PipelineSettings;
use crate::error::{Error, Result};
use crate::git;
use crate::manifest;
use crate::shell::{quote_arg, run_checked, CommandRunner};

/// Read and validate the manifest's declared version.
pub fn current_version(repo: &Path) -> Result<String> {
    let path = manifest::manifest_path(repo);
    let raw = manifest::require(repo)?.version.ok_or_else(|| {
        Error::invalid_config(
            format!("Missing \"version\" in {}", path.display()),
            json!({ "path": path.display().to_string(), "field": "version" }),
        )
    })?;

    let parsed = Version::parse(raw.trim()).map_err(|e| {
        Error::invalid_config(
            format!("Invalid version '{}' in {}: {}", raw, path.display(), e),
            json!({ "path": path.display().to_string(), "field": "version", "value": raw }),
        )
    })?;

    Ok(parsed.to_string())
}

/// Compute the version `npm version <increment>` would produce.
/// increment: "major", "minor", "patch" or "prerelease"
pub fn next_version(version: &str, increment: &str) -> Option<String> {
    let mut v = Version::parse(version).ok()?;
    let is_pre = !v.pre.is_empty();

    match increment {
        "major" => {
            if !(is_pre && v.minor == 0 && v.patch == 0) {
                v.major += 1;
            }
            v.minor = 0;
            v.patch = 0;
            v.pre = Prerelease::EMPTY;
        }
        "minor" => {
            if !(is_pre && v.patch == 0) {
                v.minor += 1;
            }
            v.patch = 0;
            v.pre = Prerelease::EMPTY;
        }
        "patch" => {
            if !is_pre {
                v.patch += 1;
            }
            v.pre = Prerelease::EMPTY;
        }
        "prerelease" => {
            if is_pre {
                v.pre = bump_prerelease(&v.pre)?;
            } else {
                v.patch += 1;
                v.pre = Prerelease::new("0").ok()?;
            }
        }
        _ => return None,
    }

    v.build = semver::BuildMetadata::EMPTY;
    Some(v.to_string())
}

// `1.0.0-3` -> `1.0.0-4`, `1.0.0-beta` -> `1.0.0-beta.0`
fn bump_prerelease(pre: &Prerelease) -> Option<Prerelease> {
    let mut parts: Vec<String> = pre.as_str().split('.').map(String::from).collect();
    match parts.last().and_then(|p| p.parse::<u64>().ok()) {
        Some(n) => {
            let last = parts.len() - 1;
            parts[last] = (n + 1).to_string();
        }
        None => parts.push("0".to_string()),
    }
    Prerelease::new(&parts.join(".")).ok()
}

/// Runs package-manager and git steps for one repository at a time.
pub struct BuildDriver<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a PipelineSettings,
    silent: bool,
}

impl<'a> BuildDriver<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a PipelineSettings, silent: bool) -> Self {
        Self {
            runner,
            settings,
            silent,
        }
    }

    pub fn test_command(&self) -> String {
        self.settings.test_command.clone()
    }

    pub fn build_command(&self, stage: &str) -> String {
        let script = format!("{}{}", self.settings.build_script_prefix, stage);
        format!(
            "{} run {}",
            self.settings.package_manager,
            quote_arg(&script)
        )
    }

    pub fn version_command(&self) -> String {
        format!(
            "{} version {}",
            self.settings.package_manager,
            quote_arg(&self.settings.version_increment)
        )
    }

    pub fn dependent_commit_message(&self, version: &str) -> String {
        self.settings
            .dependent_commit_message
            .replace("{version}", version)
    }

    pub fn test(&self, repo: &Path) -> Result<()> {
        run_checked(self.runner, &self.test_command(), repo, self.silent)?;
        Ok(())
    }

    pub fn build(&self, repo: &Path, stage: &str) -> Result<()> {
        run_checked(self.runner, &self.build_command(stage), repo, self.silent)?;
        Ok(())
    }

    /// Increment the version, then push the release commit and its tag.
    ///
    /// Each step is its own command. A failed push leaves the local bump in
    /// place; there is no rollback.
    pub fn bump_version(&self, repo: &Path, branch: &str) -> Result<String> {
        run_checked(self.runner, &self.version_command(), repo, self.silent)?;
        let new_version = current_version(repo)?;
        log_status!("version", "{} is now {}", repo.display(), new_version);

        let remote = self.settings.push_remote();
        git::push_branch(self.runner, repo, remote, branch, self.silent)?;
        git::push_tag(
            self.runner,
            repo,
            remote,
            &format!("v{}", new_version),
            self.silent,
        )?;

        Ok(new_version)
    }

    /// Stage everything and commit with a message naming the dependency's new
    /// version. Pushing is left to the caller.
    pub fn commit_dependent_version(&self, repo: &Path, branch: &str, version: &str) -> Result<()> {
        let head = git::current_branch(self.runner, repo)?;
        if head != branch {
            return Err(Error::internal_unexpected(format!(
                "{} moved from branch '{}' to '{}' during the release",
                repo.display(),
                branch,
                head
            )));
        }

        git::add_all(self.runner, repo, self.silent)?;
        git::commit(
            self.runner,
            repo,
            &self.dependent_commit_message(version),
            self.silent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::shell::ExecutionResult;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[test]
    fn next_prerelease_versions() {
        assert_eq!(next_version("1.2.3", "prerelease").as_deref(), Some("1.2.4-0"));
        assert_eq!(next_version("1.2.4-0", "prerelease").as_deref(), Some("1.2.4-1"));
        assert_eq!(next_version("1.2.4-beta", "prerelease").as_deref(), Some("1.2.4-beta.0"));
        assert_eq!(next_version("1.2.4-beta.9", "prerelease").as_deref(), Some("1.2.4-beta.10"));
    }

    #[test]
    fn next_release_versions() {
        assert_eq!(next_version("1.2.3", "patch").as_deref(), Some("1.2.4"));
        assert_eq!(next_version("1.2.4-2", "patch").as_deref(), Some("1.2.4"));
        assert_eq!(next_version("1.2.3", "minor").as_deref(), Some("1.3.0"));
        assert_eq!(next_version("1.3.0-1", "minor").as_deref(), Some("1.3.0"));
        assert_eq!(next_version("1.2.3", "major").as_deref(), Some("2.0.0"));
        assert_eq!(next_version("2.0.0-5", "major").as_deref(), Some("2.0.0"));
    }

    #[test]
    fn next_version_rejects_unknown_input() {
        assert_eq!(next_version("1.2", "patch"), None);
        assert_eq!(next_version("1.2.3", "sideways"), None);
    }

    #[test]
    fn current_version_reads_manifest() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version":"0.9.1-4"}"#).unwrap();
        assert_eq!(current_version(dir.path()).unwrap(), "0.9.1-4");
    }

    #[test]
    fn current_version_errors_are_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");

        std::fs::write(&path, r#"{"name":"x"}"#).unwrap();
        let err = current_version(dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
        assert_eq!(err.details["field"], "version");

        std::fs::write(&path, r#"{"version":"banana"}"#).unwrap();
        assert_eq!(current_version(dir.path()).unwrap_err().code, ErrorCode::InvalidConfig);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(current_version(dir.path()).unwrap_err().code, ErrorCode::InvalidConfig);
    }

    /// Writes a bumped version into package.json when it sees `npm version`.
    struct FakeNpm {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for FakeNpm {
        fn run(&self, command: &str, cwd: &Path, _silent: bool) -> Result<ExecutionResult> {
            self.calls.borrow_mut().push(command.to_string());
            if self.fail_on.is_some_and(|f| command.starts_with(f)) {
                return Ok(ExecutionResult {
                    exit_code: 1,
                    stderr: "rejected".to_string(),
                    ..Default::default()
                });
            }
            if command.starts_with("npm version") {
                std::fs::write(cwd.join("package.json"), r#"{"version":"1.0.1-0"}"#).unwrap();
            }
            Ok(ExecutionResult::default())
        }
    }

    #[test]
    fn bump_version_pushes_branch_then_tag() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version":"1.0.0"}"#).unwrap();
        let settings = PipelineSettings::default();
        let runner = FakeNpm {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        };

        let driver = BuildDriver::new(&runner, &settings, true);
        let version = driver.bump_version(dir.path(), "feature/x").unwrap();

        assert_eq!(version, "1.0.1-0");
        assert_eq!(
            *runner.calls.borrow(),
            vec![
                "npm version prerelease",
                "git push origin feature/x",
                "git push origin v1.0.1-0",
            ]
        );
    }

    #[test]
    fn failed_push_keeps_local_bump() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version":"1.0.0"}"#).unwrap();
        let settings = PipelineSettings::default();
        let runner = FakeNpm {
            calls: RefCell::new(Vec::new()),
            fail_on: Some("git push"),
        };

        let driver = BuildDriver::new(&runner, &settings, true);
        let err = driver.bump_version(dir.path(), "feature/x").unwrap_err();

        assert_eq!(err.code, ErrorCode::ShellCommandFail);
        assert_eq!(current_version(dir.path()).unwrap(), "1.0.1-0");
    }

    #[test]
    fn build_command_uses_stage_suffix() {
        let settings = PipelineSettings::default();
        let runner = FakeNpm {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        };
        let driver = BuildDriver::new(&runner, &settings, true);
        assert_eq!(driver.build_command("production"), "npm run build-production");
        assert_eq!(driver.build_command("release/2.0"), "npm run build-release/2.0");
        assert_eq!(driver.dependent_commit_message("1.2.0-1"), "Update client to 1.2.0-1");
    }
}
