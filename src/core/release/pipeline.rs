use std::path::Path;

use chrono::Utc;

use crate::defaults::PipelineSettings;
use crate::error::{Error, Result};
use crate::git;
use crate::manifest;
use crate::progress::Progress;
use crate::project::Project;
use crate::shell::CommandRunner;
use crate::version::{self, BuildDriver};

use super::gates;
use super::types::{
    Gate, GateRecord, PairStatus, PlannedCommand, ReleaseOptions, ReleaseRun, RepositoryReport,
    RepositoryRole, RepositoryStatus, Stage,
};

/// Drives a client/server pair through the release gates.
///
/// Gates run strictly in order and the first failure ends the run. Nothing
/// mutating happens until both repositories have passed every read-only
/// gate. Earlier mutations are never rolled back.
pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a PipelineSettings,
}

/// Passed gates, recorded as they succeed.
#[derive(Default)]
struct GateLog {
    records: Vec<GateRecord>,
}

impl GateLog {
    fn pass<T>(
        &mut self,
        progress: &mut dyn Progress,
        gate: Gate,
        repository: Option<RepositoryRole>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let name = match repository {
            Some(role) => format!("{} ({})", gate, role),
            None => gate.to_string(),
        };

        progress.report_start(&name);
        match f() {
            Ok(value) => {
                progress.report_success(&name);
                self.records.push(GateRecord { gate, repository });
                Ok(value)
            }
            Err(err) => {
                progress.report_failure(&name, &err);
                Err(err)
            }
        }
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a PipelineSettings) -> Self {
        Self { runner, settings }
    }

    pub fn run(
        &self,
        project: &Project,
        options: &ReleaseOptions,
        progress: &mut dyn Progress,
    ) -> Result<ReleaseRun> {
        let started_at = Utc::now().to_rfc3339();
        let stage = Stage::parse(&options.stage)?;
        let reference = gates::resolve_drift_reference(
            options.reference.as_deref(),
            project.drift_reference.as_deref(),
            &stage,
        )?;
        let driver = BuildDriver::new(self.runner, self.settings, options.silent);
        let mut log = GateLog::default();

        let pair = log.pass(progress, Gate::ConfigValidated, None, || {
            project.repository_pair()
        })?;

        log.pass(progress, Gate::Fetched, None, || {
            self.fetch(&pair.client, &stage, options.silent)?;
            self.fetch(&pair.server, &stage, options.silent)
        })?;

        let client_branch = log.pass(progress, Gate::BranchGated, Some(RepositoryRole::Client), || {
            self.branch_gate(project, &pair.client)
        })?;
        let server_branch = log.pass(progress, Gate::BranchGated, Some(RepositoryRole::Server), || {
            self.branch_gate(project, &pair.server)
        })?;

        let client_drift = log.pass(progress, Gate::DriftGated, Some(RepositoryRole::Client), || {
            self.drift_gate(&pair.client, &reference)
        })?;
        let server_drift = log.pass(progress, Gate::DriftGated, Some(RepositoryRole::Server), || {
            self.drift_gate(&pair.server, &reference)
        })?;

        let mut client = report(&pair.client, &client_branch, &client_drift);
        let mut server = report(&pair.server, &server_branch, &server_drift);
        let mut planned = Vec::new();

        if options.dry_run {
            if options.release {
                client.version = Some(version::current_version(&pair.client)?);
                server.version = Some(version::current_version(&pair.server)?);
                client.new_version = predict(&client, self.settings);
                server.new_version = predict(&server, self.settings);
            }
            planned = self.plan(&driver, &stage, options, &client, &server);
        } else {
            log.pass(progress, Gate::Tested, Some(RepositoryRole::Client), || {
                driver.test(&pair.client)
            })?;
            log.pass(progress, Gate::Tested, Some(RepositoryRole::Server), || {
                driver.test(&pair.server)
            })?;

            log.pass(progress, Gate::Built, Some(RepositoryRole::Client), || {
                driver.build(&pair.client, stage.as_str())
            })?;

            if options.release {
                let (old_client, new_client) =
                    log.pass(progress, Gate::Released, Some(RepositoryRole::Client), || {
                        let current = version::current_version(&pair.client)?;
                        Ok((current, driver.bump_version(&pair.client, &client_branch)?))
                    })?;
                client.version = Some(old_client);
                client.new_version = Some(new_client.clone());

                let (old_server, new_server) =
                    log.pass(progress, Gate::Released, Some(RepositoryRole::Server), || {
                        let current = version::current_version(&pair.server)?;
                        let released = self.release_server(
                            &driver,
                            &pair.server,
                            &server_branch,
                            &new_client,
                            options.silent,
                        )?;
                        Ok((current, released))
                    })?;
                server.version = Some(old_server);
                server.new_version = Some(new_server);
            }
        }

        Ok(ReleaseRun {
            project: project.id.clone(),
            stage,
            drift_reference: reference,
            dry_run: options.dry_run,
            release: options.release,
            gates: log.records,
            client,
            server,
            planned,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        })
    }

    /// Read-only snapshot of both repositories. No fetch, no gates.
    pub fn status(&self, project: &Project, stage: Option<&str>) -> Result<PairStatus> {
        let reference = match stage {
            Some(stage) => gates::resolve_drift_reference(
                None,
                project.drift_reference.as_deref(),
                &Stage::parse(stage)?,
            )?,
            None => match project.drift_reference.as_deref() {
                Some(reference) => reference.to_string(),
                None => {
                    return Err(Error::invalid_arguments(
                        "stage",
                        format!(
                            "Project '{}' has no drift reference; pass a stage to compare against",
                            project.id
                        ),
                    )
                    .with_hint(format!("pairship status {} <STAGE>", project.id)))
                }
            },
        };

        let pair = project.repository_pair()?;
        Ok(PairStatus {
            project: project.id.clone(),
            client: self.repository_status(project, &pair.client, &reference)?,
            server: self.repository_status(project, &pair.server, &reference)?,
            drift_reference: reference,
        })
    }

    fn fetch(&self, path: &Path, stage: &Stage, silent: bool) -> Result<()> {
        git::fetch_all(self.runner, path, silent)?;
        if self.settings.pull_stage {
            git::pull(
                self.runner,
                path,
                self.settings.push_remote(),
                stage.as_str(),
                silent,
            )?;
        }
        Ok(())
    }

    fn branch_gate(&self, project: &Project, path: &Path) -> Result<String> {
        gates::check_clean(path, git::is_clean(self.runner, path)?)?;

        let branch = git::current_branch(self.runner, path)?;
        let protected = gates::resolve_protected_branches(
            manifest::protected_branches_override(path)?,
            project.protected_branches.as_deref(),
            self.settings,
        );
        gates::check_unprotected(path, &branch, &protected)?;
        Ok(branch)
    }

    fn drift_gate(&self, path: &Path, reference: &str) -> Result<Drift> {
        let reference =
            git::resolve_reference(self.runner, path, self.settings.tracking_remote(), reference)?;
        let (behind, ahead) = git::behind_ahead(self.runner, path, &reference)?;
        gates::check_drift(path, &reference, behind, ahead)?;
        Ok(Drift {
            reference,
            behind,
            ahead,
        })
    }

    /// Commit the new client version into the server if the build touched
    /// it, push, then release the server itself.
    fn release_server(
        &self,
        driver: &BuildDriver,
        path: &Path,
        branch: &str,
        client_version: &str,
        silent: bool,
    ) -> Result<String> {
        if git::is_clean(self.runner, path)? {
            log_status!("release", "Nothing to commit in {}", path.display());
        } else {
            driver.commit_dependent_version(path, branch, client_version)?;
        }
        git::push_branch(self.runner, path, self.settings.push_remote(), branch, silent)?;
        driver.bump_version(path, branch)
    }

    fn repository_status(
        &self,
        project: &Project,
        path: &Path,
        reference: &str,
    ) -> Result<RepositoryStatus> {
        let reference =
            git::resolve_reference(self.runner, path, self.settings.tracking_remote(), reference)?;
        let state = git::snapshot(self.runner, path, &reference)?;
        let protected = gates::resolve_protected_branches(
            manifest::protected_branches_override(path)?,
            project.protected_branches.as_deref(),
            self.settings,
        );
        let version = manifest::read(path)?.and_then(|m| m.version);

        Ok(RepositoryStatus {
            path: path.display().to_string(),
            drift_reference: reference,
            protected_branch: protected.contains(&state.current_branch),
            state,
            version,
        })
    }

    fn plan(
        &self,
        driver: &BuildDriver,
        stage: &Stage,
        options: &ReleaseOptions,
        client: &RepositoryReport,
        server: &RepositoryReport,
    ) -> Vec<PlannedCommand> {
        use RepositoryRole::{Client, Server};

        let mut planned = vec![
            planned_command(Gate::Tested, Client, driver.test_command()),
            planned_command(Gate::Tested, Server, driver.test_command()),
            planned_command(Gate::Built, Client, driver.build_command(stage.as_str())),
        ];

        if !options.release {
            return planned;
        }

        let remote = self.settings.push_remote();
        let client_branch = client.branch.as_deref().unwrap_or_default();
        let server_branch = server.branch.as_deref().unwrap_or_default();
        let client_tag = tag_for(client);
        let server_tag = tag_for(server);
        let client_version = client
            .new_version
            .as_deref()
            .unwrap_or("<new client version>");

        planned.extend([
            planned_command(Gate::Released, Client, driver.version_command()),
            planned_command(Gate::Released, Client, push(remote, client_branch)),
            planned_command(Gate::Released, Client, push(remote, &client_tag)),
            PlannedCommand {
                condition: Some("server working tree has changes".to_string()),
                ..planned_command(Gate::Released, Server, git::git_command(&["add", "-A"]))
            },
            PlannedCommand {
                condition: Some("server working tree has changes".to_string()),
                ..planned_command(
                    Gate::Released,
                    Server,
                    git::git_command(&["commit", "-m", &driver.dependent_commit_message(client_version)]),
                )
            },
            planned_command(Gate::Released, Server, push(remote, server_branch)),
            planned_command(Gate::Released, Server, driver.version_command()),
            planned_command(Gate::Released, Server, push(remote, server_branch)),
            planned_command(Gate::Released, Server, push(remote, &server_tag)),
        ]);

        planned
    }
}

/// Outcome of the drift gate for one repository.
struct Drift {
    reference: String,
    behind: u32,
    ahead: u32,
}

fn report(path: &Path, branch: &str, drift: &Drift) -> RepositoryReport {
    RepositoryReport {
        path: path.display().to_string(),
        branch: Some(branch.to_string()),
        drift_reference: Some(drift.reference.clone()),
        behind_count: Some(drift.behind),
        ahead_count: Some(drift.ahead),
        ..Default::default()
    }
}

fn predict(report: &RepositoryReport, settings: &PipelineSettings) -> Option<String> {
    report
        .version
        .as_deref()
        .and_then(|v| version::next_version(v, &settings.version_increment))
}

fn tag_for(report: &RepositoryReport) -> String {
    match report.new_version.as_deref() {
        Some(version) => format!("v{}", version),
        None => "v<new version>".to_string(),
    }
}

fn push(remote: &str, target: &str) -> String {
    git::git_command(&["push", remote, target])
}

fn planned_command(gate: Gate, repository: RepositoryRole, command: String) -> PlannedCommand {
    PlannedCommand {
        gate,
        repository,
        command,
        condition: None,
    }
}
