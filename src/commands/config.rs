use clap::Args;
use serde::Serialize;

use pairship::defaults::{self, PipelineSettings};
use pairship::project::{self, Project, ProjectUpdate};
use pairship::Error;

use super::CmdResult;

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Project to show or update (omit to show every project)
    pub project: Option<String>,

    /// Path to the client repository checkout
    #[arg(long, value_name = "PATH")]
    pub client: Option<String>,

    /// Path to the server repository checkout
    #[arg(long, value_name = "PATH")]
    pub server: Option<String>,

    /// Branch releases may not run from (repeatable, replaces the stored list)
    #[arg(long = "protected-branch", value_name = "BRANCH")]
    pub protected_branches: Vec<String>,

    /// Branch or tag to measure drift against instead of the stage
    #[arg(long, value_name = "REF")]
    pub drift_reference: Option<String>,
}

impl ConfigArgs {
    fn update(&self) -> ProjectUpdate {
        ProjectUpdate {
            client: self.client.clone(),
            server: self.server.clone(),
            protected_branches: if self.protected_branches.is_empty() {
                None
            } else {
                Some(self.protected_branches.clone())
            },
            drift_reference: self.drift_reference.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub id: String,
    #[serde(flatten)]
    pub project: Project,
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        Self {
            id: project.id.clone(),
            project,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    projects: Option<Vec<ProjectView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<PipelineSettings>,
}

pub fn run(args: ConfigArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    let update = args.update();

    let Some(id) = args.project else {
        if !update.is_empty() {
            return Err(Error::invalid_arguments(
                "project",
                "Missing required argument: project",
            )
            .with_hint("pairship config <PROJECT> --client <path> --server <path>"));
        }
        return show_all();
    };

    if update.is_empty() {
        return show(&id);
    }
    write(&id, update)
}

fn show_all() -> CmdResult<ConfigOutput> {
    let projects = project::list()?.into_iter().map(ProjectView::from).collect();
    Ok((
        ConfigOutput {
            command: "config.show",
            message: None,
            project: None,
            projects: Some(projects),
            settings: Some(defaults::load_settings()?),
        },
        0,
    ))
}

fn show(id: &str) -> CmdResult<ConfigOutput> {
    Ok((
        ConfigOutput {
            command: "config.show",
            message: None,
            project: Some(project::load(id)?.into()),
            projects: None,
            settings: None,
        },
        0,
    ))
}

fn write(id: &str, update: ProjectUpdate) -> CmdResult<ConfigOutput> {
    let saved = project::apply_update(id, update)?;
    let message = format!("{} settings written.", id);
    crate::tty::status(&message);

    Ok((
        ConfigOutput {
            command: "config.write",
            message: Some(message),
            project: Some(saved.into()),
            projects: None,
            settings: None,
        },
        0,
    ))
}
