use clap::Args;

use pairship::defaults;
use pairship::project;
use pairship::release::{PairStatus, Pipeline};
use pairship::shell::LocalShell;

use super::CmdResult;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project ID
    pub project: String,

    /// Stage to measure drift against (defaults to the project's drift reference)
    pub stage: Option<String>,
}

pub fn run(args: StatusArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PairStatus> {
    let project = project::load(&args.project)?;
    let settings = defaults::load_settings()?;
    let runner = LocalShell::new();

    let status = Pipeline::new(&runner, &settings).status(&project, args.stage.as_deref())?;
    Ok((status, 0))
}
