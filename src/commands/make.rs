use clap::{Args, Parser};

use pairship::defaults;
use pairship::progress::TerminalProgress;
use pairship::project;
use pairship::release::{Pipeline, ReleaseOptions, ReleaseRun};
use pairship::shell::LocalShell;
use pairship::{log_status, Error};

use super::CmdResult;

#[derive(Args, Debug, Default)]
pub struct MakeArgs {
    /// Project ID
    #[arg(value_name = "PROJECT")]
    pub project: Option<String>,

    /// Stage to build and measure drift against (e.g. development, production)
    #[arg(value_name = "STAGE")]
    pub stage: Option<String>,

    /// Project ID (alternative to the positional argument)
    #[arg(long = "project", value_name = "PROJECT", conflicts_with = "project")]
    pub project_flag: Option<String>,

    /// Stage (alternative to the positional argument)
    #[arg(long = "stage", value_name = "STAGE", conflicts_with = "stage")]
    pub stage_flag: Option<String>,

    /// Bump, commit and push versions after a successful build
    #[arg(long)]
    pub release: bool,

    /// Run the read-only gates and print the commands that would follow
    #[arg(long)]
    pub dry_run: bool,

    /// Capture command output instead of echoing it
    #[arg(long)]
    pub silent: bool,

    /// Branch or tag to measure drift against, overriding the project setting
    #[arg(long, value_name = "REF")]
    pub reference: Option<String>,
}

/// `pairship <PROJECT> <STAGE> [flags]`, parsed with the same flags as `make`.
#[derive(Parser, Debug)]
#[command(name = "pairship", no_binary_name = true)]
struct Shorthand {
    #[command(flatten)]
    make: MakeArgs,
}

pub fn run(args: MakeArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReleaseRun> {
    let project_id = args.project_flag.or(args.project).ok_or_else(|| {
        Error::invalid_arguments("project", "Missing required argument: project")
            .with_hint("pairship make <PROJECT> <STAGE>")
    })?;
    let stage = args.stage_flag.or(args.stage).ok_or_else(|| {
        Error::invalid_arguments("stage", "Missing required argument: stage")
            .with_hint(format!("pairship make {} <STAGE>", project_id))
    })?;

    let options = ReleaseOptions {
        stage,
        reference: args.reference,
        release: args.release,
        dry_run: args.dry_run,
        silent: args.silent,
    };

    let project = project::load(&project_id)?;
    let settings = defaults::load_settings()?;
    let runner = LocalShell::new();
    let mut progress = TerminalProgress;

    log_status!("make", "{} -> {}", project_id, options.stage);
    let run = Pipeline::new(&runner, &settings).run(&project, &options, &mut progress)?;
    Ok((run, 0))
}

/// Treat an unrecognized first word as a project name.
pub fn run_shorthand(
    words: Vec<String>,
    global: &crate::commands::GlobalArgs,
) -> CmdResult<ReleaseRun> {
    let args = parse_shorthand(words)?;
    run(args, global)
}

fn parse_shorthand(words: Vec<String>) -> pairship::Result<MakeArgs> {
    let first = words.first().cloned().unwrap_or_default();
    if !project::exists(&first) {
        return Err(Error::invalid_command(&first, project::find_similar(&first)));
    }

    Shorthand::try_parse_from(words)
        .map(|s| s.make)
        .map_err(|e| Error::invalid_arguments("arguments", crate::clap_message(&e)))
}
