use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, make, status};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pairship")]
#[command(version = VERSION)]
#[command(about = "Gate, test, build and release a paired client/server repository")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or update project configuration
    Config(config::ConfigArgs),
    /// Run the release pipeline for a project and stage
    Make(make::MakeArgs),
    /// Show repository state for a project without running any gate
    Status(status::StatusArgs),
    /// Shorthand for `make`: pairship <PROJECT> <STAGE>
    #[command(external_subcommand)]
    External(Vec<String>),
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                let err = pairship::Error::invalid_arguments("arguments", clap_message(&e));
                let exit_code = output::exit_code_for_error(err.code);
                report(output::print_result::<()>(Err(err)));
                return std::process::ExitCode::from(exit_code_to_u8(exit_code));
            }
        },
    };

    let global = GlobalArgs {};
    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    report(output::print_json_result(json_result));

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn clap_message(e: &clap::Error) -> String {
    e.to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

fn report(printed: pairship::Result<()>) {
    if let Err(err) = printed {
        eprintln!("{}", err);
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
