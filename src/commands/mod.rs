pub type CmdResult<T> = pairship::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod config;
pub mod make;
pub mod status;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (pairship::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Config(args) => dispatch!(args, global, config),
        crate::Commands::Status(args) => dispatch!(args, global, status),
        crate::Commands::Make(args) => {
            crate::tty::status("pairship is working...");
            dispatch!(args, global, make)
        }
        crate::Commands::External(words) => {
            crate::output::map_cmd_result_to_json(make::run_shorthand(words, global))
        }
    }
}
