pub mod cli;

pub use cli::{help_text, parse_args, CliArgs, CliCommand};

use crate::runtime::{run_orchestrator, RunOptions};

/// CLI entry: parse, validate, run until interrupted. Errors are returned as
/// printable strings; the binary maps them to stderr and a non-zero exit.
pub fn run(args: Vec<String>) -> Result<(), String> {
    match parse_args(&args)? {
        CliCommand::Help => {
            println!("{}", help_text());
            Ok(())
        }
        CliCommand::Run(parsed) => {
            let options = RunOptions {
                dry_run: parsed.dry_run,
                log_to_file: parsed.log_to_file,
                skip_backlog: parsed.skip_backlog,
            };
            run_orchestrator(&parsed.store_root, options).map_err(|err| err.to_string())
        }
    }
}
