use anyhow::Result;

pub mod args;
pub mod commands;
pub mod exit_status;
pub mod report;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

use commands::{generate::generate, init::init};

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };

    match args.command {
        Some(Command::Generate(cmd)) => generate(cmd),
        Some(Command::Init) => init(),
        None => Ok(ExitStatus::Success),
    }
}
