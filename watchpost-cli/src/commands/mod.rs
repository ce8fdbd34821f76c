//! Command handler modules for the CLI.

mod list;
mod run;
mod validate;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
///
/// Returns the process exit code on success; for `run` that is the
/// snapshot's worst status rank.
pub fn dispatch(cli: &Cli) -> Result<i32, CliError> {
    match cli.command {
        Commands::Run => run::cmd_run(cli),
        Commands::List => list::cmd_list(cli),
        Commands::Validate => validate::cmd_validate(cli),
    }
}
