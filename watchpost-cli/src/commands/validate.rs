//! `validate` command: parse the registry and cross-check references.

use watchpost_core::registry::Registry;

use crate::cli::Cli;
use crate::error::{CliError, exit_codes};

/// Validates the registry file without connecting anywhere
///
/// Beyond parsing, this verifies that every check references a defined
/// server and that each server's credentials are resolvable, so a
/// scheduled run cannot fail on registry mistakes.
pub fn cmd_validate(cli: &Cli) -> Result<i32, CliError> {
    let registry = Registry::load(&cli.config)?;

    let mut problems = Vec::new();
    for check in &registry.checks {
        match registry.server(&check.server) {
            None => problems.push(format!(
                "check '{}' references undefined server '{}'",
                check.name, check.server
            )),
            Some(server) => {
                if let Err(e) = server.credential(&check.server) {
                    problems.push(format!("check '{}': {e}", check.name));
                }
            }
        }
    }

    if problems.is_empty() {
        println!(
            "{}: OK ({} servers, {} checks)",
            cli.config.display(),
            registry.servers.len(),
            registry.checks.len()
        );
        return Ok(exit_codes::OK);
    }

    for problem in &problems {
        eprintln!("{problem}");
    }
    Err(CliError::Registry(format!(
        "{} problem(s) found in {}",
        problems.len(),
        cli.config.display()
    )))
}
