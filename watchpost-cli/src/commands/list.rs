//! `list` command: print the registry contents without connecting.

use watchpost_core::registry::Registry;

use crate::cli::Cli;
use crate::error::{CliError, exit_codes};

/// Lists registered servers and checks
pub fn cmd_list(cli: &Cli) -> Result<i32, CliError> {
    let registry = Registry::load(&cli.config)?;

    println!("Servers:");
    for (key, server) in &registry.servers {
        println!(
            "  {key}: {} ({}@{}:{})",
            server.label, server.user, server.host, server.port
        );
    }

    println!("\nChecks:");
    for check in &registry.checks {
        println!(
            "  {} ({}) -> server {}",
            check.name,
            check.kind.type_name(),
            check.server
        );
    }

    Ok(exit_codes::OK)
}
