//! `watchpost` CLI - SSH health-check harness
//!
//! Runs the registered query, pod, and disk checks over SSH, writes
//! per-check raw artifacts and an aggregated JSON snapshot, and exits
//! 0/1/2 for OK/WARN/FAIL.

mod cli;
mod commands;
mod error;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Commands};
use watchpost_core::logging::{self, LogOptions};

/// For `run`, log to a file under the output directory unless the user
/// chose one; offline commands log to stderr only by default.
fn default_log_file(cli: &Cli) -> Result<Option<PathBuf>, std::io::Error> {
    if let Some(path) = &cli.log_file {
        return Ok(Some(path.clone()));
    }
    if matches!(cli.command, Commands::Run) {
        let logs_dir = cli.output_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        return Ok(Some(logs_dir.join("watchpost.log")));
    }
    Ok(None)
}

fn main() {
    let cli = Cli::parse();

    let log_file = match default_log_file(&cli) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: cannot create log directory: {e}");
            std::process::exit(error::exit_codes::FAIL);
        }
    };
    let log_options = LogOptions {
        filter: cli.log_filter(),
        log_file,
    };
    if let Err(e) = logging::init(&log_options) {
        eprintln!("Error: {e}");
        std::process::exit(error::exit_codes::FAIL);
    }

    match commands::dispatch(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(e.exit_code());
        }
    }
}
