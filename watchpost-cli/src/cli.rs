//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `watchpost` command-line interface for remote health checks
#[derive(Parser)]
#[command(name = "watchpost")]
#[command(author, version, about = "SSH health-check harness")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the registry TOML file
    #[arg(short, long, global = true, default_value = "watchpost.toml")]
    pub config: PathBuf,

    /// Directory receiving raw artifacts, snapshots, and logs
    #[arg(short, long, global = true, default_value = "output")]
    pub output_dir: PathBuf,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write log events to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run all registered checks and write a snapshot
    #[command(about = "Run every check in the registry and write snapshot_latest.json")]
    Run,

    /// List the registered servers and checks without connecting
    #[command(about = "List the servers and checks defined in the registry")]
    List,

    /// Validate the registry file
    #[command(about = "Parse the registry and verify that every check references a known server")]
    Validate,
}

impl Cli {
    /// Filter directives derived from the verbosity flags
    ///
    /// An explicit `RUST_LOG` is honored by leaving the filter unset.
    #[must_use]
    pub fn log_filter(&self) -> Option<String> {
        if std::env::var_os("RUST_LOG").is_some() {
            return None;
        }
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        Some(level.to_string())
    }
}
