//! `run` command: execute all checks and persist the snapshot.

use std::fs;
use std::path::PathBuf;

use watchpost_core::check::RawSink;
use watchpost_core::registry::Registry;
use watchpost_core::snapshot::Harness;
use watchpost_core::ssh::SshTransport;

use crate::cli::Cli;
use crate::error::CliError;

/// Runs every registered check and writes `snapshot_latest.json`
pub fn cmd_run(cli: &Cli) -> Result<i32, CliError> {
    let raw_dir = cli.output_dir.join("raw");
    let snapshot_dir = cli.output_dir.join("snapshots");
    fs::create_dir_all(&raw_dir)?;
    fs::create_dir_all(&snapshot_dir)?;

    let registry = Registry::load(&cli.config)?;
    let transport = SshTransport;
    let harness = Harness::new(&registry, &transport, RawSink::new(raw_dir));

    let snapshot = harness.run_all();

    let snapshot_path: PathBuf = snapshot_dir.join("snapshot_latest.json");
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&snapshot_path, json)?;
    tracing::info!(path = %snapshot_path.display(), "snapshot written");

    if !cli.quiet {
        println!("[+] Snapshot written: {}", snapshot_path.display());
        println!("[+] Global status   : {}\n", snapshot.global_status);
        for result in &snapshot.results {
            let metrics: Vec<String> = result
                .metrics
                .iter()
                .map(|(k, v)| match v {
                    Some(v) => format!("{k}={v}"),
                    None => format!("{k}=null"),
                })
                .collect();
            println!(
                "- {} [{}] -> {}  {}",
                result.name,
                result.server,
                result.status,
                metrics.join(" ")
            );
        }
    }

    Ok(snapshot.exit_code())
}
