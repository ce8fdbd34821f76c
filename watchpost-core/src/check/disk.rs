//! Disk-usage check
//!
//! Runs `uptime ; df -h` on the target host and grades the configured
//! mount point's use percentage: 100% is FAIL, 90% and above is WARN.
//! A mount missing from the listing is FAIL, reported with a `-1`
//! sentinel metric so dashboards can tell "absent" from "full".

use std::time::Duration;

use super::{ExecState, RawArtifact, RawSink};
use crate::classify::classify_disk;
use crate::error::HarnessResult;
use crate::model::{CheckResult, Details, Metrics};
use crate::parse::parse_mount_usage;
use crate::registry::{DiskParams, ServerProfile};
use crate::ssh::{ExecRequest, Timeouts, Transport, bash_login};

const TOTAL_BUDGET: Duration = Duration::from_secs(60);

const MAX_ATTEMPTS: u32 = 2;

/// Runs the disk-usage check against one server
pub fn run(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &DiskParams,
    sink: &RawSink,
) -> CheckResult {
    let mut exec = ExecState::new();
    match run_inner(name, transport, server_key, server, params, sink, &mut exec) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(check = name, error = %err, "disk check failed");
            let stderr = format!("{}\nEXCEPTION: {err}", exec.stderr);
            let raw_file = sink.persist(&RawArtifact {
                check: name,
                host: &server.host,
                user: &server.user,
                jump_target: None,
                namespace: None,
                exit_code: exec.exit_code,
                stdout: &exec.stdout,
                stderr: &stderr,
                exception: Some(&err.to_string()),
            });
            CheckResult::failure(name, err, exec.exit_code, raw_file)
        }
    }
}

fn run_inner(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &DiskParams,
    sink: &RawSink,
    exec: &mut ExecState,
) -> HarnessResult<CheckResult> {
    let credential = server.credential(server_key)?;
    let command = bash_login("uptime ; df -h");

    let request = ExecRequest {
        host: server.host.clone(),
        port: server.port,
        user: server.user.clone(),
        auth: credential,
        command,
        timeouts: Timeouts::with_total(TOTAL_BUDGET),
        max_attempts: MAX_ATTEMPTS,
        backoff_unit: Duration::from_secs(1),
    };

    let outcome = transport.execute(&request)?;
    exec.exit_code = outcome.exit_code;
    exec.stdout.clone_from(&outcome.stdout);
    exec.stderr.clone_from(&outcome.stderr);

    let raw_file = sink.persist(&RawArtifact {
        check: name,
        host: &server.host,
        user: &server.user,
        jump_target: None,
        namespace: None,
        exit_code: outcome.exit_code,
        stdout: &outcome.stdout,
        stderr: &outcome.stderr,
        exception: None,
    });

    let usage = parse_mount_usage(&outcome.stdout, &params.mount);
    let status = classify_disk(usage.as_ref());

    let mut metrics = Metrics::new();
    let mut details = Details::new();
    details.insert("mount".into(), params.mount.clone().into());
    details.insert("raw_exit_code".into(), outcome.exit_code.into());

    match &usage {
        None => {
            metrics.insert("use_percent".into(), Some(-1.0));
            details.insert(
                "error".into(),
                format!("mount {} not found in df output", params.mount).into(),
            );
        }
        Some(found) => {
            metrics.insert("use_percent".into(), Some(f64::from(found.use_percent)));
            details.insert("filesystem".into(), found.filesystem.clone().into());
            details.insert("size".into(), found.size.clone().into());
            details.insert("used".into(), found.used.clone().into());
            details.insert("avail".into(), found.avail.clone().into());
        }
    }

    Ok(CheckResult {
        name: name.to_string(),
        status,
        metrics,
        details,
        raw_file,
    })
}
