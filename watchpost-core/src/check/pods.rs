//! Kubernetes pod health check
//!
//! Lists pods in a namespace via `kubectl` under sudo on the entry host,
//! then requires every matched pod to be `Running` with all containers
//! ready. The command exit code is deliberately ignored: `grep` finding
//! nothing is itself the signal (an empty pod list is FAIL).

use std::time::Duration;

use super::{ExecState, RawArtifact, RawSink};
use crate::classify::classify_pods;
use crate::error::HarnessResult;
use crate::model::{CheckResult, Details, Metrics};
use crate::parse::parse_pod_lines;
use crate::registry::{PodsParams, ServerProfile};
use crate::ssh::{ExecRequest, Timeouts, Transport, sudo_bash_login};

const TOTAL_BUDGET: Duration = Duration::from_secs(60);

/// kubectl hiccups are usually transient; one retry suffices
const MAX_ATTEMPTS: u32 = 2;

/// Runs the pod health check against one server
pub fn run(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &PodsParams,
    sink: &RawSink,
) -> CheckResult {
    let mut exec = ExecState::new();
    match run_inner(name, transport, server_key, server, params, sink, &mut exec) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(check = name, error = %err, "pods check failed");
            let stderr = format!("{}\nEXCEPTION: {err}", exec.stderr);
            let raw_file = sink.persist(&RawArtifact {
                check: name,
                host: &server.host,
                user: &server.user,
                jump_target: None,
                namespace: Some(&params.namespace),
                exit_code: exec.exit_code,
                stdout: &exec.stdout,
                stderr: &stderr,
                exception: Some(&err.to_string()),
            });
            CheckResult::failure(name, err, exec.exit_code, raw_file)
        }
    }
}

/// One compound remote script per check run; section markers keep the
/// raw artifact attributable to individual grep patterns.
fn build_remote_block(params: &PodsParams) -> String {
    let mut parts = vec![
        "date".to_string(),
        format!("echo \"NAMESPACE={}\"", params.namespace),
    ];
    for pattern in &params.grep_patterns {
        parts.push(format!("echo \"### GET_PODS grep={pattern}\""));
        parts.push(format!(
            "kubectl get pods -n {} | grep -i \"{}\" || echo \"(none)\"",
            params.namespace, pattern
        ));
    }
    parts.join(" ; ")
}

fn run_inner(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &PodsParams,
    sink: &RawSink,
    exec: &mut ExecState,
) -> HarnessResult<CheckResult> {
    let credential = server.credential(server_key)?;
    let command = sudo_bash_login(&build_remote_block(params));

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
        namespace: Some(&params.namespace),
        exit_code: outcome.exit_code,
        stdout: &outcome.stdout,
        stderr: &outcome.stderr,
        exception: None,
    });

    let pods = parse_pod_lines(&outcome.stdout);
    let not_running = pods.iter().filter(|p| p.phase != "Running").count();
    let not_ready = pods.iter().filter(|p| !p.ready_complete()).count();

    let mut metrics = Metrics::new();
    metrics.insert("pods_total".into(), Some(pods.len() as f64));
    metrics.insert("pods_not_running".into(), Some(not_running as f64));
    metrics.insert("pods_not_ready".into(), Some(not_ready as f64));

    let mut details = Details::new();
    details.insert("namespace".into(), params.namespace.clone().into());
    details.insert(
        "pods".into(),
        pods.iter()
            .map(|p| {
                serde_json::json!({
                    "pod": p.name,
                    "state": p.short(),
                })
            })
            .collect::<Vec<_>>()
            .into(),
    );
    details.insert("raw_exit_code".into(), outcome.exit_code.into());

    Ok(CheckResult {
        name: name.to_string(),
        status: classify_pods(&pods),
        metrics,
        details,
        raw_file,
    })
}
