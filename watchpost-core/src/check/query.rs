//! Tabular-query freshness check
//!
//! Connects to the entry host, hops to the database host over a nested
//! SSH session, runs the configured SQL under non-interactive sudo, and
//! measures how stale the newest row is against the remote host's own
//! clock. Data older than the threshold is WARN; a failed command is FAIL.

use std::time::Duration;

use chrono::Local;

use super::{ExecState, RawArtifact, RawSink, round2};
use crate::classify::{QUERY_MAX_AGE_MINUTES, classify_query};
use crate::error::HarnessResult;
use crate::model::{CheckResult, Details, Metrics, Status};
use crate::parse::{TableSpec, extract_remote_now, newest_timestamp, parse_table};
use crate::registry::{QueryParams, ServerProfile};
use crate::sanitize::BannerFilter;
use crate::ssh::{ExecRequest, Timeouts, Transport, jump_exec, shell_quote, sudo_bash_login};

/// The query traverses two hosts and a database; give it a generous
/// wall-clock budget
const TOTAL_BUDGET: Duration = Duration::from_secs(120);

/// A hung jump hop already burns the full budget once; do not retry
const MAX_ATTEMPTS: u32 = 1;

/// Runs the query check against one server
pub fn run(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &QueryParams,
    sink: &RawSink,
) -> CheckResult {
    let mut exec = ExecState::new();
    match run_inner(name, transport, server_key, server, params, sink, &mut exec) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(check = name, error = %err, "query check failed");
            let stderr = format!("{}\nEXCEPTION: {err}", exec.stderr);
            let raw_file = sink.persist(&RawArtifact {
                check: name,
                host: &server.host,
                user: &server.user,
                jump_target: Some(&params.jump_target),
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

#[allow(clippy::too_many_lines)]
fn run_inner(
    name: &str,
    transport: &dyn Transport,
    server_key: &str,
    server: &ServerProfile,
    params: &QueryParams,
    sink: &RawSink,
    exec: &mut ExecState,
) -> HarnessResult<CheckResult> {
    let filter = BannerFilter::with_extra_patterns(&params.extra_banner_patterns)?;
    let credential = server.credential(server_key)?;

    // The remote prints its own clock first so freshness is measured
    // against the database host's time, not the harness's.
    let inner = format!(
        "date '+NOW_LOCAL=%Y-%m-%d %H:%M:%S'; psql {} {} -c {}",
        params.database,
        params.db_user,
        shell_quote(&params.sql)
    );
    let command = jump_exec(&params.jump_target, &sudo_bash_login(&inner));

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
    exec.stdout = filter.filter(&outcome.stdout);
    exec.stderr = filter.filter(&outcome.stderr);

    let raw_file = sink.persist(&RawArtifact {
        check: name,
        host: &server.host,
        user: &server.user,
        jump_target: Some(&params.jump_target),
        namespace: None,
        exit_code: outcome.exit_code,
        stdout: &exec.stdout,
        stderr: &exec.stderr,
        exception: None,
    });

    if outcome.exit_code != 0 {
        return Ok(CheckResult::failure(
            name,
            format!(
                "remote command failed (exit_code={}); see raw artifact",
                outcome.exit_code
            ),
            outcome.exit_code,
            raw_file,
        ));
    }

    let spec = TableSpec {
        columns: params.columns.clone(),
    };
    let parse = parse_table(&exec.stdout, &spec);
    let now = extract_remote_now(&exec.stdout).unwrap_or_else(|| Local::now().naive_local());
    let newest = newest_timestamp(&parse.rows);

    let mut details = Details::new();
    details.insert(
        "rows".into(),
        serde_json::to_value(&parse.rows).unwrap_or_default(),
    );
    details.insert("dropped_rows".into(), parse.dropped_rows.into());
    details.insert("raw_exit_code".into(), outcome.exit_code.into());

    let mut metrics = Metrics::new();

    let status = match newest {
        None => {
            // Degraded, not broken: return whatever rows we did get.
            metrics.insert("newest_age_minutes".into(), None);
            details.insert(
                "message".into(),
                "could not compute newest_age_minutes (no parseable maxvalue rows)".into(),
            );
            Status::Warn
        }
        Some(newest) => {
            let age_minutes = round2((now - newest).num_milliseconds() as f64 / 60_000.0);
            metrics.insert("newest_age_minutes".into(), Some(age_minutes));
            details.insert(
                "now_local".into(),
                now.format("%Y-%m-%d %H:%M:%S").to_string().into(),
            );
            details.insert(
                "newest_value".into(),
                newest.format("%Y-%m-%d %H:%M:%S").to_string().into(),
            );
            details.insert("threshold_minutes".into(), QUERY_MAX_AGE_MINUTES.into());
            classify_query(outcome.exit_code, Some(age_minutes))
        }
    };

    Ok(CheckResult {
        name: name.to_string(),
        status,
        metrics,
        details,
        raw_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SshError, SshResult};
    use crate::model::RemoteExecOutcome;
    use std::sync::Mutex;

    struct ScriptedTransport {
        outcome: Mutex<Option<SshResult<RemoteExecOutcome>>>,
    }

    impl ScriptedTransport {
        fn ok(stdout: &str, exit_code: i32) -> Self {
            Self {
                outcome: Mutex::new(Some(Ok(RemoteExecOutcome {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code,
                }))),
            }
        }

        fn failing() -> Self {
            Self {
                outcome: Mutex::new(Some(Err(SshError::Resolve {
                    host: "db-entry".into(),
                    port: 22,
                }))),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, _request: &ExecRequest) -> SshResult<RemoteExecOutcome> {
            self.outcome
                .lock()
                .expect("poisoned")
                .take()
                .expect("transport called more than once")
        }
    }

    fn server() -> ServerProfile {
        ServerProfile {
            label: "entry".into(),
            host: "10.92.180.98".into(),
            port: 22,
            user: "cloud-user".into(),
            key_path: None,
            password: Some("pw".into()),
            password_env: None,
        }
    }

    fn params() -> QueryParams {
        QueryParams {
            jump_target: "ciap01".into(),
            sql: "SELECT 1;".into(),
            database: "sai".into(),
            db_user: "sairepo".into(),
            columns: ["jobid".into(), "maxvalue".into(), "region_id".into()],
            extra_banner_patterns: Vec::new(),
        }
    }

    fn sink() -> (tempfile::TempDir, RawSink) {
        let tmp = tempfile::tempdir().unwrap();
        let sink = RawSink::new(tmp.path().join("raw"));
        (tmp, sink)
    }

    const FRESH_OUTPUT: &str = "\
Last login: Tue Aug 12 09:11:02 2025
NOW_LOCAL=2025-08-12 10:30:00
 jobid | maxvalue | region_id
-------+---------------------+-----------
 job_a | 2025-08-12 10:20:00 | EMEA
 job_b | 2025-08-12 10:25:00 | APAC
(2 rows)
";

    #[test]
    fn test_fresh_data_is_ok_with_age_metric() {
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::ok(FRESH_OUTPUT, 0);
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);

        assert_eq!(result.status, Status::Ok);
        // Age measured against NOW_LOCAL, not the harness clock: 5 minutes.
        assert_eq!(result.metrics["newest_age_minutes"], Some(5.0));
        assert_eq!(
            result.details["newest_value"].as_str(),
            Some("2025-08-12 10:25:00")
        );
        assert_eq!(result.details["rows"].as_array().map(Vec::len), Some(2));
        assert_eq!(result.details["dropped_rows"].as_u64(), Some(0));
        assert!(result.raw_file.is_some());
    }

    #[test]
    fn test_stale_data_is_warn() {
        let stale = FRESH_OUTPUT.replace("NOW_LOCAL=2025-08-12 10:30:00", "NOW_LOCAL=2025-08-12 11:30:00");
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::ok(&stale, 0);
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);
        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.metrics["newest_age_minutes"], Some(65.0));
    }

    #[test]
    fn test_unparseable_table_is_warn_with_null_metric() {
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::ok("NOW_LOCAL=2025-08-12 10:30:00\nno table", 0);
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);

        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.metrics["newest_age_minutes"], None);
        assert!(result.details.contains_key("message"));
        assert!(result.raw_file.is_some());
    }

    #[test]
    fn test_nonzero_exit_is_fail_despite_parseable_output() {
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::ok(FRESH_OUTPUT, 1);
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);

        assert_eq!(result.status, Status::Fail);
        assert!(result.details["error"]
            .as_str()
            .unwrap()
            .contains("exit_code=1"));
        assert!(result.raw_file.is_some());
    }

    #[test]
    fn test_transport_failure_is_fail_with_artifact() {
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::failing();
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);

        assert_eq!(result.status, Status::Fail);
        assert!(result.details.contains_key("error"));
        assert_eq!(result.details["raw_exit_code"].as_i64(), Some(255));
        let raw = result.raw_file.expect("failure path still writes raw");
        let text = std::fs::read_to_string(raw).unwrap();
        assert!(text.contains("EXCEPTION"));
    }

    #[test]
    fn test_banner_lines_never_reach_the_artifact() {
        let (_tmp, sink) = sink();
        let transport = ScriptedTransport::ok(FRESH_OUTPUT, 0);
        let result = run("boundary", &transport, "db", &server(), &params(), &sink);
        let text = std::fs::read_to_string(result.raw_file.unwrap()).unwrap();
        assert!(!text.contains("Last login"));
        assert!(text.contains("NOW_LOCAL=2025-08-12 10:30:00"));
    }
}
