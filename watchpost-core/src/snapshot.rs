//! Sequential check execution and snapshot aggregation
//!
//! The harness walks the registry's checks in declaration order, runs
//! each one to completion over the shared transport, and folds the
//! per-check statuses into a single worst-of global status. One check
//! crashing never stops the run; it becomes a FAIL entry and the walk
//! continues.

use std::time::Instant;

use chrono::Local;

use crate::check::{self, RawSink};
use crate::model::{CheckResult, Snapshot, SnapshotEntry, Status};
use crate::registry::{CheckKind, CheckSpec, Registry};
use crate::ssh::Transport;

/// Runs every registered check over one transport and aggregates the
/// results into a [`Snapshot`]
pub struct Harness<'a> {
    registry: &'a Registry,
    transport: &'a dyn Transport,
    raw_sink: RawSink,
}

impl<'a> Harness<'a> {
    /// Creates a harness over an existing registry and transport
    #[must_use]
    pub fn new(registry: &'a Registry, transport: &'a dyn Transport, raw_sink: RawSink) -> Self {
        Self {
            registry,
            transport,
            raw_sink,
        }
    }

    /// Runs all checks sequentially, in registry declaration order
    #[must_use]
    pub fn run_all(&self) -> Snapshot {
        tracing::info!(checks = self.registry.checks.len(), "run started");
        let run_started = Instant::now();

        let mut results = Vec::with_capacity(self.registry.checks.len());
        for spec in &self.registry.checks {
            let started = Instant::now();
            let result = self.run_one(spec);
            let duration_sec = check::round2(started.elapsed().as_secs_f64());
            tracing::info!(
                check = %spec.name,
                status = %result.status,
                duration_sec,
                "check done"
            );
            results.push(Self::entry(spec, result, duration_sec));
        }

        let global_status = results
            .iter()
            .map(|r| r.status)
            .fold(Status::Ok, Status::worst);
        tracing::info!(
            global_status = %global_status,
            duration_sec = check::round2(run_started.elapsed().as_secs_f64()),
            "run finished"
        );

        Snapshot {
            timestamp: Local::now(),
            global_status,
            results,
        }
    }

    fn run_one(&self, spec: &CheckSpec) -> CheckResult {
        let Some(server) = self.registry.server(&spec.server) else {
            // Never dial on a registry mistake; record it and move on.
            tracing::error!(check = %spec.name, server = %spec.server, "server not registered");
            return CheckResult::failure(
                &spec.name,
                format!("server '{}' is not defined in the registry", spec.server),
                crate::model::EXIT_NEVER_RAN,
                None,
            );
        };

        match &spec.kind {
            CheckKind::Query(params) => check::query::run(
                &spec.name,
                self.transport,
                &spec.server,
                server,
                params,
                &self.raw_sink,
            ),
            CheckKind::Pods(params) => check::pods::run(
                &spec.name,
                self.transport,
                &spec.server,
                server,
                params,
                &self.raw_sink,
            ),
            CheckKind::Disk(params) => check::disk::run(
                &spec.name,
                self.transport,
                &spec.server,
                server,
                params,
                &self.raw_sink,
            ),
        }
    }

    fn entry(spec: &CheckSpec, result: CheckResult, duration_sec: f64) -> SnapshotEntry {
        let mut details = result.details;
        details.insert("duration_sec".into(), duration_sec.into());
        SnapshotEntry {
            name: result.name,
            check_type: spec.kind.type_name().to_string(),
            server: spec.server.clone(),
            status: result.status,
            metrics: result.metrics,
            details,
            raw_file: result.raw_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SshResult;
    use crate::model::RemoteExecOutcome;
    use crate::registry::Registry;
    use crate::ssh::ExecRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    impl Transport for CountingTransport {
        fn execute(&self, _request: &ExecRequest) -> SshResult<RemoteExecOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteExecOutcome {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    #[test]
    fn test_unknown_server_fails_without_dialing() {
        let registry: Registry = toml::from_str(
            r#"
            [[checks]]
            name = "orphan"
            server = "nowhere"
            type = "disk"
            "#,
        )
        .unwrap();
        let transport = CountingTransport {
            calls: AtomicUsize::new(0),
        };
        let tmp = tempfile::tempdir().unwrap();
        let harness = Harness::new(&registry, &transport, RawSink::new(tmp.path()));

        let snapshot = harness.run_all();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(snapshot.global_status, Status::Fail);
        assert_eq!(snapshot.exit_code(), 2);
        let entry = &snapshot.results[0];
        assert_eq!(entry.raw_file, None);
        assert!(entry.details["error"]
            .as_str()
            .unwrap()
            .contains("nowhere"));
        assert_eq!(entry.details["raw_exit_code"].as_i64(), Some(255));
    }

    #[test]
    fn test_empty_registry_produces_ok_snapshot() {
        let registry = Registry::default();
        let transport = CountingTransport {
            calls: AtomicUsize::new(0),
        };
        let tmp = tempfile::tempdir().unwrap();
        let harness = Harness::new(&registry, &transport, RawSink::new(tmp.path()));

        let snapshot = harness.run_all();
        assert_eq!(snapshot.global_status, Status::Ok);
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.exit_code(), 0);
    }
}
