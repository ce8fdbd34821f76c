//! Data models for check results and snapshots
//!
//! All types are serializable; field names and the status vocabulary
//! (`OK` / `WARN` / `FAIL`) are a compatibility contract with the
//! dashboard layer that consumes the snapshot JSON and must not change.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Sentinel exit code meaning the remote command never completed
pub const EXIT_NEVER_RAN: i32 = 255;

/// Health status of a single check or a whole run
///
/// Ordered by severity so `Ord::max` yields the worst status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    /// Check passed
    #[default]
    #[serde(rename = "OK")]
    Ok,
    /// Check degraded but not broken
    #[serde(rename = "WARN")]
    Warn,
    /// Check failed
    #[serde(rename = "FAIL")]
    Fail,
}

impl Status {
    /// Severity rank: OK=0, WARN=1, FAIL=2 (also the process exit code)
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warn => 1,
            Self::Fail => 2,
        }
    }

    /// Returns the worse of two statuses
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warn => write!(f, "WARN"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Numeric facts for trending, keyed by metric name
///
/// A `None` value serializes as JSON `null`, used when a metric exists in
/// the schema but could not be computed (e.g. unparseable query output).
pub type Metrics = BTreeMap<String, Option<f64>>;

/// Open, check-specific diagnostic context (documented per check type)
pub type Details = serde_json::Map<String, serde_json::Value>;

/// The uniform output of any check: exactly one per invocation
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Check identifier
    pub name: String,
    /// Classified status
    pub status: Status,
    /// Numeric facts for trending
    pub metrics: Metrics,
    /// Human/machine diagnostic context (may include parsed row lists)
    pub details: Details,
    /// Path to the persisted raw artifact; `None` only when persistence
    /// itself failed
    pub raw_file: Option<PathBuf>,
}

impl CheckResult {
    /// Builds a FAIL result carrying an error description and the last
    /// observed remote exit code
    #[must_use]
    pub fn failure(
        name: impl Into<String>,
        error: impl std::fmt::Display,
        exit_code: i32,
        raw_file: Option<PathBuf>,
    ) -> Self {
        let mut details = Details::new();
        details.insert("error".into(), error.to_string().into());
        details.insert("raw_exit_code".into(), exit_code.into());
        Self {
            name: name.into(),
            status: Status::Fail,
            metrics: Metrics::new(),
            details,
            raw_file,
        }
    }
}

/// Output of one remote command execution attempt
///
/// Created by the channel reader and consumed immediately by the calling
/// check runner; never persisted directly.
#[derive(Debug, Clone)]
pub struct RemoteExecOutcome {
    /// Accumulated standard output, lossily decoded
    pub stdout: String,
    /// Accumulated standard error, lossily decoded
    pub stderr: String,
    /// Remote exit status, or [`EXIT_NEVER_RAN`]
    pub exit_code: i32,
}

/// One row of the tabular query output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    /// Job identifier column
    #[serde(rename = "jobid")]
    pub job_id: String,
    /// High-water-mark timestamp column (`YYYY-MM-DD HH:MM:SS`)
    #[serde(rename = "maxvalue")]
    pub max_value: String,
    /// Region identifier column
    #[serde(rename = "region_id")]
    pub region_id: String,
}

/// One pod line from a `kubectl get pods` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodRow {
    /// Pod name
    pub name: String,
    /// Ready-count numerator (`a` in `a/b`)
    pub ready_current: u32,
    /// Ready-count denominator (`b` in `a/b`)
    pub ready_total: u32,
    /// Pod phase (e.g. `Running`, `CrashLoopBackOff`)
    pub phase: String,
    /// Restart count
    pub restarts: u32,
    /// Age column as printed by kubectl
    pub age: String,
}

impl PodRow {
    /// Whether every container in the pod is ready (`n/n`)
    #[must_use]
    pub const fn ready_complete(&self) -> bool {
        self.ready_current == self.ready_total
    }

    /// Compact `ready phase restarts age` summary used in details
    #[must_use]
    pub fn short(&self) -> String {
        format!(
            "{}/{} {} {} {}",
            self.ready_current, self.ready_total, self.phase, self.restarts, self.age
        )
    }
}

/// One `df -h` line for a specific mount point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountUsage {
    /// Device or filesystem name
    pub filesystem: String,
    /// Total size as printed by df (human units)
    pub size: String,
    /// Used space as printed by df
    pub used: String,
    /// Available space as printed by df
    pub avail: String,
    /// Use percentage (0–100)
    pub use_percent: u8,
    /// Mount point
    pub mount: String,
}

/// One check result inside a snapshot, tagged with its origin
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    /// Check identifier
    pub name: String,
    /// Check type (`query` / `pods` / `disk`)
    #[serde(rename = "type")]
    pub check_type: String,
    /// Registry key of the target server
    pub server: String,
    /// Classified status
    pub status: Status,
    /// Numeric facts
    pub metrics: Metrics,
    /// Diagnostic context
    pub details: Details,
    /// Raw artifact path
    pub raw_file: Option<PathBuf>,
}

/// The aggregated, timestamped result of one harness run
///
/// Immutable after creation; the only externally durable output of the
/// aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// When the aggregation completed
    pub timestamp: DateTime<Local>,
    /// Worst status across all results
    pub global_status: Status,
    /// Per-check results in declaration order
    pub results: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Process exit code for this snapshot: 0 = OK, 1 = WARN, 2 = FAIL
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.global_status.rank() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rank_ordering() {
        assert_eq!(Status::Ok.rank(), 0);
        assert_eq!(Status::Warn.rank(), 1);
        assert_eq!(Status::Fail.rank(), 2);
        assert!(Status::Ok < Status::Warn);
        assert!(Status::Warn < Status::Fail);
    }

    #[test]
    fn test_status_worst() {
        assert_eq!(Status::Ok.worst(Status::Warn), Status::Warn);
        assert_eq!(Status::Fail.worst(Status::Ok), Status::Fail);
        assert_eq!(Status::Ok.worst(Status::Ok), Status::Ok);
    }

    #[test]
    fn test_status_serializes_as_contract_vocabulary() {
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&Status::Warn).unwrap(), "\"WARN\"");
        assert_eq!(serde_json::to_string(&Status::Fail).unwrap(), "\"FAIL\"");
    }

    #[test]
    fn test_null_metric_serialization() {
        let mut metrics = Metrics::new();
        metrics.insert("newest_age_minutes".into(), None);
        let json = serde_json::to_string(&metrics).unwrap();
        assert_eq!(json, "{\"newest_age_minutes\":null}");
    }

    #[test]
    fn test_pod_ready_complete() {
        let pod = PodRow {
            name: "web-0".into(),
            ready_current: 2,
            ready_total: 2,
            phase: "Running".into(),
            restarts: 0,
            age: "4d".into(),
        };
        assert!(pod.ready_complete());
        assert_eq!(pod.short(), "2/2 Running 0 4d");
    }

    #[test]
    fn test_failure_result_carries_error_detail() {
        let result = CheckResult::failure("boundary", "connection refused", 255, None);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(
            result.details.get("error").and_then(|v| v.as_str()),
            Some("connection refused")
        );
        assert_eq!(
            result.details.get("raw_exit_code").and_then(|v| v.as_i64()),
            Some(255)
        );
        assert!(result.raw_file.is_none());
    }

    #[test]
    fn test_snapshot_field_names_are_stable() {
        let snapshot = Snapshot {
            timestamp: Local::now(),
            global_status: Status::Warn,
            results: vec![SnapshotEntry {
                name: "disk_1".into(),
                check_type: "disk".into(),
                server: "edge_1".into(),
                status: Status::Warn,
                metrics: Metrics::new(),
                details: Details::new(),
                raw_file: None,
            }],
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("timestamp").is_some());
        assert_eq!(value["global_status"], "WARN");
        let entry = &value["results"][0];
        for key in ["name", "type", "server", "status", "metrics", "details", "raw_file"] {
            assert!(entry.get(key).is_some(), "missing snapshot field {key}");
        }
    }
}
