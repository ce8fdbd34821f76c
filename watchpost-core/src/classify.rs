//! Status classification rules, one function per check type
//!
//! Pure threshold logic on parsed facts; no I/O. The thresholds mirror the
//! operational runbook: data older than 15 minutes is degraded, a disk at
//! 90% is worth a look, a disk at 100% is an incident.

use crate::model::{MountUsage, PodRow, Status};

/// Maximum acceptable age of the newest query row, in minutes (inclusive)
pub const QUERY_MAX_AGE_MINUTES: f64 = 15.0;

/// Disk use percentage at which the check degrades to WARN
pub const DISK_WARN_PERCENT: u8 = 90;

/// Disk use percentage at which the check fails
pub const DISK_FAIL_PERCENT: u8 = 100;

/// The only pod phase considered healthy
pub const RUNNING_PHASE: &str = "Running";

/// Classifies the tabular-query check
///
/// A nonzero remote exit code is an unconditional FAIL regardless of any
/// parsed content. Absence of a computable age is degraded (WARN), not
/// broken. Exactly 15.0 minutes is still OK.
#[must_use]
pub fn classify_query(exit_code: i32, age_minutes: Option<f64>) -> Status {
    if exit_code != 0 {
        return Status::Fail;
    }
    match age_minutes {
        None => Status::Warn,
        Some(age) if age <= QUERY_MAX_AGE_MINUTES => Status::Ok,
        Some(_) => Status::Warn,
    }
}

/// Classifies the pod-list check: OK or FAIL, no WARN tier
///
/// Zero observed pods is treated as an infrastructure problem, not an
/// empty-but-healthy state.
#[must_use]
pub fn classify_pods(rows: &[PodRow]) -> Status {
    if rows.is_empty() {
        return Status::Fail;
    }
    let unhealthy = rows
        .iter()
        .any(|pod| pod.phase != RUNNING_PHASE || !pod.ready_complete());
    if unhealthy { Status::Fail } else { Status::Ok }
}

/// Classifies the disk-usage check
///
/// `None` means the target mount point was not found in the df output.
#[must_use]
pub fn classify_disk(usage: Option<&MountUsage>) -> Status {
    match usage {
        None => Status::Fail,
        Some(u) if u.use_percent >= DISK_FAIL_PERCENT => Status::Fail,
        Some(u) if u.use_percent >= DISK_WARN_PERCENT => Status::Warn,
        Some(_) => Status::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(ready_current: u32, ready_total: u32, phase: &str) -> PodRow {
        PodRow {
            name: "p".into(),
            ready_current,
            ready_total,
            phase: phase.into(),
            restarts: 0,
            age: "1d".into(),
        }
    }

    fn usage(use_percent: u8) -> MountUsage {
        MountUsage {
            filesystem: "/dev/sda1".into(),
            size: "1014M".into(),
            used: "x".into(),
            avail: "y".into(),
            use_percent,
            mount: "/boot".into(),
        }
    }

    #[test]
    fn test_query_age_boundary_is_inclusive() {
        assert_eq!(classify_query(0, Some(15.0)), Status::Ok);
        assert_eq!(classify_query(0, Some(15.01)), Status::Warn);
        assert_eq!(classify_query(0, Some(0.0)), Status::Ok);
        assert_eq!(classify_query(0, Some(14.99)), Status::Ok);
    }

    #[test]
    fn test_query_missing_age_is_warn_not_fail() {
        assert_eq!(classify_query(0, None), Status::Warn);
    }

    #[test]
    fn test_query_nonzero_exit_is_unconditional_fail() {
        assert_eq!(classify_query(1, Some(0.0)), Status::Fail);
        assert_eq!(classify_query(255, None), Status::Fail);
    }

    #[test]
    fn test_pods_all_running_and_ready_is_ok() {
        let rows = vec![pod(1, 1, "Running"), pod(2, 2, "Running")];
        assert_eq!(classify_pods(&rows), Status::Ok);
    }

    #[test]
    fn test_pods_zero_rows_is_fail() {
        assert_eq!(classify_pods(&[]), Status::Fail);
    }

    #[test]
    fn test_pods_not_ready_is_fail() {
        let rows = vec![pod(1, 1, "Running"), pod(0, 1, "Running")];
        assert_eq!(classify_pods(&rows), Status::Fail);
    }

    #[test]
    fn test_pods_wrong_phase_is_fail() {
        let rows = vec![pod(1, 1, "CrashLoopBackOff")];
        assert_eq!(classify_pods(&rows), Status::Fail);
    }

    #[test]
    fn test_disk_buckets_and_boundaries() {
        assert_eq!(classify_disk(Some(&usage(0))), Status::Ok);
        assert_eq!(classify_disk(Some(&usage(89))), Status::Ok);
        assert_eq!(classify_disk(Some(&usage(90))), Status::Warn);
        assert_eq!(classify_disk(Some(&usage(99))), Status::Warn);
        assert_eq!(classify_disk(Some(&usage(100))), Status::Fail);
    }

    #[test]
    fn test_disk_missing_mount_is_fail() {
        assert_eq!(classify_disk(None), Status::Fail);
    }
}
