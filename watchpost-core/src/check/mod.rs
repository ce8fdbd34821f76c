//! Check runners, one per check type
//!
//! Each runner composes transport → sanitizer/parser → classifier, always
//! persists a raw artifact (on both success and failure paths), and
//! converts every error into a FAIL [`crate::model::CheckResult`] — the
//! harness never crashes on a single bad check.

mod raw;

pub mod disk;
pub mod pods;
pub mod query;

pub use raw::{RawArtifact, RawSink};

use crate::model::EXIT_NEVER_RAN;

/// Mutable execution state threaded through a runner so the failure path
/// can still persist whatever was captured before the error
pub(crate) struct ExecState {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecState {
    pub(crate) const fn new() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: EXIT_NEVER_RAN,
        }
    }
}

/// Rounds to two decimal places, for durations and age metrics
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
