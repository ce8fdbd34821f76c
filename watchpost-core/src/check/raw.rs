//! Raw diagnostic artifact persistence
//!
//! Every check leaves a plain-text record of its remote interaction for
//! manual diagnosis, independent of the parsed status. Files are named
//! deterministically per check and overwritten each run.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Placeholder written when a stream captured nothing
const EMPTY_PLACEHOLDER: &str = "(empty)";

/// A renderable record of one check's remote interaction
#[derive(Debug, Clone, Copy)]
pub struct RawArtifact<'a> {
    /// Check identifier
    pub check: &'a str,
    /// Entry host
    pub host: &'a str,
    /// Login user
    pub user: &'a str,
    /// Inner hop target, when the check used nested execution
    pub jump_target: Option<&'a str>,
    /// Kubernetes namespace, for the pod check
    pub namespace: Option<&'a str>,
    /// Remote exit code (255 when the command never completed)
    pub exit_code: i32,
    /// Captured (possibly banner-filtered) standard output
    pub stdout: &'a str,
    /// Captured standard error
    pub stderr: &'a str,
    /// Error description, on the failure path
    pub exception: Option<&'a str>,
}

impl RawArtifact<'_> {
    /// Renders the artifact text
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "TimestampLocal: {}", Local::now().to_rfc3339());
        let _ = writeln!(text, "Check: {}", self.check);
        let _ = writeln!(text, "Host: {}", self.host);
        let _ = writeln!(text, "User: {}", self.user);
        if let Some(jump) = self.jump_target {
            let _ = writeln!(text, "JumpTarget: {jump}");
        }
        if let Some(namespace) = self.namespace {
            let _ = writeln!(text, "Namespace: {namespace}");
        }
        let _ = writeln!(text, "ExitCode: {}", self.exit_code);
        if let Some(exception) = self.exception {
            let _ = writeln!(text, "Exception: {exception}");
        }
        let _ = writeln!(text, "\n--- stdout ---");
        let _ = writeln!(
            text,
            "{}",
            if self.stdout.is_empty() {
                EMPTY_PLACEHOLDER
            } else {
                self.stdout
            }
        );
        let _ = writeln!(text, "\n--- stderr ---");
        let _ = writeln!(
            text,
            "{}",
            if self.stderr.is_empty() {
                EMPTY_PLACEHOLDER
            } else {
                self.stderr
            }
        );
        text
    }
}

/// Filesystem sink for raw artifacts
#[derive(Debug, Clone)]
pub struct RawSink {
    dir: PathBuf,
}

impl RawSink {
    /// Creates a sink rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deterministic artifact path for a check
    #[must_use]
    pub fn path_for(&self, check_name: &str) -> PathBuf {
        self.dir.join(format!("{check_name}_latest.txt"))
    }

    /// Writes the artifact, creating the sink directory if needed
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the directory or file cannot
    /// be written.
    pub fn write(&self, artifact: &RawArtifact<'_>) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(artifact.check);
        std::fs::write(&path, artifact.render())?;
        Ok(path)
    }

    /// Best-effort write: a persistence failure is logged and swallowed so
    /// it never masks the check's primary outcome
    #[must_use]
    pub fn persist(&self, artifact: &RawArtifact<'_>) -> Option<PathBuf> {
        match self.write(artifact) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(
                    check = artifact.check,
                    dir = %self.dir.display(),
                    error = %err,
                    "failed to persist raw artifact"
                );
                None
            }
        }
    }

    /// The sink directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
