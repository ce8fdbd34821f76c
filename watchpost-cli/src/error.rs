//! CLI error types and exit codes.

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Everything healthy
    pub const OK: i32 = 0;
    /// At least one check degraded
    pub const WARN: i32 = 1;
    /// At least one check failed, or the harness itself could not run
    pub const FAIL: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Registry could not be loaded or is inconsistent
    #[error("Registry error: {0}")]
    Registry(String),

    /// Logging setup failed
    #[error("Logging error: {0}")]
    Logging(#[from] watchpost_core::logging::LoggingError),

    /// Snapshot could not be serialized
    #[error("Snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<watchpost_core::RegistryError> for CliError {
    fn from(err: watchpost_core::RegistryError) -> Self {
        Self::Registry(err.to_string())
    }
}

impl CliError {
    /// Returns the exit code for this error
    ///
    /// Any harness-level failure ranks alongside a failed check: an
    /// operator paging on exit code 2 must see a broken registry too.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        exit_codes::FAIL
    }
}
