//! Tracing integration for structured logging
//!
//! The harness always logs to stderr so check output and the snapshot
//! summary stay clean on stdout; a per-run log file can be layered on
//! top for unattended scheduled runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global flag indicating whether logging has been initialized
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive string did not parse
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        /// The offending directive string
        filter: String,
        /// Parse error from `tracing-subscriber`
        source: tracing_subscriber::filter::ParseError,
    },

    /// The log file could not be created
    #[error("failed to create log file {path}: {source}")]
    FileCreation {
        /// Requested log file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A subscriber has already been installed
    #[error("logging has already been initialized")]
    AlreadyInitialized,
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Options controlling subscriber construction
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter directives, e.g. `info` or `watchpost_core=debug`
    pub filter: Option<String>,
    /// Optional log file receiving a plain-text copy of all events
    pub log_file: Option<PathBuf>,
}

/// Installs the global tracing subscriber
///
/// Call once at startup. Events always go to stderr; when
/// [`LogOptions::log_file`] is set they are duplicated to that file
/// without ANSI escapes.
///
/// # Errors
///
/// Returns an error if the filter does not parse, the log file cannot
/// be created, or a subscriber is already installed.
pub fn init(options: &LogOptions) -> LoggingResult<()> {
    let filter = match &options.filter {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
                filter: directives.clone(),
                source,
            })?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = match &options.log_file {
        None => None,
        Some(path) => {
            let file =
                std::fs::File::create(path).map_err(|source| LoggingError::FileCreation {
                    path: path.clone(),
                    source,
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
    };

    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggingError::AlreadyInitialized);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(())
}

/// Checks if logging has been initialized
#[must_use]
pub fn is_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected_before_install() {
        let options = LogOptions {
            filter: Some("not a [valid] directive!!".into()),
            log_file: None,
        };
        // Filter validation happens before the latch flips, so a bad
        // filter leaves the process free to call init again.
        let err = init(&options).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
        assert!(!is_initialized());
    }
}
