//! Error types for the harness, one enum per concern

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from the SSH transport layer (connect, auth, execute, read)
#[derive(Debug, Error)]
pub enum SshError {
    /// Host name did not resolve to any socket address
    #[error("could not resolve {host}:{port}")]
    Resolve {
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// TCP connection failed or timed out
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// SSH handshake (banner exchange, key negotiation) failed
    #[error("SSH handshake with {host} failed: {source}")]
    Handshake {
        /// Target host
        host: String,
        /// Underlying ssh2 error
        source: ssh2::Error,
    },

    /// Authentication was rejected
    #[error("authentication as {user} failed: {source}")]
    Auth {
        /// User name offered
        user: String,
        /// Underlying ssh2 error
        source: ssh2::Error,
    },

    /// The private key file could not be used
    #[error("private key {path} is unusable: {reason}")]
    KeyUnusable {
        /// Key file path
        path: PathBuf,
        /// Why the key was rejected
        reason: String,
    },

    /// Opening or driving the exec channel failed
    #[error("channel error: {source}")]
    Channel {
        /// Underlying ssh2 error
        source: ssh2::Error,
    },

    /// A non-benign read error on the channel
    #[error("channel read error: {source}")]
    Read {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The command exceeded its wall-clock budget and the channel was
    /// forcibly closed
    #[error("remote command timed out after {budget:?}")]
    Timeout {
        /// The wall-clock budget that elapsed
        budget: Duration,
    },

    /// All connection attempts were exhausted
    #[error("all {attempts} connection attempts failed; last error: {last}")]
    RetriesExhausted {
        /// How many attempts were made
        attempts: u32,
        /// The last underlying failure
        last: Box<SshError>,
    },
}

/// Result type for SSH transport operations
pub type SshResult<T> = Result<T, SshError>;

/// Errors loading or resolving the host/check registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry file could not be read
    #[error("cannot read registry file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Registry file is not valid TOML
    #[error("invalid registry file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// A server profile has neither a key path nor a password
    #[error("server '{server}' has no usable credential (key_path, password or password_env)")]
    MissingCredential {
        /// Server registry key
        server: String,
    },

    /// A password environment variable is unset or empty
    #[error("environment variable {var} for server '{server}' is unset or empty")]
    EmptyPasswordEnv {
        /// Variable name
        var: String,
        /// Server registry key
        server: String,
    },

    /// A custom banner pattern failed to compile
    #[error("invalid banner pattern: {source}")]
    BannerPattern {
        /// Underlying regex error
        source: regex::Error,
    },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Any failure inside a single check's pipeline
///
/// Caught at the check-runner boundary and converted into a FAIL
/// [`crate::model::CheckResult`]; never escapes to sibling checks.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// SSH transport failure
    #[error(transparent)]
    Ssh(#[from] SshError),

    /// Configuration/credential failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for check execution
pub type HarnessResult<T> = Result<T, HarnessError>;
