//! SSH session management: connect, authenticate, execute, close
//!
//! One session per command execution attempt. Connection and
//! authentication failures are retried with linear backoff
//! (`1.5 × attempt` backoff units); the session is closed on every exit
//! path before the next attempt or return. Host keys are accepted without
//! verification — the harness runs unattended and no interactive host-key
//! prompt is possible in this environment.

use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use ssh2::Session;

use super::channel::{Ssh2Channel, drain_channel};
use crate::error::{SshError, SshResult};
use crate::model::RemoteExecOutcome;

/// Default connect/auth/banner timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-read socket timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Default wall-clock budget for a whole command
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// How a session authenticates
#[derive(Debug, Clone)]
pub enum AuthCredential {
    /// Private key file; the key algorithm is negotiated by libssh2
    Key {
        /// Path to the private key
        path: PathBuf,
    },
    /// Plaintext password (redacted in Debug output)
    Password {
        /// The password
        password: SecretString,
    },
}

/// The three nested timeout levels, independently configurable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect + handshake/banner/auth timeout
    pub connect: Duration,
    /// Per-read socket timeout (shortest)
    pub read: Duration,
    /// Wall-clock budget for the whole command (longest)
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
            total: DEFAULT_TOTAL_TIMEOUT,
        }
    }
}

impl Timeouts {
    /// Default connect/read timeouts with a custom total budget
    #[must_use]
    pub fn with_total(total: Duration) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }
}

/// Everything needed to run one remote command
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Target host
    pub host: String,
    /// Target port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Credential
    pub auth: AuthCredential,
    /// The command, already shell-wrapped by the caller
    pub command: String,
    /// Timeout levels
    pub timeouts: Timeouts,
    /// Connection attempts before giving up (minimum 1)
    pub max_attempts: u32,
    /// Base unit of the `1.5 × attempt` backoff schedule
    pub backoff_unit: Duration,
}

/// Executes remote commands; the seam between check runners and the
/// network
///
/// Tests substitute a scripted implementation to assert call counts and
/// drive end-to-end scenarios without a network.
pub trait Transport: Send + Sync {
    /// Runs one command on the requested host, with the request's retry
    /// policy
    ///
    /// # Errors
    ///
    /// Returns [`SshError::RetriesExhausted`] naming the last underlying
    /// cause once every attempt has failed.
    fn execute(&self, request: &ExecRequest) -> SshResult<RemoteExecOutcome>;
}

/// The real ssh2-backed transport
#[derive(Debug, Clone, Copy, Default)]
pub struct SshTransport;

impl SshTransport {
    /// Creates the transport
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for SshTransport {
    fn execute(&self, request: &ExecRequest) -> SshResult<RemoteExecOutcome> {
        execute_with_retry(request, attempt)
    }
}

/// Bounded retry loop shared by all transports
///
/// Sleeps `1.5 × attempt × backoff_unit` after every failed attempt,
/// including the last one — this matches the schedule the fleet's
/// operators already expect between a failure and the FAIL artifact.
fn execute_with_retry<F>(request: &ExecRequest, mut attempt_fn: F) -> SshResult<RemoteExecOutcome>
where
    F: FnMut(&ExecRequest) -> SshResult<RemoteExecOutcome>,
{
    let attempts = request.max_attempts.max(1);
    let mut last_err;
    let mut attempt = 1;

    loop {
        match attempt_fn(request) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => {
                tracing::warn!(
                    host = %request.host,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "execution attempt failed"
                );
                last_err = err;
                std::thread::sleep(request.backoff_unit.mul_f64(1.5 * f64::from(attempt)));
            }
        }
        if attempt == attempts {
            break;
        }
        attempt += 1;
    }

    Err(SshError::RetriesExhausted {
        attempts,
        last: Box::new(last_err),
    })
}

/// One connection attempt: connect, handshake, authenticate, execute,
/// disconnect
fn attempt(request: &ExecRequest) -> SshResult<RemoteExecOutcome> {
    if let AuthCredential::Key { path } = &request.auth {
        if !path.is_file() {
            return Err(SshError::KeyUnusable {
                path: path.clone(),
                reason: "file not found or not a regular file".into(),
            });
        }
    }

    let address = (request.host.as_str(), request.port)
        .to_socket_addrs()
        .map_err(|source| SshError::Connect {
            host: request.host.clone(),
            port: request.port,
            source,
        })?
        .next()
        .ok_or_else(|| SshError::Resolve {
            host: request.host.clone(),
            port: request.port,
        })?;

    let tcp = TcpStream::connect_timeout(&address, request.timeouts.connect).map_err(|source| {
        SshError::Connect {
            host: request.host.clone(),
            port: request.port,
            source,
        }
    })?;

    let mut session = Session::new().map_err(|source| SshError::Handshake {
        host: request.host.clone(),
        source,
    })?;
    session.set_tcp_stream(tcp);
    // Bounds the banner exchange and authentication round-trips.
    session.set_timeout(duration_ms(request.timeouts.connect));
    session.handshake().map_err(|source| SshError::Handshake {
        host: request.host.clone(),
        source,
    })?;

    let result = authenticate(&session, request).and_then(|()| run_command(&session, request));

    // Closed on every exit path of the attempt, before retry or return.
    let _ = session.disconnect(None, "health check complete", None);
    result
}

fn authenticate(session: &Session, request: &ExecRequest) -> SshResult<()> {
    match &request.auth {
        AuthCredential::Key { path } => session
            .userauth_pubkey_file(&request.user, None, path, None)
            .map_err(|source| SshError::Auth {
                user: request.user.clone(),
                source,
            }),
        AuthCredential::Password { password } => session
            .userauth_password(&request.user, password.expose_secret())
            .map_err(|source| SshError::Auth {
                user: request.user.clone(),
                source,
            }),
    }
}

fn run_command(session: &Session, request: &ExecRequest) -> SshResult<RemoteExecOutcome> {
    // Per-read socket timeout for the drain loop.
    session.set_timeout(duration_ms(request.timeouts.read));
    let mut channel = session
        .channel_session()
        .map_err(|source| SshError::Channel { source })?;
    // No pseudo-terminal: exec goes straight to the remote shell.
    channel
        .exec(&request.command)
        .map_err(|source| SshError::Channel { source })?;
    let mut stream = Ssh2Channel::new(channel);
    drain_channel(&mut stream, request.timeouts.total)
}

/// Converts a duration to libssh2's millisecond timeout representation
fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
