//! Bounded draining of a remote command's output channel
//!
//! The reader polls the channel's stdout and stderr in small chunks under
//! a hard wall-clock deadline. It never blocks indefinitely: each
//! underlying read is bounded by the session's per-read timeout, and a
//! read that times out with no data (receive-ready race) is a benign
//! retry, not a failure. On deadline expiry the channel is forcibly
//! closed and the attempt fails with [`SshError::Timeout`].

use std::io::Read;
use std::time::{Duration, Instant};

use crate::error::{SshError, SshResult};
use crate::model::RemoteExecOutcome;

/// Chunk size for each channel read
pub const READ_CHUNK: usize = 4096;

/// Sleep between polls when neither stream produced data
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// libssh2 error code for a blocking operation that hit the session
/// read timeout
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// A command channel the reader can drain
///
/// Implemented by [`ssh2::Channel`] (via [`Ssh2Channel`]) and by scripted
/// fakes in tests.
pub trait ChannelStream {
    /// Reads a chunk of standard output; `Ok(0)` means no data right now
    /// (or EOF once [`Self::finished`] reports true)
    fn read_stdout(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Reads a chunk of standard error
    fn read_stderr(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Whether the remote process has signalled command completion
    fn finished(&self) -> bool;

    /// Retrieves the remote exit status; only called after
    /// [`Self::finished`] returns true
    fn exit_status(&mut self) -> SshResult<i32>;

    /// Forcibly closes the channel; errors are deliberately ignored
    fn force_close(&mut self);
}

/// Whether a read error is a benign timeout/retry condition
fn is_benign(err: &std::io::Error) -> bool {
    if matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
    ) {
        return true;
    }
    // ssh2 wraps LIBSSH2_ERROR_TIMEOUT in an opaque io::Error; unwrap it.
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<ssh2::Error>())
        .is_some_and(|ssh| matches!(ssh.code(), ssh2::ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT)))
}

/// Drains a command channel until completion or the wall-clock deadline
///
/// Accumulated bytes are decoded lossily (malformed bytes become the
/// replacement character; decoding never fails).
///
/// # Errors
///
/// Returns [`SshError::Timeout`] when `total_budget` elapses before the
/// remote signals completion, or [`SshError::Read`] on a non-benign read
/// error.
pub fn drain_channel(
    stream: &mut dyn ChannelStream,
    total_budget: Duration,
) -> SshResult<RemoteExecOutcome> {
    let start = Instant::now();
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        if start.elapsed() > total_budget {
            stream.force_close();
            return Err(SshError::Timeout {
                budget: total_budget,
            });
        }

        let mut progressed = false;

        match stream.read_stdout(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                out.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Err(e) if is_benign(&e) => {}
            Err(e) => return Err(SshError::Read { source: e }),
        }

        match stream.read_stderr(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                err.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Err(e) if is_benign(&e) => {}
            Err(e) => return Err(SshError::Read { source: e }),
        }

        if stream.finished() {
            break;
        }
        if !progressed {
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    let exit_code = stream.exit_status()?;
    Ok(RemoteExecOutcome {
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
        exit_code,
    })
}

/// [`ChannelStream`] backed by a live ssh2 exec channel
pub struct Ssh2Channel {
    inner: ssh2::Channel,
}

impl Ssh2Channel {
    /// Wraps an exec channel after the command has been started
    #[must_use]
    pub const fn new(inner: ssh2::Channel) -> Self {
        Self { inner }
    }
}

impl ChannelStream for Ssh2Channel {
    fn read_stdout(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }

    fn read_stderr(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.stderr().read(buf)
    }

    fn finished(&self) -> bool {
        self.inner.eof()
    }

    fn exit_status(&mut self) -> SshResult<i32> {
        self.inner
            .close()
            .and_then(|()| self.inner.wait_close())
            .and_then(|()| self.inner.exit_status())
            .map_err(|source| SshError::Channel { source })
    }

    fn force_close(&mut self) {
        let _ = self.inner.close();
    }
}
