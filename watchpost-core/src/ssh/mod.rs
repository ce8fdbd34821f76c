//! SSH remote execution: command building, session management, and
//! bounded channel reading
//!
//! A connection is exclusive to one command execution attempt: opened,
//! used, and closed within a single [`Transport::execute`] call. There is
//! no pooling or reuse across checks or retries.

pub mod channel;
pub mod command;
pub mod session;

pub use channel::{ChannelStream, READ_CHUNK, drain_channel};
pub use command::{bash_login, jump_exec, shell_quote, sudo_bash_login};
pub use session::{AuthCredential, ExecRequest, SshTransport, Timeouts, Transport};
