//! Remote command construction: shell quoting and the nested jump-host
//! invocation

/// SSH options for the inner (jump) hop
///
/// Non-interactive by construction: host keys are accepted blindly, the
/// connect timeout is short, and keepalives abort a dead inner session
/// instead of hanging the outer command.
pub const JUMP_SSH_OPTS: &str = "-q \
-o StrictHostKeyChecking=no \
-o UserKnownHostsFile=/dev/null \
-o ConnectTimeout=10 \
-o ServerAliveInterval=10 \
-o ServerAliveCountMax=2 \
-T";

/// Quotes a string for POSIX shells using single quotes
///
/// Embedded single quotes use the standard `'\''` escape.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// Wraps a command in a login bash shell
#[must_use]
pub fn bash_login(command: &str) -> String {
    format!("bash -lc {}", shell_quote(command))
}

/// Wraps a command in non-interactive sudo plus a login bash shell
///
/// `sudo -n` fails fast instead of prompting when passwordless sudo is
/// not configured.
#[must_use]
pub fn sudo_bash_login(command: &str) -> String {
    format!("sudo -n bash -lc {}", shell_quote(command))
}

/// Builds the outer command for a nested (jump-host) execution
///
/// The outer host runs `ssh <opts> <jump_target> '<inner_command>'` inside
/// a login shell. The inner hop has no independent retry: its failure
/// surfaces as a nonzero outer exit code or embedded error text.
#[must_use]
pub fn jump_exec(jump_target: &str, inner_command: &str) -> String {
    bash_login(&format!(
        "ssh {JUMP_SSH_OPTS} {jump_target} {}",
        shell_quote(inner_command)
    ))
}
