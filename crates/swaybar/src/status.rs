//! Status command bridge
//!
//! Runs the configured `status_command` through `sh -c` and turns its
//! standard output into status lines, one per newline-terminated line.

use std::io;
use std::process::Stdio;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info};

/// Longest status line in bytes, newline included
pub const MAX_LINE_LEN: usize = 1024;

/// Remove exactly one trailing newline
pub fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// A running status command and the read side of its stdout
///
/// Sends SIGTERM to the child when dropped.
#[derive(Debug)]
pub struct StatusCommand {
    child: Child,
    /// `None` once the pipe reached EOF
    stdout: Option<BufReader<ChildStdout>>,
    /// Bytes of the line being read; survives cancellation of `next_line`
    buffer: Vec<u8>,
    /// Skipping the remainder of an overlong line
    discarding: bool,
}

impl StatusCommand {
    /// Start `sh -c <command>` with stdout piped
    ///
    /// The child inherits the environment and stderr.
    pub fn spawn(command: &str) -> io::Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(BufReader::new);
        info!(command, pid = child.id(), "Started status command");

        Ok(Self {
            child,
            stdout,
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            discarding: false,
        })
    }

    /// Read the next status line
    ///
    /// The line has its trailing newline removed and invalid UTF-8 replaced.
    /// Lines longer than [`MAX_LINE_LEN`] are cut short and the rest of them
    /// is skipped. Returns `Ok(None)` at EOF; after that the bridge is inert
    /// and this future never completes.
    ///
    /// Cancel-safe: a partially read line is kept for the next call.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            let limit = (MAX_LINE_LEN - self.buffer.len()) as u64;
            let read = (&mut *stdout)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;

            if self.discarding {
                if self.buffer.ends_with(b"\n") {
                    self.discarding = false;
                }
                self.buffer.clear();
                if read == 0 {
                    break;
                }
                continue;
            }

            if read == 0 {
                if self.buffer.is_empty() {
                    break;
                }
                return Ok(Some(take_line(&mut self.buffer)));
            }

            if self.buffer.ends_with(b"\n") {
                return Ok(Some(take_line(&mut self.buffer)));
            }

            if self.buffer.len() >= MAX_LINE_LEN {
                debug!("Status line exceeds {} bytes, truncating", MAX_LINE_LEN);
                self.buffer.truncate(MAX_LINE_LEN - 1);
                truncate_to_char_boundary(&mut self.buffer);
                self.discarding = true;
                return Ok(Some(take_line(&mut self.buffer)));
            }
        }

        info!("Status command closed its output");
        self.stdout = None;
        Ok(None)
    }

    /// Ask the child to exit and stop reading from it
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub fn terminate(&mut self) {
        self.stdout = None;

        let Some(pid) = self.child.id() else {
            return;
        };
        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => debug!(pid, "Sent SIGTERM to status command"),
            Err(e) => debug!(pid, error = %e, "Failed to signal status command"),
        }
    }
}

impl Drop for StatusCommand {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn take_line(buffer: &mut Vec<u8>) -> String {
    let line = String::from_utf8_lossy(buffer).into_owned();
    buffer.clear();
    strip_newline(&line).to_string()
}

/// Drop a multi-byte sequence cut in half at the end of `bytes`
fn truncate_to_char_boundary(bytes: &mut Vec<u8>) {
    if let Err(e) = std::str::from_utf8(bytes) {
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
}
