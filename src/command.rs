//! Running OS query commands.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs an external command and returns its standard output.
///
/// Abstracted so the live-network lookups can be exercised without touching
/// the host's routing table.
pub trait CommandRunner {
    /// Runs `program` with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NetworkQueryFailed`] if the command cannot be run,
    /// exits unsuccessfully or exceeds its time budget.
    fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

impl<F> CommandRunner for F
where
    F: Fn(&str, &[&str]) -> Result<String>,
{
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        self(program, args)
    }
}

/// Runs commands on the host with a wall-clock limit.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn timed_out(&self, cmdline: &str) -> Error {
        tracing::warn!(command = %cmdline, timeout = ?self.timeout, "Command timed out");
        Error::query(format!("{cmdline}: timed out after {:?}", self.timeout))
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let cmdline = format!("{program} {}", args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::query(format!("{cmdline}: {e}")))?;

        // Drain stdout concurrently so a chatty child cannot block on a full pipe.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::query(format!("{cmdline}: stdout not captured")))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.timed_out(&cmdline));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(Error::query(format!("{cmdline}: {e}"))),
            }
        };

        // A descendant may still hold the pipe open after the child exited.
        let remaining = self
            .timeout
            .saturating_sub(started.elapsed())
            .max(POLL_INTERVAL);
        let buf = match rx.recv_timeout(remaining) {
            Ok(read) => read.map_err(|e| Error::query(format!("{cmdline}: {e}")))?,
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(&cmdline)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::query(format!("{cmdline}: output reader panicked")));
            }
        };

        if !status.success() {
            return Err(Error::query(format!("{cmdline}: {status}")));
        }
        let out = String::from_utf8(buf)
            .map_err(|_| Error::query(format!("{cmdline}: output is not UTF-8")))?;
        tracing::debug!(command = %cmdline, bytes = out.len(), "Command finished");
        Ok(out)
    }
}
