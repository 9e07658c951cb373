//! Command invocation shim.
//!
//! Backends never spawn processes directly; they go through a
//! [`CommandRunner`] so tests can script package manager responses.

use crate::error::{Error, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running command is checked against its deadline
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an argv to completion.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first) and block until it exits.
    ///
    /// A non-zero exit is not an error at this level; it is reported in
    /// [`CommandOutput::exit_code`]. With a `timeout`, a command still running
    /// at the deadline is killed and [`Error::Timeout`] is returned.
    fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput>;
}

/// Runner that executes real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        log::debug!("Running: {}", argv.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty command cannot
        // block on a full pipe while we wait for it.
        let stdout = child.stdout.take().map(|pipe| thread::spawn(move || read_all(pipe)));
        let stderr = child.stderr.take().map(|pipe| thread::spawn(move || read_all(pipe)));

        let status = match timeout {
            None => child.wait()?,
            Some(limit) => match wait_with_deadline(&mut child, limit)? {
                Some(status) => status,
                None => {
                    log::warn!("{program} exceeded {}s, killed", limit.as_secs());
                    // Reader threads are left to finish on their own; a
                    // grandchild may still hold the pipes open.
                    return Err(Error::Timeout {
                        command: program.clone(),
                        after: limit,
                    });
                }
            },
        };

        let join = |handle: Option<thread::JoinHandle<String>>| {
            handle
                .and_then(|h| h.join().ok())
                .unwrap_or_default()
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: join(stdout),
            stderr: join(stderr),
        })
    }
}

/// Wait for `child` until `limit` elapses; kill it and return `None` on expiry.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn read_all(mut pipe: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Build an argv from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_output_and_exit_code() {
        let output = SystemRunner
            .run(&argv(["sh", "-c", "echo out; echo err >&2; exit 3"]), None)
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
    }

    #[test]
    fn test_run_within_timeout() {
        let output = SystemRunner
            .run(&argv(["echo", "hello"]), Some(Duration::from_secs(10)))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_run_kills_on_timeout() {
        let start = Instant::now();
        let err = SystemRunner
            .run(&argv(["sleep", "5"]), Some(Duration::from_millis(100)))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_missing_program() {
        let err = SystemRunner
            .run(&argv(["sous-definitely-not-a-command"]), None)
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_run_empty_argv() {
        assert!(SystemRunner.run(&[], None).is_err());
    }
}
