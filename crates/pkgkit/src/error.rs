//! Error types for package manager operations.
//!
//! Failures reported by a package manager are categorized from its stderr so
//! callers can give useful feedback. Every categorized variant keeps the
//! captured stderr.

use crate::command::CommandOutput;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while querying or changing installed packages.
#[derive(Debug, Error)]
pub enum Error {
    /// Package is unknown to the package manager or its source
    #[error("package not found: {name}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
        /// Standard error output of the failed command
        stderr: String,
    },

    /// File or dependency conflict
    #[error("conflict: {stderr}")]
    Conflict {
        /// Standard error output of the failed command
        stderr: String,
    },

    /// Operation requires privileges the process does not have
    #[error("permission denied: {stderr}")]
    Permission {
        /// Standard error output of the failed command
        stderr: String,
    },

    /// Package database is locked by another process
    #[error("package database is locked: {stderr}")]
    Locked {
        /// Standard error output of the failed command
        stderr: String,
    },

    /// Command exited unsuccessfully for an unrecognized reason
    #[error("{message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output of the failed command
        stderr: String,
        /// Exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
    },

    /// Command exceeded its time budget and was killed
    #[error("{command} timed out after {}s", .after.as_secs())]
    Timeout {
        /// Program that was killed
        command: String,
        /// Budget that was exceeded
        after: Duration,
    },

    /// The package manager cannot provide the requested version
    #[error("{name} {requested} is not available (candidate: {})", .candidate.as_deref().unwrap_or("none"))]
    VersionUnavailable {
        /// Name of the package
        name: String,
        /// Version the caller asked for
        requested: String,
        /// Version the package manager would install, if any
        candidate: Option<String>,
    },

    /// Install requested without a package source
    #[error("no source given for package {name}")]
    MissingSource {
        /// Name of the package
        name: String,
    },

    /// Command could not be started
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Program that could not be started
        command: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an error from the output of a failed package manager command.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_output(program: &str, output: &CommandOutput, package_name: &str) -> Self {
        let stderr = output.stderr.trim().to_string();
        let stderr_lower = stderr.to_lowercase();

        // Not found errors (pacman, pkginfo/pkgadd/pkgrm)
        if stderr_lower.contains("target not found")
            || stderr_lower.contains("was not found")
            || stderr_lower.contains("no package associated")
            || stderr_lower.contains("is not a valid package")
        {
            return Error::NotFound {
                name: package_name.to_string(),
                stderr,
            };
        }

        // Lock errors
        if stderr_lower.contains("unable to lock database")
            || stderr_lower.contains("could not lock database")
            || stderr_lower.contains("another instance")
        {
            return Error::Locked { stderr };
        }

        // Permission errors
        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("unless you are root")
            || stderr_lower.contains("must be root")
            || stderr_lower.contains("operation not permitted")
        {
            return Error::Permission { stderr };
        }

        // Conflicts
        if stderr_lower.contains("conflict")
            || stderr_lower.contains("breaks dependency")
            || stderr_lower.contains("unable to satisfy dependency")
        {
            return Error::Conflict { stderr };
        }

        let status = output
            .exit_code
            .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
        Error::CommandFailed {
            message: format!("{program} failed for {package_name} with {status}"),
            stderr,
            exit_code: output.exit_code,
        }
    }

    /// Captured stderr of the failed command, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::NotFound { stderr, .. }
            | Error::Conflict { stderr }
            | Error::Permission { stderr }
            | Error::Locked { stderr }
            | Error::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Whether the command was killed for exceeding its budget
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_from_output_not_found() {
        let err = Error::from_output("pacman", &failed("error: target not found: vimm\n"), "vimm");
        assert!(matches!(err, Error::NotFound { ref name, .. } if name == "vimm"));
        assert_eq!(err.stderr(), Some("error: target not found: vimm"));
    }

    #[test]
    fn test_from_output_locked() {
        let err = Error::from_output(
            "pacman",
            &failed("error: failed to init transaction (unable to lock database)"),
            "vim",
        );
        assert!(matches!(err, Error::Locked { .. }));
    }

    #[test]
    fn test_from_output_permission() {
        let err = Error::from_output(
            "pacman",
            &failed("error: you cannot perform this operation unless you are root."),
            "vim",
        );
        assert!(matches!(err, Error::Permission { .. }));
    }

    #[test]
    fn test_from_output_conflict() {
        let err = Error::from_output(
            "pacman",
            &failed("error: failed to prepare transaction (conflicting dependencies)"),
            "vim",
        );
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_from_output_unrecognized() {
        let err = Error::from_output("pkgadd", &failed("something odd"), "SUNWbash");
        assert_eq!(err.to_string(), "pkgadd failed for SUNWbash with status 1");
        assert_eq!(err.stderr(), Some("something odd"));
    }

    #[test]
    fn test_version_unavailable_display() {
        let err = Error::VersionUnavailable {
            name: "vim".into(),
            requested: "1.10-1".into(),
            candidate: Some("1.11-1".into()),
        };
        assert_eq!(err.to_string(), "vim 1.10-1 is not available (candidate: 1.11-1)");
        assert_eq!(err.stderr(), None);

        let err = Error::VersionUnavailable {
            name: "vim".into(),
            requested: "1.10-1".into(),
            candidate: None,
        };
        assert_eq!(err.to_string(), "vim 1.10-1 is not available (candidate: none)");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            command: "pacman".into(),
            after: Duration::from_secs(900),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "pacman timed out after 900s");
        assert_eq!(err.stderr(), None);
    }
}
