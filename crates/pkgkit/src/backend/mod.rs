//! Backend abstraction for package managers.
//!
//! The [`Backend`] trait defines the interface for querying and changing
//! installed packages, allowing for different implementations (pacman,
//! SVR4 `pkgadd`, mocks for testing).

pub mod pacman;
pub mod solaris;

use crate::error::{Error, Result};
use crate::types::{InstalledPackage, PackageRequest};
use std::cmp::Ordering;
use std::time::Duration;

/// Backend trait for package manager operations.
///
/// Mutating operations block until the package manager exits. A `timeout`
/// kills the package manager and fails with [`Error::Timeout`].
///
/// [`Error::Timeout`]: crate::error::Error::Timeout
pub trait Backend: Send + Sync {
    /// Short backend name (e.g. "pacman").
    fn name(&self) -> &'static str;

    /// Installed version of a package, `None` when not installed.
    fn query(&self, name: &str) -> Result<Option<InstalledPackage>>;

    /// Version the package manager would install, if it knows one.
    fn candidate_version(&self, request: &PackageRequest) -> Result<Option<String>>;

    /// Install a package.
    fn install(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()>;

    /// Upgrade a package to the candidate (or requested) version.
    fn upgrade(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()>;

    /// Remove a package.
    fn remove(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()>;

    /// Remove a package together with its configuration files.
    fn purge(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.remove(request, timeout)
    }

    /// Order two versions using the package system's own rules.
    fn compare_versions(&self, a: &str, b: &str) -> Ordering;
}

/// Fail before mutating when the candidate cannot satisfy a requested version.
///
/// Package managers install their candidate, never an arbitrary version, so
/// an install needs the candidate to equal the request and an upgrade needs
/// it to be at least the request. Requests without a version always pass.
pub fn ensure_candidate<B: Backend + ?Sized>(backend: &B, request: &PackageRequest, upgrade: bool) -> Result<()> {
    let Some(requested) = request.version.as_deref() else {
        return Ok(());
    };
    let candidate = backend.candidate_version(request)?;
    let satisfied = candidate.as_deref().is_some_and(|candidate| {
        let order = backend.compare_versions(candidate, requested);
        if upgrade {
            order != Ordering::Less
        } else {
            order == Ordering::Equal
        }
    });
    if satisfied {
        return Ok(());
    }
    Err(Error::VersionUnavailable {
        name: request.name.clone(),
        requested: requested.to_string(),
        candidate,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::command::{CommandOutput, CommandRunner};
    use crate::error::{Error, Result};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Runner that replays canned outputs and records every argv
    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        responses: Mutex<Vec<(String, CommandOutput)>>,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        /// Respond to the first call whose argv joined by spaces starts with `prefix`
        pub fn on(self, prefix: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.lock().unwrap().push((
                prefix.to_string(),
                CommandOutput {
                    exit_code: Some(exit_code),
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
            ));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|argv| argv.join(" "))
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, argv: &[String], _timeout: Option<Duration>) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(argv.to_vec());
            let line = argv.join(" ");
            let mut responses = self.responses.lock().unwrap();
            let position = responses
                .iter()
                .position(|(prefix, _)| line.starts_with(prefix.as_str()));
            Ok(match position {
                Some(index) => responses.remove(index).1,
                None => CommandOutput {
                    exit_code: Some(0),
                    ..CommandOutput::default()
                },
            })
        }
    }
}
