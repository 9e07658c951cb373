//! pacman backend (Arch Linux and derivatives).

use crate::backend::{Backend, ensure_candidate};
use crate::command::{CommandOutput, CommandRunner, SystemRunner};
use crate::error::{Error, Result};
use crate::types::{InstalledPackage, PackageRequest};
use crate::version::pacman_vercmp;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Backend that executes `pacman` commands.
pub struct PacmanBackend {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl Default for PacmanBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PacmanBackend {
    /// Create a backend that runs the real `pacman`.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// Create a backend with a custom command runner (useful for testing).
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: "pacman".to_string(),
        }
    }

    fn command(&self, args: &[&str], request: Option<&PackageRequest>) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(args.iter().map(ToString::to_string));
        if let Some(request) = request {
            argv.extend(request.options.iter().cloned());
            argv.push(request.name.clone());
        }
        argv
    }

    fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput> {
        self.runner.run(argv, timeout)
    }

    fn sync(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(&["--sync", "--noconfirm", "--noprogressbar"], request, timeout)
    }

    /// Run a mutating command and check for success.
    fn run_checked(&self, args: &[&str], request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        let output = self.run(&self.command(args, Some(request)), timeout)?;
        if !output.success() {
            return Err(Error::from_output(&self.program, &output, &request.name));
        }
        Ok(())
    }
}

impl Backend for PacmanBackend {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn query(&self, name: &str) -> Result<Option<InstalledPackage>> {
        let output = self.run(&self.command(&["--query", name], None), None)?;
        if !output.success() {
            if output.stderr.contains("was not found") {
                return Ok(None);
            }
            return Err(Error::from_output(&self.program, &output, name));
        }
        Ok(parse_query(&output.stdout, name))
    }

    fn candidate_version(&self, request: &PackageRequest) -> Result<Option<String>> {
        let output = self.run(&self.command(&["--sync", "--info", &request.name], None), None)?;
        if !output.success() {
            if output.stderr.contains("target not found") {
                return Ok(None);
            }
            return Err(Error::from_output(&self.program, &output, &request.name));
        }
        Ok(parse_info_version(&output.stdout))
    }

    fn install(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        ensure_candidate(self, request, false)?;
        self.sync(request, timeout)
    }

    fn upgrade(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        ensure_candidate(self, request, true)?;
        self.sync(request, timeout)
    }

    fn remove(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(&["--remove", "--noconfirm", "--noprogressbar"], request, timeout)
    }

    fn purge(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(
            &["--remove", "--nosave", "--noconfirm", "--noprogressbar"],
            request,
            timeout,
        )
    }

    fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        pacman_vercmp(a, b)
    }
}

/// Parse `pacman --query` output: `<name> <version>`
fn parse_query(stdout: &str, name: &str) -> Option<InstalledPackage> {
    stdout.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(pkg), Some(version)) if pkg == name => Some(InstalledPackage {
                name: pkg.to_string(),
                version: version.to_string(),
            }),
            _ => None,
        }
    })
}

/// Parse the `Version : x` line of `pacman --sync --info`
fn parse_info_version(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "Version").then(|| value.trim().to_string())
    })
}
