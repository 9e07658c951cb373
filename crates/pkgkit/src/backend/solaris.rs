//! SVR4 packaging backend (Solaris `pkginfo`, `pkgadd`, `pkgrm`).

use crate::backend::{Backend, ensure_candidate};
use crate::command::{CommandOutput, CommandRunner, SystemRunner};
use crate::error::{Error, Result};
use crate::types::{InstalledPackage, PackageRequest};
use crate::version::solaris_vercmp;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Backend that executes SVR4 packaging commands.
pub struct SolarisBackend {
    runner: Arc<dyn CommandRunner>,
}

impl Default for SolarisBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SolarisBackend {
    /// Create a backend that runs the real packaging tools.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// Create a backend with a custom command runner (useful for testing).
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn run(&self, argv: Vec<String>, timeout: Option<Duration>) -> Result<CommandOutput> {
        self.runner.run(&argv, timeout)
    }

    /// `pkginfo -l [-d source] name`, `None` when the package is unknown
    fn info_version(&self, name: &str, source: Option<&str>) -> Result<Option<String>> {
        let mut argv = vec!["pkginfo".to_string(), "-l".to_string()];
        if let Some(source) = source {
            argv.extend(["-d".to_string(), source.to_string()]);
        }
        argv.push(name.to_string());

        let output = self.run(argv, None)?;
        if !output.success() {
            if output.stderr.contains("was not found") {
                return Ok(None);
            }
            return Err(Error::from_output("pkginfo", &output, name));
        }
        Ok(parse_pkginfo_version(&output.stdout))
    }

    fn pkgadd(&self, request: &PackageRequest, upgrade: bool, timeout: Option<Duration>) -> Result<()> {
        let source = request.source.as_deref().ok_or_else(|| Error::MissingSource {
            name: request.name.clone(),
        })?;
        ensure_candidate(self, request, upgrade)?;

        let mut argv = vec!["pkgadd".to_string(), "-n".to_string()];
        argv.extend(request.options.iter().cloned());
        argv.extend(["-d".to_string(), source.to_string(), request.name.clone()]);

        let output = self.run(argv, timeout)?;
        if !output.success() {
            return Err(Error::from_output("pkgadd", &output, &request.name));
        }
        Ok(())
    }
}

impl Backend for SolarisBackend {
    fn name(&self) -> &'static str {
        "solaris"
    }

    fn query(&self, name: &str) -> Result<Option<InstalledPackage>> {
        Ok(self
            .info_version(name, None)?
            .map(|version| InstalledPackage {
                name: name.to_string(),
                version,
            }))
    }

    fn candidate_version(&self, request: &PackageRequest) -> Result<Option<String>> {
        match request.source.as_deref() {
            Some(source) => self.info_version(&request.name, Some(source)),
            None => Ok(None),
        }
    }

    fn install(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.pkgadd(request, false, timeout)
    }

    fn upgrade(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        self.pkgadd(request, true, timeout)
    }

    fn remove(&self, request: &PackageRequest, timeout: Option<Duration>) -> Result<()> {
        let mut argv = vec!["pkgrm".to_string(), "-n".to_string()];
        argv.extend(request.options.iter().cloned());
        argv.push(request.name.clone());

        let output = self.run(argv, timeout)?;
        if !output.success() {
            return Err(Error::from_output("pkgrm", &output, &request.name));
        }
        Ok(())
    }

    fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        solaris_vercmp(a, b)
    }
}

/// Parse the `VERSION:` line of `pkginfo -l`
fn parse_pkginfo_version(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.trim()
            .strip_prefix("VERSION:")
            .map(|version| version.trim().to_string())
    })
}
