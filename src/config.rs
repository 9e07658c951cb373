//! sous configuration (`config.toml`)
//!
//! Every key is optional; a missing file is the same as an empty one.
//! Command-line flags override anything set here.

use anyhow::{Context, Result};
use declarative::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SousConfig {
    pub run: RunConfig,
    pub paths: PathsConfig,
}

/// `[run]` - engine defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum number of resources converged concurrently
    pub jobs: usize,
    pub stop_on_failure: bool,
    /// Budget for a single package manager call or file write
    pub action_timeout_secs: Option<u64>,
    /// Force a platform instead of detecting it
    pub platform: Option<Platform>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            stop_on_failure: false,
            action_timeout_secs: None,
            platform: None,
        }
    }
}

impl RunConfig {
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_secs.map(Duration::from_secs)
    }
}

/// `[paths]` - where file resources land
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory for `user_ulimit` files; `~` and `$VAR` are expanded
    pub limits_dir: Option<String>,
}

impl PathsConfig {
    pub fn limits_dir(&self) -> PathBuf {
        self.limits_dir
            .as_deref()
            .map_or_else(|| PathBuf::from(paths::DEFAULT_LIMITS_DIR), paths::expand)
    }
}

impl SousConfig {
    /// Load the config file from the default location, or an explicit path
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = paths::config_file()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        if config.run.jobs == 0 {
            anyhow::bail!("run.jobs must be at least 1");
        }
        Ok(config)
    }
}
