//! Centralized path resolution for sous
//!
//! # Environment Variables
//!
//! - `SOUS_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/sous`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `SOUS_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/sous` (if set)
//! 3. `~/.config/sous`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "SOUS_CONFIG_DIR";

/// Default directory for `user_ulimit` drop-in files
pub const DEFAULT_LIMITS_DIR: &str = "/etc/security/limits.d";

/// Get the sous config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("sous");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("sous");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the config file path (`config.toml` in the config directory)
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Expand ~ and environment variables in a path string.
///
/// ```ignore
/// let limits = paths::expand("~/limits.d");
/// let run_list = paths::expand("$HOME/${HOST}/run.toml");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
