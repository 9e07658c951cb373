//! Platform detection for provider selection.
//!
//! Providers are registered per (resource type, platform). Detection looks at
//! the compile-time OS and, on Linux, at `/etc/os-release` to tell Arch-based
//! distributions apart from the rest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Arch Linux and derivatives (pacman)
    Arch,
    /// Solaris and illumos (SVR4 packaging)
    Solaris,
    /// Any other Linux distribution
    Linux,
    Macos,
    Windows,
    /// Wildcard used for providers that work everywhere
    Any,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arch => "arch",
            Self::Solaris => "solaris",
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the platform this process runs on.
///
/// | `std::env::consts::OS` | os-release        | Platform  |
/// |------------------------|-------------------|-----------|
/// | linux                  | `ID`/`ID_LIKE` arch | Arch    |
/// | linux                  | anything else     | Linux     |
/// | solaris, illumos       | -                 | Solaris   |
/// | macos                  | -                 | Macos     |
/// | windows                | -                 | Windows   |
pub fn detect() -> Platform {
    match std::env::consts::OS {
        "linux" => {
            let release = std::fs::read_to_string("/etc/os-release").unwrap_or_default();
            let platform = parse_os_release(&release);
            log::debug!("Detected linux platform: {platform}");
            platform
        }
        "solaris" | "illumos" => Platform::Solaris,
        "macos" => Platform::Macos,
        "windows" => Platform::Windows,
        other => {
            log::debug!("Unrecognized OS '{other}', using wildcard platform");
            Platform::Any
        }
    }
}

/// Classify a Linux system from the contents of `/etc/os-release`
pub fn parse_os_release(content: &str) -> Platform {
    let is_arch = content.lines().any(|line| {
        let Some((key, value)) = line.split_once('=') else {
            return false;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "ID" => value == "arch",
            "ID_LIKE" => value.split_whitespace().any(|id| id == "arch"),
            _ => false,
        }
    });

    if is_arch { Platform::Arch } else { Platform::Linux }
}
