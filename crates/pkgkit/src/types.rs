//! Core types for package operations.

use serde::{Deserialize, Serialize};

/// An installed package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Installed version, in the package system's own format
    pub version: String,
}

/// A request to act on a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRequest {
    /// Package name
    pub name: String,
    /// Requested version, if any
    pub version: Option<String>,
    /// Package source (datastream or spool directory) for `pkgadd -d`
    pub source: Option<String>,
    /// Extra arguments passed to the package manager
    pub options: Vec<String>,
}

impl PackageRequest {
    /// Create a request for a package by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the requested version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the package source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add extra arguments, split on whitespace.
    pub fn with_options(mut self, options: &str) -> Self {
        self.options
            .extend(options.split_whitespace().map(ToString::to_string));
        self
    }
}
