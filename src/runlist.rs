//! Run lists - ordered resource declarations in TOML
//!
//! ```toml
//! [[resource]]
//! type = "pacman_package"
//! name = "vim"
//! version = "9.1.0016-1"
//!
//! [[resource]]
//! type = "user_ulimit"
//! name = "tomcat"
//! action = "create"
//! filehandle_limit = 8192
//! requires = ["pacman_package[vim]"]
//! ```
//!
//! `type`, `name`, `action`, `sensitive` and `requires` are reserved; every
//! other key is a resource property checked later against the type's schema.

use anyhow::{Context, Result};
use declarative::{ResourceInput, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed run list, in declaration order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunList {
    #[serde(rename = "resource", default)]
    pub resources: Vec<Declaration>,
}

/// One `[[resource]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Action name; the type's default action when omitted
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl Declaration {
    /// Convert into engine input
    pub fn input(&self) -> ResourceInput {
        ResourceInput {
            name: self.name.clone(),
            properties: self.properties.clone(),
            sensitive: self.sensitive,
            requires: self.requires.clone(),
        }
    }
}

impl RunList {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read run list {}", path.display()))?;
        let run_list = Self::parse(&content)
            .with_context(|| format!("Invalid run list {}", path.display()))?;
        log::debug!(
            "Loaded {} resources from {}",
            run_list.len(),
            path.display()
        );
        Ok(run_list)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
