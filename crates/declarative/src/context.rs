//! Apply context and collaborator traits
//!
//! These traits let the engine run without depending on a specific
//! template language or terminal UI.

use crate::report::Outcome;
use crate::types::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Renders a template reference against resource variables.
///
/// Implementations must be pure: the same template and variables always
/// produce the same bytes, and rendering has no side effects.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, variables: &BTreeMap<String, Value>) -> anyhow::Result<Vec<u8>>;
}

/// Progress callback for convergence runs
///
/// Called from worker threads, so implementations take `&self` and must be
/// thread-safe.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any resource is processed
    fn on_run_start(&self, total: usize);

    /// Called when a worker starts converging a resource
    fn on_resource_start(&self, key: &str);

    /// Called when a resource reaches its final outcome
    fn on_resource_complete(&self, key: &str, outcome: &Outcome);

    /// Called once after every resource has an outcome
    fn on_run_complete(&self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_run_start(&self, _total: usize) {}
    fn on_resource_start(&self, _key: &str) {}
    fn on_resource_complete(&self, _key: &str, _outcome: &Outcome) {}
    fn on_run_complete(&self) {}
}

/// Context passed to provider operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether this is a dry run (providers must not mutate state)
    pub dry_run: bool,
    /// Budget for a single side effect, `None` for unbounded
    pub timeout: Option<Duration>,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            timeout: None,
            verbose,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
