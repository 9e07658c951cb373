//! Error taxonomy for convergence.
//!
//! Validation errors are raised before any I/O and abort only the resource
//! they belong to. Probe, apply and timeout errors are raised by providers and
//! are turned into failed outcomes by the executor, never past the engine.

use crate::platform::Platform;
use std::time::Duration;
use thiserror::Error;

/// A resource declaration was rejected before any provider was invoked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Supplied value's runtime type is not in the declared type set
    #[error("property '{property}' expects {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    /// Property is not defined by the resource schema
    #[error("{resource_type} has no property '{property}'")]
    UnknownProperty {
        resource_type: String,
        property: String,
    },

    /// Required property has neither a value nor a default
    #[error("required property '{property}' is missing")]
    MissingProperty { property: String },

    /// Derived defaults depend on each other
    #[error("default for '{property}' depends on itself")]
    DefaultCycle { property: String },

    /// Declared action is outside the schema's allowed set
    #[error("{resource_type} does not support action '{action}' (allowed: {allowed})")]
    UnsupportedAction {
        resource_type: String,
        action: String,
        allowed: String,
    },

    /// Another resource of the same type already claimed this identity
    #[error("duplicate resource {key}")]
    DuplicateResource { key: String },

    /// No schema registered for this resource type
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    /// A required resource is not declared earlier in the run
    #[error("{key} requires {dependency}, which is not declared before it")]
    UnknownDependency { key: String, dependency: String },

    /// No provider registered for this resource type on this platform
    #[error("no provider for {resource_type} on {platform}")]
    NoProvider {
        resource_type: String,
        platform: Platform,
    },

    /// The schema definition itself is inconsistent
    #[error("invalid schema for {resource_type}: {message}")]
    InvalidSchema {
        resource_type: String,
        message: String,
    },
}

/// Errors surfaced while converging a single resource
#[derive(Debug, Clone, Error)]
pub enum ConvergeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Inspecting current state failed (not a missing target)
    #[error("probe failed: {message}")]
    Probe { message: String },

    /// The side effect failed
    #[error("apply failed: {message}")]
    Apply {
        message: String,
        /// Captured stderr when the failure came from a subprocess
        stderr: Option<String>,
    },

    /// The action exceeded its time budget and was cancelled
    #[error("timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },
}

impl ConvergeError {
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    pub fn apply(message: impl Into<String>) -> Self {
        Self::Apply {
            message: message.into(),
            stderr: None,
        }
    }

    /// Short category label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Probe { .. } => "probe",
            Self::Apply { .. } => "apply",
            Self::Timeout { .. } => "timeout",
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Apply { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

/// Result type for convergence operations
pub type Result<T, E = ConvergeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: ConvergeError = ValidationError::DuplicateResource {
            key: "pacman_package[vim]".into(),
        }
        .into();
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.to_string(), "duplicate resource pacman_package[vim]");

        let err = ConvergeError::Timeout {
            after: Duration::from_secs(30),
        };
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.to_string(), "timed out after 30s");
    }

    #[test]
    fn test_apply_error_keeps_stderr() {
        let err = ConvergeError::Apply {
            message: "pacman exited with status 1".into(),
            stderr: Some("error: target not found: vim".into()),
        };
        assert_eq!(err.stderr(), Some("error: target not found: vim"));
        assert_eq!(ConvergeError::apply("boom").stderr(), None);
    }
}
