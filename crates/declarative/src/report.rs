//! Convergence outcomes and the run report

use crate::diff::Diff;
use crate::error::ConvergeError;
use crate::types::Action;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Final outcome of converging one resource
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    /// Current state already matched
    Unchanged,
    /// Target was absent and has been created
    Created { diff: Diff },
    /// Target was modified; also the simulated outcome of a dry run
    Updated { diff: Diff },
    /// Target has been removed
    Deleted { diff: Diff },
    /// Validation, probe, apply or timeout failure
    Failed {
        #[serde(serialize_with = "error_message")]
        error: ConvergeError,
    },
    /// Not attempted
    Skipped { reason: String },
}

fn error_message<S: Serializer>(error: &ConvergeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl Outcome {
    pub fn failed(error: impl Into<ConvergeError>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Check if the outcome represents a (possibly simulated) change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Updated { .. } | Self::Deleted { .. }
        )
    }

    /// Whether dependents of this resource may run
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. } | Self::Skipped { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    pub fn diff(&self) -> Option<&Diff> {
        match self {
            Self::Created { diff } | Self::Updated { diff } | Self::Deleted { diff } => Some(diff),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ConvergeError> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Outcome of one resource within a run
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    /// `type[identity]`, or `type[name]` when the declaration was rejected
    pub key: String,
    pub resource_type: String,
    pub identity: String,
    /// `None` when the declared action could not be parsed
    pub action: Option<Action>,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// Report for a whole convergence run, in declaration order
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub resources: Vec<ResourceReport>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for resource in &self.resources {
            summary.add_outcome(&resource.outcome);
        }
        summary
    }

    /// True when no resource failed
    pub fn is_success(&self) -> bool {
        !self.resources.iter().any(|r| r.outcome.is_failure())
    }

    /// Process exit status: 0 when nothing failed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceReport> {
        self.resources.iter().filter(|r| r.outcome.is_failure())
    }

    /// Look up a resource report by key
    pub fn get(&self, key: &str) -> Option<&ResourceReport> {
        self.resources.iter().find(|r| r.key == key)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub unchanged: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Total number of changes (applied or simulated)
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.total_changes() + self.failed + self.skipped
    }

    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Created { .. } => self.created += 1,
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Deleted { .. } => self.deleted += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffKind;

    fn entry(key: &str, outcome: Outcome) -> ResourceReport {
        ResourceReport {
            key: key.to_string(),
            resource_type: "test".to_string(),
            identity: key.to_string(),
            action: Some(Action::Create),
            outcome,
            duration_ms: 0,
        }
    }

    fn report(resources: Vec<ResourceReport>) -> RunReport {
        let now = Utc::now();
        RunReport {
            started_at: now,
            finished_at: now,
            dry_run: false,
            resources,
        }
    }

    fn created() -> Outcome {
        Outcome::Created {
            diff: Diff {
                kind: DiffKind::Create,
                changes: Vec::new(),
            },
        }
    }

    #[test]
    fn test_summary_and_exit_code() {
        let run = report(vec![
            entry("a", created()),
            entry("b", Outcome::failed(ConvergeError::apply("boom"))),
            entry("c", Outcome::Unchanged),
        ]);

        let summary = run.summary();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.total(), 3);
        assert!(!run.is_success());
        assert_eq!(run.exit_code(), 1);
        assert_eq!(run.failures().count(), 1);
    }

    #[test]
    fn test_successful_run_exits_zero() {
        let run = report(vec![entry("a", Outcome::Unchanged), entry("b", created())]);
        assert_eq!(run.exit_code(), 0);
        assert!(run.get("b").unwrap().outcome.is_change());
    }

    #[test]
    fn test_outcome_serializes_error_message() {
        let outcome = Outcome::failed(ConvergeError::apply("exit status 1"));
        let json = serde_json::to_value(entry("a", outcome)).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "apply failed: exit status 1");
        assert_eq!(json["action"], "create");
    }

    #[test]
    fn test_skipped_is_not_success() {
        let skipped = Outcome::Skipped {
            reason: "stop on failure".into(),
        };
        assert!(!skipped.is_success());
        assert!(!skipped.is_failure());
        assert!(Outcome::Unchanged.is_success());
    }
}
