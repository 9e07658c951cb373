//! Structural diff between desired and observed state

use crate::types::{CurrentState, DesiredState, Fields, Value};
use serde::Serialize;
use std::fmt;

/// Placeholder shown instead of values of sensitive resources
pub const REDACTED: &str = "(sensitive)";

/// A single field that differs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub field: String,
    /// Observed value, `None` when the target or field is absent
    pub from: Option<Value>,
    /// Desired value, `None` when the target should be absent
    pub to: Option<Value>,
}

/// Shape of the change needed to converge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Target is absent and must be created
    Create,
    /// Target exists but some fields differ
    Modify,
    /// Target exists and must be removed
    Remove,
}

/// Difference between a desired state and a current state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diff {
    pub kind: DiffKind,
    pub changes: Vec<Change>,
}

impl Diff {
    /// Compute the diff between desired and current state.
    ///
    /// `matches(field, desired, current)` decides field equality so providers
    /// can apply their own ordering (package versions). Returns `None` when the
    /// current state already satisfies the desired state.
    pub fn between(
        desired: &DesiredState,
        current: &CurrentState,
        matches: impl Fn(&str, &Value, Option<&Value>) -> bool,
    ) -> Option<Self> {
        match (desired, current) {
            (DesiredState::Absent, CurrentState::NotPresent) => None,
            (DesiredState::Absent, CurrentState::Present(fields)) => Some(Self {
                kind: DiffKind::Remove,
                changes: fields
                    .iter()
                    .map(|(field, value)| Change {
                        field: field.clone(),
                        from: Some(value.clone()),
                        to: None,
                    })
                    .collect(),
            }),
            (DesiredState::Present(fields), CurrentState::NotPresent) => Some(Self {
                kind: DiffKind::Create,
                changes: fields
                    .iter()
                    .map(|(field, value)| Change {
                        field: field.clone(),
                        from: None,
                        to: Some(value.clone()),
                    })
                    .collect(),
            }),
            (DesiredState::Present(wanted), CurrentState::Present(observed)) => {
                let changes = modified_fields(wanted, observed, matches);
                if changes.is_empty() {
                    None
                } else {
                    Some(Self {
                        kind: DiffKind::Modify,
                        changes,
                    })
                }
            }
        }
    }

    /// Copy of this diff with all values replaced by [`REDACTED`]
    pub fn redacted(&self) -> Self {
        let hide = |v: &Option<Value>| v.as_ref().map(|_| Value::from(REDACTED));
        Self {
            kind: self.kind,
            changes: self
                .changes
                .iter()
                .map(|c| Change {
                    field: c.field.clone(),
                    from: hide(&c.from),
                    to: hide(&c.to),
                })
                .collect(),
        }
    }
}

fn modified_fields(
    wanted: &Fields,
    observed: &Fields,
    matches: impl Fn(&str, &Value, Option<&Value>) -> bool,
) -> Vec<Change> {
    wanted
        .iter()
        .filter(|(field, value)| !matches(field, value, observed.get(field.as_str())))
        .map(|(field, value)| Change {
            field: field.clone(),
            from: observed.get(field).cloned(),
            to: Some(value.clone()),
        })
        .collect()
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "(none)".to_string(),
        };
        write!(f, "{}: {} -> {}", self.field, show(&self.from), show(&self.to))
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            DiffKind::Create => "create",
            DiffKind::Modify => "modify",
            DiffKind::Remove => "remove",
        };
        if self.changes.is_empty() {
            return f.write_str(verb);
        }
        let changes: Vec<String> = self.changes.iter().map(ToString::to_string).collect();
        write!(f, "{verb} ({})", changes.join(", "))
    }
}
