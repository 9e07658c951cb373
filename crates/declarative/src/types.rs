//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A property value, either supplied by the user or resolved by a schema.
///
/// Only strings and integers are valid property types. The other kinds
/// exist so that user input can be checked and rejected with a precise
/// type mismatch instead of a parse error. TOML datetimes arrive as tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
    Float(f64),
    Array(Vec<Value>),
    Table(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the runtime kind, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Float(_) => "float",
            Self::Array(_) => "array",
            Self::Table(_) => "table",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Array(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Table(entries) => {
                let entries: Vec<String> = entries.iter().map(|(k, v)| format!("{k} = {v}")).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// Ordered field map describing observed or desired state
pub type Fields = BTreeMap<String, Value>;

/// Actions a resource can declare.
///
/// Each resource schema allows a subset of these; declaring anything else
/// is rejected when the resource instance is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Upgrade,
    Remove,
    Purge,
    Create,
    Delete,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Install,
        Action::Upgrade,
        Action::Remove,
        Action::Purge,
        Action::Create,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Remove => "remove",
            Self::Purge => "purge",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }

    /// Parse an action name as written in a run list
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Whether the action converges towards absence
    pub fn is_removal(&self) -> bool {
        matches!(self, Self::Remove | Self::Purge | Self::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a resource target, as returned by a provider probe
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentState {
    /// Target does not exist (package not installed, file missing)
    NotPresent,
    /// Target exists with the given observed fields
    Present(Fields),
}

impl CurrentState {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Get an observed field, if the target is present and reports it
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Present(fields) => fields.get(name),
            Self::NotPresent => None,
        }
    }
}

/// State a provider wants the target to be in after convergence
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredState {
    /// Target must not exist
    Absent,
    /// Target must exist; listed fields must match
    Present(Fields),
}

impl DesiredState {
    /// Present with no field constraints
    pub fn present() -> Self {
        Self::Present(Fields::new())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Present(fields) => fields.get(name),
            Self::Absent => None,
        }
    }
}
