//! Resource instances - immutable declared desired state
//!
//! A [`ResourceInstance`] is built once by [`ResourceSchema::instantiate`]
//! and only ever read afterwards. Providers observe it and produce separate
//! current-state snapshots; nothing in the engine hands out `&mut` access.
//!
//! [`ResourceSchema::instantiate`]: crate::schema::ResourceSchema::instantiate

use crate::schema::ResolvedProperties;
use crate::types::{Action, Fields, Value};
use std::fmt;

/// A declared resource with resolved properties and a validated action
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInstance {
    resource_type: &'static str,
    name: String,
    identity: String,
    action: Action,
    properties: ResolvedProperties,
    sensitive: bool,
    requires: Vec<String>,
    allowed_actions: Vec<Action>,
}

impl ResourceInstance {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        resource_type: &'static str,
        name: String,
        identity: String,
        action: Action,
        properties: ResolvedProperties,
        sensitive: bool,
        requires: Vec<String>,
        allowed_actions: Vec<Action>,
    ) -> Self {
        Self {
            resource_type,
            name,
            identity,
            action,
            properties,
            sensitive,
            requires,
            allowed_actions,
        }
    }

    /// Resource type tag (e.g. "pacman_package")
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Resource block name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value that keys this resource within its type
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// String property accessor; `None` when unset or not a string
    pub fn string(&self, name: &str) -> Option<&str> {
        self.properties.string(name)
    }

    pub fn properties(&self) -> &Fields {
        self.properties.as_fields()
    }

    /// Whether property values must be kept out of logs and reports
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Keys of resources that must succeed before this one runs
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    pub fn allowed_actions(&self) -> &[Action] {
        &self.allowed_actions
    }

    /// Unique key within a run: `type[identity]`
    pub fn key(&self) -> String {
        format!("{}[{}]", self.resource_type, self.identity)
    }
}

impl fmt::Display for ResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key(), self.action)
    }
}
