//! Property schemas - typed, validated attributes for a resource type.
//!
//! A [`ResourceSchema`] is an ordered list of property definitions plus the
//! set of actions the resource type supports. Resolving user input against a
//! schema runs, in order:
//!
//! 1. unknown-property and type checks
//! 2. coercion of supplied values
//! 3. default substitution (constants, the resource name, or values derived
//!    from other resolved properties)
//! 4. required-property and identity extraction
//!
//! Instances are built with [`ResourceSchema::instantiate`], which also checks
//! the declared action before touching any property.

use crate::error::ValidationError;
use crate::resource::ResourceInstance;
use crate::types::{Action, Fields, Value};
use std::collections::BTreeMap;

/// Semantic type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Integer,
    /// Either a string or an integer (e.g. ulimit values like `8192` or `"unlimited"`)
    StringOrInteger,
    /// A string restricted to the listed values
    Enum(&'static [&'static str]),
}

impl PropertyType {
    /// Check whether a runtime value belongs to this type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Integer, Value::Integer(_))
            | (Self::StringOrInteger, Value::String(_) | Value::Integer(_)) => true,
            (Self::Enum(allowed), Value::String(s)) => allowed.iter().any(|a| *a == s.as_str()),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::StringOrInteger => "string or integer".to_string(),
            Self::Enum(allowed) => format!("one of [{}]", allowed.join(", ")),
        }
    }
}

/// Pure, total conversion applied to supplied values that passed the type check
pub type Coercion = fn(Value) -> Value;

/// Pure function producing a default from the properties resolved so far
pub type DeriveFn = fn(&ResolvedProperties) -> Option<Value>;

/// How a property gets a value when the user does not supply one
#[derive(Debug, Clone, Default)]
pub enum PropertyDefault {
    #[default]
    None,
    Constant(Value),
    /// Use the resource block name
    ResourceName,
    /// Computed from other properties, which are resolved first
    Derived {
        depends_on: &'static [&'static str],
        derive: DeriveFn,
    },
}

/// Options for [`ResourceSchema::define`]
#[derive(Debug, Clone, Default)]
pub struct PropertyOptions {
    pub default: PropertyDefault,
    pub coerce: Option<Coercion>,
    pub identity: bool,
    pub required: bool,
    pub description: &'static str,
}

impl PropertyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the property as the resource's unique key
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Default the property to the resource block name
    pub fn name_property(mut self) -> Self {
        self.default = PropertyDefault::ResourceName;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn coerce(mut self, coerce: Coercion) -> Self {
        self.coerce = Some(coerce);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = PropertyDefault::Constant(value.into());
        self
    }

    pub fn derived(mut self, depends_on: &'static [&'static str], derive: DeriveFn) -> Self {
        self.default = PropertyDefault::Derived { depends_on, derive };
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// A single property definition
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
    pub options: PropertyOptions,
}

/// Property values after type checks, coercions and defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProperties {
    values: Fields,
}

impl ResolvedProperties {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a property as a string slice, if it holds a string
    pub fn string(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn as_fields(&self) -> &Fields {
        &self.values
    }

    fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }
}

/// User-supplied input for one resource declaration
#[derive(Debug, Clone, Default)]
pub struct ResourceInput {
    /// Resource block name
    pub name: String,
    pub properties: BTreeMap<String, Value>,
    /// Suppress value logging and redact values in reports
    pub sensitive: bool,
    /// Keys (`type[identity]`) of resources that must converge first
    pub requires: Vec<String>,
}

impl ResourceInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn requires(mut self, key: impl Into<String>) -> Self {
        self.requires.push(key.into());
        self
    }
}

/// Schema for one resource type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource_type: &'static str,
    description: &'static str,
    properties: Vec<PropertyDef>,
    allowed_actions: Vec<Action>,
    default_action: Action,
}

impl ResourceSchema {
    /// Start a schema. The first allowed action is the default action.
    pub fn new(resource_type: &'static str, allowed_actions: &[Action]) -> Self {
        Self {
            resource_type,
            description: "",
            properties: Vec::new(),
            allowed_actions: allowed_actions.to_vec(),
            default_action: allowed_actions.first().copied().unwrap_or(Action::Create),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Register a property. Declaration order is preserved.
    pub fn define(mut self, name: impl Into<String>, ty: PropertyType, options: PropertyOptions) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            ty,
            options,
        });
        self
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn allowed_actions(&self) -> &[Action] {
        &self.allowed_actions
    }

    pub fn default_action(&self) -> Action {
        self.default_action
    }

    fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn identity_property(&self) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.options.identity)
    }

    /// Check the schema definition for internal consistency
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidSchema {
            resource_type: self.resource_type.to_string(),
            message,
        };

        if self.allowed_actions.is_empty() {
            return Err(invalid("no allowed actions".to_string()));
        }

        let identities = self.properties.iter().filter(|p| p.options.identity).count();
        if identities > 1 {
            return Err(invalid(format!(
                "{identities} properties are marked as identity, expected at most one"
            )));
        }

        for (index, def) in self.properties.iter().enumerate() {
            if self.properties[..index].iter().any(|p| p.name == def.name) {
                return Err(invalid(format!("property '{}' defined twice", def.name)));
            }
            if let PropertyDefault::Derived { depends_on, .. } = &def.options.default
                && let Some(missing) = depends_on.iter().find(|d| self.property(d).is_none())
            {
                return Err(invalid(format!(
                    "default for '{}' depends on undefined property '{missing}'",
                    def.name
                )));
            }
        }

        Ok(())
    }

    /// Resolve user input into a complete property map
    pub fn resolve(&self, input: &ResourceInput) -> Result<ResolvedProperties, ValidationError> {
        let mut resolved = ResolvedProperties::default();

        for (name, value) in &input.properties {
            let def = self
                .property(name)
                .ok_or_else(|| ValidationError::UnknownProperty {
                    resource_type: self.resource_type.to_string(),
                    property: name.clone(),
                })?;

            if !def.ty.accepts(value) {
                return Err(ValidationError::TypeMismatch {
                    property: name.clone(),
                    expected: def.ty.describe(),
                    actual: match value {
                        Value::String(s) if matches!(def.ty, PropertyType::Enum(_)) => {
                            format!("'{s}'")
                        }
                        other => other.kind().to_string(),
                    },
                });
            }

            let value = match def.options.coerce {
                Some(coerce) => coerce(value.clone()),
                None => value.clone(),
            };
            resolved.insert(name, value);
        }

        let mut visiting = Vec::new();
        for def in &self.properties {
            self.fill_default(def, &input.name, &mut resolved, &mut visiting)?;
        }

        if let Some(missing) = self
            .properties
            .iter()
            .find(|p| p.options.required && !resolved.contains(&p.name))
        {
            return Err(ValidationError::MissingProperty {
                property: missing.name.clone(),
            });
        }

        Ok(resolved)
    }

    fn fill_default<'a>(
        &'a self,
        def: &'a PropertyDef,
        resource_name: &str,
        resolved: &mut ResolvedProperties,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), ValidationError> {
        if resolved.contains(&def.name) {
            return Ok(());
        }

        match &def.options.default {
            PropertyDefault::None => {}
            PropertyDefault::Constant(value) => resolved.insert(&def.name, value.clone()),
            PropertyDefault::ResourceName => {
                resolved.insert(&def.name, Value::String(resource_name.to_string()));
            }
            PropertyDefault::Derived { depends_on, derive } => {
                if visiting.contains(&def.name.as_str()) {
                    return Err(ValidationError::DefaultCycle {
                        property: def.name.clone(),
                    });
                }
                visiting.push(&def.name);
                for dependency in *depends_on {
                    if let Some(dep) = self.property(dependency) {
                        self.fill_default(dep, resource_name, resolved, visiting)?;
                    }
                }
                visiting.pop();

                if let Some(value) = derive(resolved) {
                    resolved.insert(&def.name, value);
                }
            }
        }

        Ok(())
    }

    /// Build an immutable resource instance.
    ///
    /// The action is checked first so an unsupported action fails without
    /// evaluating any property. `None` selects the schema's default action.
    pub fn instantiate(
        &self,
        input: ResourceInput,
        action: Option<Action>,
    ) -> Result<ResourceInstance, ValidationError> {
        let action = action.unwrap_or(self.default_action);
        if !self.allowed_actions.contains(&action) {
            return Err(self.unsupported_action(action.as_str()));
        }

        let properties = self.resolve(&input)?;

        let identity = match self.identity_property() {
            Some(def) => properties
                .get(&def.name)
                .map(ToString::to_string)
                .ok_or_else(|| ValidationError::MissingProperty {
                    property: def.name.clone(),
                })?,
            None => input.name.clone(),
        };

        Ok(ResourceInstance::new(
            self.resource_type,
            input.name,
            identity,
            action,
            properties,
            input.sensitive,
            input.requires,
            self.allowed_actions.clone(),
        ))
    }

    /// Error for an action name this schema does not allow
    pub fn unsupported_action(&self, action: &str) -> ValidationError {
        ValidationError::UnsupportedAction {
            resource_type: self.resource_type.to_string(),
            action: action.to_string(),
            allowed: self
                .allowed_actions
                .iter()
                .map(Action::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf_suffix(value: Value) -> Value {
        match value {
            Value::String(s) if !s.ends_with(".conf") => Value::String(format!("{s}.conf")),
            other => other,
        }
    }

    fn limits_schema() -> ResourceSchema {
        ResourceSchema::new("limits", &[Action::Create, Action::Delete])
            .define(
                "username",
                PropertyType::String,
                PropertyOptions::new().name_property().identity(),
            )
            .define(
                "filename",
                PropertyType::String,
                PropertyOptions::new().coerce(conf_suffix).derived(&["username"], |p| {
                    p.string("username")
                        .map(|u| Value::String(format!("{u}_limits.conf")))
                }),
            )
            .define("nofile", PropertyType::StringOrInteger, PropertyOptions::new())
            .define(
                "mode",
                PropertyType::Enum(&["strict", "relaxed"]),
                PropertyOptions::new().default_value("strict"),
            )
    }

    #[test]
    fn test_resolve_applies_defaults_in_dependency_order() {
        let schema = limits_schema();
        let resolved = schema.resolve(&ResourceInput::new("tomcat")).unwrap();

        assert_eq!(resolved.string("username"), Some("tomcat"));
        assert_eq!(resolved.string("filename"), Some("tomcat_limits.conf"));
        assert_eq!(resolved.string("mode"), Some("strict"));
        assert!(!resolved.contains("nofile"));
    }

    #[test]
    fn test_resolve_coerces_supplied_values() {
        let schema = limits_schema();
        let input = ResourceInput::new("tomcat").with("filename", "tomcat_filehandle");
        let resolved = schema.resolve(&input).unwrap();
        assert_eq!(resolved.string("filename"), Some("tomcat_filehandle.conf"));
    }

    #[test]
    fn test_resolve_accepts_string_or_integer() {
        let schema = limits_schema();
        let numeric = schema
            .resolve(&ResourceInput::new("a").with("nofile", 8192))
            .unwrap();
        assert_eq!(numeric.get("nofile"), Some(&Value::Integer(8192)));

        let text = schema
            .resolve(&ResourceInput::new("a").with("nofile", "unlimited"))
            .unwrap();
        assert_eq!(text.string("nofile"), Some("unlimited"));
    }

    #[test]
    fn test_resolve_rejects_wrong_type() {
        let schema = limits_schema();
        let mut input = ResourceInput::new("tomcat");
        input
            .properties
            .insert("nofile".into(), Value::Boolean(true));

        let err = schema.resolve(&input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                property: "nofile".into(),
                expected: "string or integer".into(),
                actual: "boolean".into(),
            }
        );
    }

    #[test]
    fn test_resolve_rejects_enum_outside_set() {
        let schema = limits_schema();
        let input = ResourceInput::new("tomcat").with("mode", "lenient");
        let err = schema.resolve(&input).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { ref property, .. } if property == "mode"));
    }

    #[test]
    fn test_resolve_rejects_unknown_property() {
        let schema = limits_schema();
        let input = ResourceInput::new("tomcat").with("nproc", 10);
        let err = schema.resolve(&input).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProperty { .. }));
    }

    #[test]
    fn test_resolve_missing_required() {
        let schema = ResourceSchema::new("thing", &[Action::Create]).define(
            "path",
            PropertyType::String,
            PropertyOptions::new().required(),
        );
        let err = schema.resolve(&ResourceInput::new("x")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingProperty {
                property: "path".into()
            }
        );
    }

    #[test]
    fn test_default_cycle_is_validation_error() {
        let schema = ResourceSchema::new("cyclic", &[Action::Create])
            .define(
                "a",
                PropertyType::String,
                PropertyOptions::new().derived(&["b"], |p| p.get("b").cloned()),
            )
            .define(
                "b",
                PropertyType::String,
                PropertyOptions::new().derived(&["a"], |p| p.get("a").cloned()),
            );

        let err = schema.resolve(&ResourceInput::new("x")).unwrap_err();
        assert!(matches!(err, ValidationError::DefaultCycle { .. }));
    }

    #[test]
    fn test_instantiate_identity_from_property() {
        let schema = limits_schema();
        let input = ResourceInput::new("Bump limits for tomcat").with("username", "tomcat");
        let resource = schema.instantiate(input, None).unwrap();

        assert_eq!(resource.identity(), "tomcat");
        assert_eq!(resource.name(), "Bump limits for tomcat");
        assert_eq!(resource.action(), Action::Create);
        assert_eq!(resource.key(), "limits[tomcat]");
    }

    #[test]
    fn test_instantiate_identity_defaults_to_name() {
        let schema = ResourceSchema::new("marker", &[Action::Create]);
        let resource = schema
            .instantiate(ResourceInput::new("first"), None)
            .unwrap();
        assert_eq!(resource.identity(), "first");
    }

    #[test]
    fn test_instantiate_rejects_unsupported_action() {
        let schema = limits_schema();
        let err = schema
            .instantiate(ResourceInput::new("tomcat"), Some(Action::Install))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedAction {
                resource_type: "limits".into(),
                action: "install".into(),
                allowed: "create, delete".into(),
            }
        );
    }

    #[test]
    fn test_unsupported_action_checked_before_properties() {
        let schema = limits_schema();
        let input = ResourceInput::new("tomcat").with("bogus", 1);
        let err = schema.instantiate(input, Some(Action::Upgrade)).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedAction { .. }));
    }

    #[test]
    fn test_validate_rejects_two_identities() {
        let schema = ResourceSchema::new("bad", &[Action::Create])
            .define("a", PropertyType::String, PropertyOptions::new().identity())
            .define("b", PropertyType::String, PropertyOptions::new().identity());
        assert!(matches!(
            schema.validate(),
            Err(ValidationError::InvalidSchema { .. })
        ));
        assert!(limits_schema().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_default_dependency() {
        let schema = ResourceSchema::new("bad", &[Action::Create]).define(
            "a",
            PropertyType::String,
            PropertyOptions::new().derived(&["missing"], |_| None),
        );
        assert!(schema.validate().is_err());
    }
}
