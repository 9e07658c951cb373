//! Package resources (`pacman_package`, `solaris_package`)

use declarative::{Action, PropertyOptions, PropertyType, ResourceSchema, Value};

pub const PACMAN_PACKAGE: &str = "pacman_package";
pub const SOLARIS_PACKAGE: &str = "solaris_package";

/// `pacman_package` - packages on Arch Linux
pub fn pacman_package() -> ResourceSchema {
    package_schema(
        ResourceSchema::new(
            PACMAN_PACKAGE,
            &[Action::Install, Action::Upgrade, Action::Remove, Action::Purge],
        )
        .describe("Manage packages with pacman on Arch Linux"),
    )
}

/// `solaris_package` - SVR4 packages on Solaris
pub fn solaris_package() -> ResourceSchema {
    package_schema(
        ResourceSchema::new(
            SOLARIS_PACKAGE,
            &[Action::Install, Action::Upgrade, Action::Remove],
        )
        .describe("Manage SVR4 packages on Solaris"),
    )
    .define(
        "source",
        PropertyType::String,
        PropertyOptions::new().describe("Package datastream or directory passed to pkgadd -d"),
    )
}

/// Properties every package resource shares
fn package_schema(schema: ResourceSchema) -> ResourceSchema {
    schema
        .define(
            "package_name",
            PropertyType::String,
            PropertyOptions::new()
                .identity()
                .name_property()
                .describe("Package name, if it differs from the resource name"),
        )
        .define(
            "version",
            PropertyType::String,
            PropertyOptions::new().describe("Version to install or upgrade to"),
        )
        .define(
            "options",
            PropertyType::String,
            PropertyOptions::new().describe("Extra package manager arguments"),
        )
        .define(
            "timeout",
            PropertyType::StringOrInteger,
            PropertyOptions::new()
                .coerce(seconds)
                .describe("Seconds before the package manager is killed"),
        )
}

/// `"600"` becomes `600`; anything unparsable is kept for the provider to reject
fn seconds(value: Value) -> Value {
    match value {
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::String(s),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ResourceInput, ValidationError};

    #[test]
    fn test_schemas_are_valid() {
        pacman_package().validate().unwrap();
        solaris_package().validate().unwrap();
    }

    #[test]
    fn test_package_name_defaults_to_resource_name() {
        let vim = pacman_package()
            .instantiate(ResourceInput::new("vim"), None)
            .unwrap();
        assert_eq!(vim.identity(), "vim");
        assert_eq!(vim.action(), Action::Install);
        assert_eq!(vim.key(), "pacman_package[vim]");
    }

    #[test]
    fn test_explicit_package_name_is_identity() {
        let editor = pacman_package()
            .instantiate(ResourceInput::new("editor").with("package_name", "vim"), None)
            .unwrap();
        assert_eq!(editor.name(), "editor");
        assert_eq!(editor.identity(), "vim");
    }

    #[test]
    fn test_timeout_string_is_coerced() {
        let vim = pacman_package()
            .instantiate(ResourceInput::new("vim").with("timeout", "600"), None)
            .unwrap();
        assert_eq!(vim.property("timeout"), Some(&Value::Integer(600)));

        let vim = pacman_package()
            .instantiate(ResourceInput::new("vim").with("timeout", 30), None)
            .unwrap();
        assert_eq!(vim.property("timeout"), Some(&Value::Integer(30)));
    }

    #[test]
    fn test_version_must_be_a_string() {
        let err = pacman_package()
            .instantiate(ResourceInput::new("vim").with("version", 9), None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_solaris_has_no_purge() {
        let err = solaris_package()
            .instantiate(ResourceInput::new("SUNWbash"), Some(Action::Purge))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedAction {
                resource_type: "solaris_package".to_string(),
                action: "purge".to_string(),
                allowed: "install, upgrade, remove".to_string(),
            }
        );
    }

    #[test]
    fn test_source_only_on_solaris() {
        solaris_package()
            .instantiate(ResourceInput::new("SUNWbash").with("source", "/tmp/bash.pkg"), None)
            .unwrap();

        let err = pacman_package()
            .instantiate(ResourceInput::new("vim").with("source", "/tmp/vim.pkg"), None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProperty { .. }));
    }
}
