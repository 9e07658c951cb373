//! Built-in resource types
//!
//! Every resource type sous understands is a [`ResourceSchema`] in the
//! [`Catalog`]. The catalog turns a run list into a [`ConvergencePlan`];
//! declarations that cannot be built stay in the plan as rejected entries so
//! they are reported at their position instead of aborting the run.

pub mod package;
pub mod user_ulimit;

use declarative::{Action, ConvergencePlan, ResourceSchema, ValidationError};

use crate::runlist::RunList;

/// All resource schemas known to sous
#[derive(Debug, Clone)]
pub struct Catalog {
    schemas: Vec<ResourceSchema>,
}

impl Catalog {
    /// Catalog with every built-in resource type
    pub fn builtin() -> Self {
        Self {
            schemas: vec![
                package::pacman_package(),
                package::solaris_package(),
                user_ulimit::user_ulimit(),
            ],
        }
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.schemas
            .iter()
            .find(|s| s.resource_type() == resource_type)
    }

    pub fn schemas(&self) -> &[ResourceSchema] {
        &self.schemas
    }

    /// Build a plan from a run list, keeping declaration order
    pub fn plan(&self, run_list: &RunList) -> ConvergencePlan {
        let mut plan = ConvergencePlan::new();

        for declaration in &run_list.resources {
            let Some(schema) = self.get(&declaration.resource_type) else {
                plan.reject(
                    declaration.resource_type.as_str(),
                    declaration.name.as_str(),
                    declaration.action.as_deref().and_then(Action::parse),
                    ValidationError::UnknownResourceType(declaration.resource_type.clone()),
                );
                continue;
            };

            let action = match declaration.action.as_deref() {
                None => None,
                Some(name) => match Action::parse(name) {
                    Some(action) => Some(action),
                    None => {
                        plan.reject(
                            schema.resource_type(),
                            declaration.name.as_str(),
                            None,
                            schema.unsupported_action(name),
                        );
                        continue;
                    }
                },
            };

            plan.declare(schema, declaration.input(), action);
        }

        log::debug!("Planned {} resources", plan.len());
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::PlanEntry;

    fn plan_of(toml: &str) -> ConvergencePlan {
        Catalog::builtin().plan(&RunList::parse(toml).unwrap())
    }

    fn rejection(entry: &PlanEntry) -> &ValidationError {
        match entry {
            PlanEntry::Rejected { error, .. } => error,
            PlanEntry::Declared(resource) => panic!("{resource} was not rejected"),
        }
    }

    #[test]
    fn test_builtin_schemas_are_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.schemas().len(), 3);
        for schema in catalog.schemas() {
            schema.validate().unwrap();
        }
        assert!(catalog.get("pacman_package").is_some());
        assert!(catalog.get("apt_package").is_none());
    }

    #[test]
    fn test_plan_keeps_order() {
        let plan = plan_of(
            r#"
[[resource]]
type = "user_ulimit"
name = "*"

[[resource]]
type = "pacman_package"
name = "vim"
action = "upgrade"
"#,
        );
        assert_eq!(plan.len(), 2);
        match &plan.entries()[1] {
            PlanEntry::Declared(resource) => {
                assert_eq!(resource.key(), "pacman_package[vim]");
                assert_eq!(resource.action(), Action::Upgrade);
            }
            PlanEntry::Rejected { error, .. } => panic!("unexpected rejection: {error}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let plan = plan_of("[[resource]]\ntype = \"apt_package\"\nname = \"vim\"\n");
        assert_eq!(
            rejection(&plan.entries()[0]),
            &ValidationError::UnknownResourceType("apt_package".to_string())
        );
    }

    #[test]
    fn test_unknown_action_is_unsupported() {
        let plan = plan_of(
            "[[resource]]\ntype = \"pacman_package\"\nname = \"vim\"\naction = \"reinstall\"\n",
        );
        match rejection(&plan.entries()[0]) {
            ValidationError::UnsupportedAction { action, .. } => assert_eq!(action, "reinstall"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_property_is_rejected_in_place() {
        let plan = plan_of(
            r#"
[[resource]]
type = "pacman_package"
name = "vim"

[[resource]]
type = "user_ulimit"
name = "tomcat"
filehandle_limit = true
"#,
        );
        assert!(matches!(plan.entries()[0], PlanEntry::Declared(_)));
        assert!(matches!(
            rejection(&plan.entries()[1]),
            ValidationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_array_property_rejects_only_its_resource() {
        let plan = plan_of(
            r#"
[[resource]]
type = "pacman_package"
name = "vim"

[[resource]]
type = "user_ulimit"
name = "tomcat"
filehandle_limit = [8192]
"#,
        );
        assert_eq!(plan.len(), 2);
        assert!(matches!(plan.entries()[0], PlanEntry::Declared(_)));
        assert_eq!(
            rejection(&plan.entries()[1]),
            &ValidationError::TypeMismatch {
                property: "filehandle_limit".to_string(),
                expected: "string or integer".to_string(),
                actual: "array".to_string(),
            }
        );
    }
}
