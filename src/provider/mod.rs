//! Concrete providers and the registry sous hands to the engine

pub mod package;
pub mod template_file;

use declarative::{Platform, ProviderRegistry, ResourceInstance, Value};
use pkgkit::{PacmanBackend, SolarisBackend};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::resource::package::{PACMAN_PACKAGE, SOLARIS_PACKAGE};
use crate::resource::user_ulimit::{LIMIT_FAMILIES, USER_ULIMIT};
use crate::templates::{BuiltinTemplates, ULIMIT, ULIMIT_USER};
use package::PackageProvider;
use template_file::TemplateFileProvider;

/// Register every built-in provider
///
/// | Resource type     | Platform | Provider            |
/// |-------------------|----------|---------------------|
/// | `pacman_package`  | Arch     | pacman              |
/// | `solaris_package` | Solaris  | pkgadd/pkginfo/pkgrm |
/// | `user_ulimit`     | Any      | templated file      |
pub fn builtin_registry(limits_dir: PathBuf) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    registry.register(PACMAN_PACKAGE, Platform::Arch, || {
        Box::new(PackageProvider::new(Arc::new(PacmanBackend::new())))
    });
    registry.register(SOLARIS_PACKAGE, Platform::Solaris, || {
        Box::new(PackageProvider::new(Arc::new(SolarisBackend::new())))
    });
    registry.register(USER_ULIMIT, Platform::Any, move || {
        Box::new(TemplateFileProvider::new(
            "user_ulimit",
            limits_dir.clone(),
            ULIMIT,
            ulimit_variables,
            Arc::new(BuiltinTemplates),
        ))
    });

    registry
}

/// Template variables for a `user_ulimit` resource
pub fn ulimit_variables(resource: &ResourceInstance) -> BTreeMap<String, Value> {
    let mut variables = BTreeMap::new();
    if let Some(user) = resource.property("username") {
        variables.insert(ULIMIT_USER.to_string(), user.clone());
    }
    for family in LIMIT_FAMILIES {
        for name in family.properties() {
            if let Some(value) = resource.property(&name) {
                variables.insert(name, value.clone());
            }
        }
    }
    variables
}
