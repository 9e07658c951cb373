//! Provider trait and registry
//!
//! A [`Provider`] holds the platform-specific logic for one resource type:
//! it inspects current state and performs side effects. Providers are
//! stateless and looked up per (resource type, platform) in a
//! [`ProviderRegistry`] that is handed to the engine at construction.

use crate::context::ApplyContext;
use crate::error::Result;
use crate::platform::Platform;
use crate::resource::ResourceInstance;
use crate::types::{Action, CurrentState, DesiredState, Value};
use std::collections::HashMap;

/// Platform-specific convergence logic for a resource type
pub trait Provider: Send + Sync {
    /// Provider name for logs and reports (e.g. "pacman")
    fn name(&self) -> &'static str;

    /// Key of the underlying system object this resource touches.
    ///
    /// Resources with the same target key are never converged concurrently.
    /// Defaults to the resource key.
    fn target_key(&self, resource: &ResourceInstance) -> String {
        resource.key()
    }

    /// Inspect the current state of the target.
    ///
    /// Must not mutate anything. A missing target is `CurrentState::NotPresent`,
    /// never an error; errors are reserved for failures to inspect at all.
    fn probe(&self, resource: &ResourceInstance, ctx: &ApplyContext) -> Result<CurrentState>;

    /// Compute the state the target should be in for the resource's action
    fn desired(
        &self,
        resource: &ResourceInstance,
        current: &CurrentState,
        ctx: &ApplyContext,
    ) -> Result<DesiredState>;

    /// Whether an observed field satisfies a desired field.
    ///
    /// Defaults to structural equality. Package providers override this to
    /// compare versions with the package system's ordering.
    fn field_matches(
        &self,
        action: Action,
        field: &str,
        desired: &Value,
        current: Option<&Value>,
    ) -> bool {
        let _ = (action, field);
        current == Some(desired)
    }

    /// Perform the side effect that moves `current` to `desired`.
    ///
    /// Only called when a change is needed and the run is not a dry run.
    fn apply(
        &self,
        resource: &ResourceInstance,
        desired: &DesiredState,
        current: &CurrentState,
        ctx: &ApplyContext,
    ) -> Result<()>;
}

/// Constructs a provider on demand
pub type ProviderFactory = Box<dyn Fn() -> Box<dyn Provider> + Send + Sync>;

/// Maps (resource type, platform) to a provider factory
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<(String, Platform), ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory. Use `Platform::Any` for providers that
    /// work on every platform. A later registration replaces an earlier one.
    pub fn register<F>(&mut self, resource_type: &str, platform: Platform, factory: F)
    where
        F: Fn() -> Box<dyn Provider> + Send + Sync + 'static,
    {
        log::debug!("Registering provider for {resource_type} on {platform}");
        self.factories
            .insert((resource_type.to_string(), platform), Box::new(factory));
    }

    /// Construct the provider for a resource type on a platform.
    ///
    /// An exact platform match wins over a `Platform::Any` registration.
    pub fn resolve(&self, resource_type: &str, platform: Platform) -> Option<Box<dyn Provider>> {
        self.factory(resource_type, platform).map(|factory| factory())
    }

    /// Whether a provider exists for the resource type on the platform
    pub fn supports(&self, resource_type: &str, platform: Platform) -> bool {
        self.factory(resource_type, platform).is_some()
    }

    /// Registered (resource type, platform) pairs, sorted
    pub fn entries(&self) -> Vec<(String, Platform)> {
        let mut entries: Vec<_> = self.factories.keys().cloned().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.as_str().cmp(b.1.as_str())));
        entries
    }

    fn factory(&self, resource_type: &str, platform: Platform) -> Option<&ProviderFactory> {
        let key = |p: Platform| (resource_type.to_string(), p);
        self.factories
            .get(&key(platform))
            .or_else(|| self.factories.get(&key(Platform::Any)))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("entries", &self.entries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Provider for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn probe(&self, _: &ResourceInstance, _: &ApplyContext) -> Result<CurrentState> {
            Ok(CurrentState::NotPresent)
        }

        fn desired(
            &self,
            _: &ResourceInstance,
            _: &CurrentState,
            _: &ApplyContext,
        ) -> Result<DesiredState> {
            Ok(DesiredState::present())
        }

        fn apply(
            &self,
            _: &ResourceInstance,
            _: &DesiredState,
            _: &CurrentState,
            _: &ApplyContext,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_exact_platform_wins_over_any() {
        let mut registry = ProviderRegistry::new();
        registry.register("package", Platform::Any, || Box::new(Named("generic")));
        registry.register("package", Platform::Arch, || Box::new(Named("pacman")));

        let arch = registry.resolve("package", Platform::Arch).unwrap();
        assert_eq!(arch.name(), "pacman");

        let other = registry.resolve("package", Platform::Solaris).unwrap();
        assert_eq!(other.name(), "generic");
    }

    #[test]
    fn test_missing_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register("pacman_package", Platform::Arch, || Box::new(Named("pacman")));

        assert!(registry.supports("pacman_package", Platform::Arch));
        assert!(!registry.supports("pacman_package", Platform::Solaris));
        assert!(registry.resolve("user_ulimit", Platform::Arch).is_none());
    }

    #[test]
    fn test_entries_sorted() {
        let mut registry = ProviderRegistry::new();
        registry.register("b", Platform::Any, || Box::new(Named("b")));
        registry.register("a", Platform::Solaris, || Box::new(Named("a")));
        registry.register("a", Platform::Arch, || Box::new(Named("a")));

        assert_eq!(
            registry.entries(),
            vec![
                ("a".to_string(), Platform::Arch),
                ("a".to_string(), Platform::Solaris),
                ("b".to_string(), Platform::Any),
            ]
        );
    }
}
