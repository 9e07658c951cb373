//! # Declarative
//!
//! A framework for declarative resource convergence.
//!
//! This crate provides the core abstractions for declaring desired state,
//! inspecting current state, and converging systems to match, with
//! idempotence and dry-run guarantees.
//!
//! ## Core Concepts
//!
//! - **ResourceSchema**: typed properties, defaults, coercions and allowed actions
//! - **ResourceInstance**: immutable declared desired state built from a schema
//! - **Provider**: platform-specific probe/apply logic for a resource type
//! - **ProviderRegistry**: maps (resource type, platform) to a provider factory
//! - **Executor**: probe, diff and apply for a single resource
//! - **ConvergenceEngine**: runs an ordered plan and produces a [`RunReport`]
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Action, ConvergenceEngine, ConvergencePlan, EngineOptions, NoProgress,
//!     Platform, PropertyOptions, PropertyType, ProviderRegistry, ResourceInput,
//!     ResourceSchema,
//! };
//!
//! let schema = ResourceSchema::new("pacman_package", &[Action::Install, Action::Remove])
//!     .define("package_name", PropertyType::String, PropertyOptions::new().name_property().identity())
//!     .define("version", PropertyType::String, PropertyOptions::new());
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register("pacman_package", Platform::Arch, || Box::new(PacmanProvider::new()));
//!
//! let mut plan = ConvergencePlan::new();
//! plan.declare(&schema, ResourceInput::new("vim"), None);
//!
//! let options = EngineOptions { platform: Platform::Arch, ..EngineOptions::default() };
//! let report = ConvergenceEngine::new(registry, options).converge(&plan, &NoProgress);
//! std::process::exit(report.exit_code().into());
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`TemplateRenderer`]: renders template references to bytes
//! - [`ProgressCallback`]: receives per-resource progress from worker threads
//!
//! This keeps the engine free of any specific template language or UI.

pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod platform;
pub mod provider;
pub mod report;
pub mod resource;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback, TemplateRenderer};
pub use diff::{Change, Diff, DiffKind};
pub use engine::{ConvergenceEngine, ConvergencePlan, EngineOptions, PlanEntry};
pub use error::{ConvergeError, Result, ValidationError};
pub use executor::execute;
pub use platform::Platform;
pub use provider::{Provider, ProviderFactory, ProviderRegistry};
pub use report::{Outcome, ResourceReport, RunReport, RunSummary};
pub use resource::ResourceInstance;
pub use schema::{
    PropertyDef, PropertyDefault, PropertyOptions, PropertyType, ResolvedProperties,
    ResourceInput, ResourceSchema,
};
pub use types::{Action, CurrentState, DesiredState, Fields, Value};
