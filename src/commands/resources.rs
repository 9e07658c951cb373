//! `sous resources` - describe the built-in resource catalog

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{PropertyDef, PropertyDefault, ProviderRegistry, ResourceSchema};

use crate::Context;
use crate::config::SousConfig;
use crate::provider::builtin_registry;
use crate::resource::Catalog;
use crate::ui;

pub fn run(_ctx: &Context, config: &SousConfig, resource_type: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin();
    let registry = builtin_registry(config.paths.limits_dir());

    match resource_type {
        Some(name) => {
            let Some(schema) = catalog.get(name) else {
                bail!("Unknown resource type '{name}'");
            };
            show(schema, &registry);
        }
        None => list(&catalog, &registry),
    }
    Ok(())
}

fn list(catalog: &Catalog, registry: &ProviderRegistry) {
    ui::header("Resource types");
    for schema in catalog.schemas() {
        println!(
            "  {:<18} {}",
            schema.resource_type().bold(),
            schema.description().dimmed()
        );
        ui::kv("actions", &actions(schema));
        ui::kv("platforms", &platforms(schema, registry));
    }
}

fn show(schema: &ResourceSchema, registry: &ProviderRegistry) {
    ui::header(schema.resource_type());
    if !schema.description().is_empty() {
        println!("  {}", schema.description());
    }
    ui::kv("actions", &actions(schema));
    ui::kv("platforms", &platforms(schema, registry));

    println!();
    for property in schema.properties() {
        println!(
            "  {:<24} {:<20} {}",
            property.name.cyan(),
            property.ty.describe(),
            flags(property).dimmed()
        );
        if !property.options.description.is_empty() {
            ui::dim(&format!("  {}", property.options.description));
        }
    }
}

/// Allowed actions, default first and marked
fn actions(schema: &ResourceSchema) -> String {
    schema
        .allowed_actions()
        .iter()
        .map(|action| {
            if *action == schema.default_action() {
                format!("{action} (default)")
            } else {
                action.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn platforms(schema: &ResourceSchema, registry: &ProviderRegistry) -> String {
    let platforms: Vec<String> = registry
        .entries()
        .into_iter()
        .filter(|(resource_type, _)| resource_type == schema.resource_type())
        .map(|(_, platform)| platform.to_string())
        .collect();
    if platforms.is_empty() {
        "none".to_string()
    } else {
        platforms.join(", ")
    }
}

fn flags(property: &PropertyDef) -> String {
    let mut flags = Vec::new();
    if property.options.identity {
        flags.push("identity".to_string());
    }
    if property.options.required {
        flags.push("required".to_string());
    }
    match &property.options.default {
        PropertyDefault::None => {}
        PropertyDefault::Constant(value) => flags.push(format!("default: {value}")),
        PropertyDefault::ResourceName => flags.push("default: resource name".to_string()),
        PropertyDefault::Derived { depends_on, .. } => {
            flags.push(format!("default: from {}", depends_on.join(", ")));
        }
    }
    flags.join(", ")
}
