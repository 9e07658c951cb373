//! Built-in templates for file resources

use anyhow::{Result, bail};
use declarative::{TemplateRenderer, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::resource::user_ulimit::LIMIT_FAMILIES;

/// Template reference for limits.conf(5) drop-ins
pub const ULIMIT: &str = "ulimit";

/// Variable holding the user a ulimit file applies to
pub const ULIMIT_USER: &str = "ulimit_user";

const HEADER: &str = "# Managed by sous. Local changes will be overwritten.\n";

/// Renderer for the templates compiled into sous
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, template: &str, variables: &BTreeMap<String, Value>) -> Result<Vec<u8>> {
        match template {
            ULIMIT => render_ulimit(variables).map(String::into_bytes),
            other => bail!("Unknown template '{other}'"),
        }
    }
}

fn render_ulimit(variables: &BTreeMap<String, Value>) -> Result<String> {
    let Some(user) = variables.get(ULIMIT_USER) else {
        bail!("ulimit template needs '{ULIMIT_USER}'");
    };

    let mut out = String::from(HEADER);
    // The first family rendering an item owns it
    let mut written: BTreeSet<&str> = BTreeSet::new();

    for family in LIMIT_FAMILIES {
        if written.contains(family.item) {
            continue;
        }
        let lines: Vec<(&str, &Value)> = match variables.get(&family.limit()) {
            Some(value) => vec![("-", value)],
            None if family.soft_hard => [("soft", family.soft_limit()), ("hard", family.hard_limit())]
                .into_iter()
                .filter_map(|(domain, name)| variables.get(&name).map(|value| (domain, value)))
                .collect(),
            None => Vec::new(),
        };
        if lines.is_empty() {
            continue;
        }
        for (domain, value) in lines {
            out.push_str(&format!("{user} {domain} {} {value}\n", family.item));
        }
        written.insert(family.item);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn render(pairs: &[(&str, Value)]) -> String {
        let bytes = BuiltinTemplates.render(ULIMIT, &vars(pairs)).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_combined_limit() {
        let out = render(&[
            (ULIMIT_USER, Value::from("tomcat")),
            ("filehandle_limit", Value::Integer(8192)),
        ]);
        assert_eq!(out, format!("{HEADER}tomcat - nofile 8192\n"));
    }

    #[test]
    fn test_soft_and_hard_lines() {
        let out = render(&[
            (ULIMIT_USER, Value::from("*")),
            ("core_soft_limit", Value::Integer(0)),
            ("core_hard_limit", Value::from("unlimited")),
        ]);
        assert!(out.ends_with("* soft core 0\n* hard core unlimited\n"));
    }

    #[test]
    fn test_combined_wins_over_soft_hard() {
        let out = render(&[
            (ULIMIT_USER, Value::from("tomcat")),
            ("process_limit", Value::Integer(100)),
            ("process_soft_limit", Value::Integer(50)),
        ]);
        assert!(out.contains("tomcat - nproc 100\n"));
        assert!(!out.contains("soft"));
    }

    #[test]
    fn test_item_names() {
        let out = render(&[
            (ULIMIT_USER, Value::from("db")),
            ("memory_limit", Value::Integer(64)),
            ("virt_limit", Value::from("unlimited")),
        ]);
        assert!(out.contains("db - memlock 64\n"));
        assert!(out.contains("db - as unlimited\n"));
    }

    #[test]
    fn test_address_space_wins_over_virt() {
        let out = render(&[
            (ULIMIT_USER, Value::from("db")),
            ("as_soft_limit", Value::Integer(1024)),
            ("virt_limit", Value::from("unlimited")),
        ]);
        assert_eq!(out, format!("{HEADER}db soft as 1024\n"));
    }

    #[test]
    fn test_rendering_is_deterministic_and_ordered() {
        let pairs = [
            (ULIMIT_USER, Value::from("tomcat")),
            ("stack_limit", Value::Integer(8192)),
            ("as_limit", Value::Integer(1024)),
        ];
        let first = render(&pairs);
        assert_eq!(first, render(&pairs));
        assert!(first.find("as 1024").unwrap() < first.find("stack 8192").unwrap());
    }

    #[test]
    fn test_unknown_template() {
        assert!(BuiltinTemplates.render("motd", &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_missing_user() {
        assert!(BuiltinTemplates.render(ULIMIT, &BTreeMap::new()).is_err());
    }
}
