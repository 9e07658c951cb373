//! `user_ulimit` - per-user limits.conf(5) drop-in files
//!
//! Each limit family maps to one limits.conf item. Families with soft and
//! hard variants accept `<family>_limit` (both) or `<family>_soft_limit` /
//! `<family>_hard_limit` separately; the combined value wins when both are
//! set. `virt_limit` is another name for the `as` item and is ignored when
//! any `as_*` limit is set.

use declarative::{Action, PropertyOptions, PropertyType, ResolvedProperties, ResourceSchema, Value};

pub const USER_ULIMIT: &str = "user_ulimit";

/// A group of limit properties rendered as one limits.conf item
#[derive(Debug, Clone, Copy)]
pub struct LimitFamily {
    /// Property prefix (`filehandle` for `filehandle_limit`)
    pub prefix: &'static str,
    /// limits.conf item name
    pub item: &'static str,
    /// Whether `_soft_limit` and `_hard_limit` variants exist
    pub soft_hard: bool,
    pub description: &'static str,
}

const fn family(
    prefix: &'static str,
    item: &'static str,
    soft_hard: bool,
    description: &'static str,
) -> LimitFamily {
    LimitFamily {
        prefix,
        item,
        soft_hard,
        description,
    }
}

/// Limit families in rendering order
pub const LIMIT_FAMILIES: &[LimitFamily] = &[
    family("as", "as", true, "Address space limit (KB)"),
    family("filehandle", "nofile", true, "Maximum number of open files"),
    family("process", "nproc", true, "Maximum number of processes"),
    family("locks", "locks", false, "Maximum number of file locks"),
    family("memory", "memlock", false, "Maximum locked-in-memory address space (KB)"),
    family("maxlogins", "maxlogins", true, "Maximum number of logins"),
    family("msgqueue", "msgqueue", true, "Maximum memory used by POSIX message queues (bytes)"),
    family("core", "core", true, "Core file size (KB)"),
    family("cpu", "cpu", true, "CPU time (minutes)"),
    family("sigpending", "sigpending", true, "Maximum number of pending signals"),
    family("stack", "stack", true, "Maximum stack size (KB)"),
    family("rss", "rss", true, "Maximum resident set size (KB)"),
    family("rtprio", "rtprio", true, "Maximum realtime priority"),
    family("virt", "as", false, "Virtual memory limit (KB), written as an address space limit"),
];

impl LimitFamily {
    pub fn limit(&self) -> String {
        format!("{}_limit", self.prefix)
    }

    pub fn soft_limit(&self) -> String {
        format!("{}_soft_limit", self.prefix)
    }

    pub fn hard_limit(&self) -> String {
        format!("{}_hard_limit", self.prefix)
    }

    /// Every property name this family defines
    pub fn properties(&self) -> Vec<String> {
        if self.soft_hard {
            vec![self.limit(), self.soft_limit(), self.hard_limit()]
        } else {
            vec![self.limit()]
        }
    }
}

/// Build the `user_ulimit` schema
pub fn user_ulimit() -> ResourceSchema {
    let mut schema = ResourceSchema::new(USER_ULIMIT, &[Action::Create, Action::Delete])
        .describe("Create per-user ulimit files in the limits.d directory")
        .define(
            "username",
            PropertyType::String,
            PropertyOptions::new()
                .identity()
                .name_property()
                .describe("User the limits apply to (`*` for everyone)"),
        );

    for family in LIMIT_FAMILIES {
        for property in family.properties() {
            schema = schema.define(
                property,
                PropertyType::StringOrInteger,
                PropertyOptions::new().describe(family.description),
            );
        }
    }

    schema.define(
        "filename",
        PropertyType::String,
        PropertyOptions::new()
            .coerce(conf_suffix)
            .derived(&["username"], default_filename)
            .describe("File name inside the limits.d directory"),
    )
}

fn conf_suffix(value: Value) -> Value {
    match value {
        Value::String(s) if !s.ends_with(".conf") => Value::String(format!("{s}.conf")),
        other => other,
    }
}

fn default_filename(properties: &ResolvedProperties) -> Option<Value> {
    let filename = match properties.string("username")? {
        "*" => "00_all_limits.conf".to_string(),
        user => format!("{user}_limits.conf"),
    };
    Some(Value::String(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ResourceInput, ValidationError};

    #[test]
    fn test_schema_is_valid() {
        user_ulimit().validate().unwrap();
    }

    #[test]
    fn test_defines_all_limit_properties() {
        let count = LIMIT_FAMILIES
            .iter()
            .map(|f| f.properties().len())
            .sum::<usize>();
        assert_eq!(count, 36);
        // username + limits + filename
        assert_eq!(user_ulimit().properties().len(), 38);
    }

    #[test]
    fn test_default_filename_for_user() {
        let tomcat = user_ulimit()
            .instantiate(ResourceInput::new("tomcat").with("filehandle_limit", 8192), None)
            .unwrap();
        assert_eq!(tomcat.action(), Action::Create);
        assert_eq!(tomcat.string("filename"), Some("tomcat_limits.conf"));
        assert_eq!(tomcat.key(), "user_ulimit[tomcat]");
    }

    #[test]
    fn test_default_filename_for_everyone() {
        let all = user_ulimit().instantiate(ResourceInput::new("*"), None).unwrap();
        assert_eq!(all.string("filename"), Some("00_all_limits.conf"));
    }

    #[test]
    fn test_username_differs_from_block_name() {
        let resource = user_ulimit()
            .instantiate(
                ResourceInput::new("Bump filehandle limits for tomcat").with("username", "tomcat"),
                None,
            )
            .unwrap();
        assert_eq!(resource.identity(), "tomcat");
        assert_eq!(resource.string("filename"), Some("tomcat_limits.conf"));
    }

    #[test]
    fn test_filename_gets_conf_suffix() {
        let resource = user_ulimit()
            .instantiate(
                ResourceInput::new("tomcat").with("filename", "tomcat_filehandle_limits"),
                None,
            )
            .unwrap();
        assert_eq!(
            resource.string("filename"),
            Some("tomcat_filehandle_limits.conf")
        );

        let resource = user_ulimit()
            .instantiate(ResourceInput::new("tomcat").with("filename", "custom.conf"), None)
            .unwrap();
        assert_eq!(resource.string("filename"), Some("custom.conf"));
    }

    #[test]
    fn test_single_value_families_have_no_soft_hard() {
        let err = user_ulimit()
            .instantiate(ResourceInput::new("tomcat").with("virt_soft_limit", 1), None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProperty { .. }));
    }

    #[test]
    fn test_install_is_not_allowed() {
        let err = user_ulimit()
            .instantiate(ResourceInput::new("tomcat"), Some(Action::Install))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedAction { .. }));
    }
}
