//! @acp:module "Annotation Schema"
//! @acp:summary "Declarative per-kind table of positional slots, flags and keys"
//! @acp:domain analysis
//! @acp:layer model
//!
//! The generic parser in the parent module consults this table instead of
//! carrying one hand-written branch per annotation kind.

use crate::names::{is_identifier, is_qualified_identifier};

/// HTTP methods accepted by `//axon::route`
pub const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "CONNECT", "TRACE", "ANY",
];

/// @acp:summary "Constraint applied to a positional or key/value argument"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    Any,
    OneOf(&'static [&'static str]),
    Integer,
    /// Case-insensitive, stored upper-case
    HttpMethod,
    /// Route template; must start with `/`
    Path,
    Identifier,
    /// Identifier with an optional package qualifier
    TypeName,
    /// Comma-separated identifiers
    List,
}

impl ValueRule {
    /// Check a raw value and return its normalized form
    pub fn apply(&self, value: &str) -> Result<String, String> {
        match self {
            ValueRule::Any => Ok(value.to_string()),
            ValueRule::OneOf(options) => {
                if options.contains(&value) {
                    Ok(value.to_string())
                } else {
                    Err(format!("expected one of {}, found '{}'", options.join(", "), value))
                }
            }
            ValueRule::Integer => value
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|_| format!("expected an integer, found '{}'", value)),
            ValueRule::HttpMethod => {
                let upper = value.to_ascii_uppercase();
                if HTTP_METHODS.contains(&upper.as_str()) {
                    Ok(upper)
                } else {
                    Err(format!("'{}' is not an HTTP method", value))
                }
            }
            ValueRule::Path => {
                if value.starts_with('/') {
                    Ok(value.to_string())
                } else {
                    Err(format!("path '{}' must start with '/'", value))
                }
            }
            ValueRule::Identifier => {
                if is_identifier(value) {
                    Ok(value.to_string())
                } else {
                    Err(format!("'{}' is not a valid identifier", value))
                }
            }
            ValueRule::TypeName => {
                if is_qualified_identifier(value) {
                    Ok(value.to_string())
                } else {
                    Err(format!("'{}' is not a valid type name", value))
                }
            }
            ValueRule::List => {
                let items: Vec<&str> = value.split(',').map(str::trim).collect();
                match items.iter().find(|item| !is_identifier(item)) {
                    Some(bad) => Err(format!("'{}' is not a valid list entry", bad)),
                    None => Ok(items.join(",")),
                }
            }
        }
    }
}

/// @acp:summary "Accepted arguments for one annotation kind"
#[derive(Debug, Clone, Copy)]
pub struct KindSchema {
    /// Positional slots, filled in order
    pub positional: &'static [(&'static str, ValueRule)],
    /// Slot names that must be present after parsing
    pub required: &'static [&'static str],
    /// Bare `-Flag` switches
    pub flags: &'static [&'static str],
    /// `-Key=value` arguments
    pub keys: &'static [(&'static str, ValueRule)],
    /// Example line used in suggestions
    pub usage: &'static str,
}

impl KindSchema {
    pub fn key_rule(&self, key: &str) -> Option<ValueRule> {
        self.keys.iter().find(|(k, _)| *k == key).map(|(_, rule)| *rule)
    }

    pub fn allows_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag)
    }

    /// Every accepted dashed name, flags first
    pub fn option_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.flags.to_vec();
        for (key, _) in self.keys {
            if !names.contains(key) {
                names.push(key);
            }
        }
        names
    }
}

const START_MODES: &[&str] = &["Same", "Background"];
const SERVICE_MODES: &[&str] = &["Singleton", "Transient"];

pub(super) const CONTROLLER: KindSchema = KindSchema {
    positional: &[],
    required: &[],
    flags: &[],
    keys: &[("-Prefix", ValueRule::Path), ("-Middleware", ValueRule::List)],
    usage: "//axon::controller -Prefix=/api/users -Middleware=Auth",
};

pub(super) const ROUTE: KindSchema = KindSchema {
    positional: &[("method", ValueRule::HttpMethod), ("path", ValueRule::Path)],
    required: &["method", "path"],
    flags: &[],
    keys: &[("-Middleware", ValueRule::List)],
    usage: "//axon::route GET /users/{id:int}",
};

pub(super) const MIDDLEWARE: KindSchema = KindSchema {
    positional: &[("name", ValueRule::Identifier)],
    required: &["name"],
    flags: &["-Global"],
    keys: &[("-Priority", ValueRule::Integer)],
    usage: "//axon::middleware Auth -Priority=10",
};

pub(super) const CORE: KindSchema = KindSchema {
    positional: &[],
    required: &[],
    flags: &["-Init"],
    keys: &[
        ("-Init", ValueRule::OneOf(START_MODES)),
        ("-Mode", ValueRule::OneOf(SERVICE_MODES)),
        ("-Constructor", ValueRule::Identifier),
    ],
    usage: "//axon::core -Init=Background",
};

pub(super) const INTERFACE: KindSchema = KindSchema {
    positional: &[],
    required: &[],
    flags: &[],
    keys: &[("-Name", ValueRule::Identifier)],
    usage: "//axon::interface -Name=UserRepository",
};

pub(super) const FIELD_TAG: KindSchema = KindSchema {
    positional: &[],
    required: &[],
    flags: &[],
    keys: &[],
    usage: "//axon::inject",
};

pub(super) const LOGGER: KindSchema = KindSchema {
    positional: &[],
    required: &[],
    flags: &["-Init"],
    keys: &[("-Init", ValueRule::OneOf(START_MODES))],
    usage: "//axon::logger -Init",
};

pub(super) const ROUTE_PARSER: KindSchema = KindSchema {
    positional: &[("name", ValueRule::TypeName)],
    required: &["name"],
    flags: &[],
    keys: &[],
    usage: "//axon::route_parser UserID",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_is_normalized() {
        assert_eq!(ValueRule::HttpMethod.apply("get").unwrap(), "GET");
        assert!(ValueRule::HttpMethod.apply("FETCH").is_err());
    }

    #[test]
    fn test_list_rule_trims_entries() {
        assert_eq!(ValueRule::List.apply("Auth, Log").unwrap(), "Auth,Log");
        assert!(ValueRule::List.apply("Auth,,Log").is_err());
    }

    #[test]
    fn test_option_names_deduplicate_flag_and_key() {
        assert_eq!(CORE.option_names(), vec!["-Init", "-Mode", "-Constructor"]);
    }
}
