//! @acp:module "Annotation Parser"
//! @acp:summary "Parses //axon:: comment directives into typed annotations"
//! @acp:domain analysis
//! @acp:layer parser
//!
//! Grammar of one directive line:
//!
//! ```text
//! //axon::<kind> [positional...] [-Flag...] [-Key=value...]
//! ```
//!
//! Positional tokens fill the kind's slots in order (`route` takes
//! `method` then `path`); key/value pairs are stored under their dashed
//! key. What a kind accepts lives in [`schema`].

pub mod schema;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::metadata::Dependency;
pub use schema::{KindSchema, ValueRule};

/// Namespace every directive starts with
pub const ANNOTATION_PREFIX: &str = "axon::";

/// @acp:summary "Annotation vocabulary"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Controller,
    Route,
    Middleware,
    Core,
    Interface,
    Inject,
    Init,
    Logger,
    RouteParser,
}

/// Declaration an annotation may be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Type,
    Method,
    Function,
    Field,
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::Type => write!(f, "a struct type"),
            Placement::Method => write!(f, "a method"),
            Placement::Function => write!(f, "a package-level function"),
            Placement::Field => write!(f, "a struct field"),
        }
    }
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 9] = [
        AnnotationKind::Controller,
        AnnotationKind::Route,
        AnnotationKind::Middleware,
        AnnotationKind::Core,
        AnnotationKind::Interface,
        AnnotationKind::Inject,
        AnnotationKind::Init,
        AnnotationKind::Logger,
        AnnotationKind::RouteParser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Controller => "controller",
            AnnotationKind::Route => "route",
            AnnotationKind::Middleware => "middleware",
            AnnotationKind::Core => "core",
            AnnotationKind::Interface => "interface",
            AnnotationKind::Inject => "inject",
            AnnotationKind::Init => "init",
            AnnotationKind::Logger => "logger",
            AnnotationKind::RouteParser => "route_parser",
        }
    }

    pub fn schema(&self) -> &'static KindSchema {
        match self {
            AnnotationKind::Controller => &schema::CONTROLLER,
            AnnotationKind::Route => &schema::ROUTE,
            AnnotationKind::Middleware => &schema::MIDDLEWARE,
            AnnotationKind::Core => &schema::CORE,
            AnnotationKind::Interface => &schema::INTERFACE,
            AnnotationKind::Inject | AnnotationKind::Init => &schema::FIELD_TAG,
            AnnotationKind::Logger => &schema::LOGGER,
            AnnotationKind::RouteParser => &schema::ROUTE_PARSER,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            AnnotationKind::Controller
            | AnnotationKind::Middleware
            | AnnotationKind::Core
            | AnnotationKind::Interface
            | AnnotationKind::Logger => Placement::Type,
            AnnotationKind::Route => Placement::Method,
            AnnotationKind::RouteParser => Placement::Function,
            AnnotationKind::Inject | AnnotationKind::Init => Placement::Field,
        }
    }

    /// Kinds whose struct fields are collected as dependencies
    pub fn collects_dependencies(&self) -> bool {
        matches!(
            self,
            AnnotationKind::Controller
                | AnnotationKind::Middleware
                | AnnotationKind::Core
                | AnnotationKind::Logger
        )
    }

    fn keywords() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "controller" => Ok(AnnotationKind::Controller),
            "route" => Ok(AnnotationKind::Route),
            "middleware" => Ok(AnnotationKind::Middleware),
            "core" | "service" => Ok(AnnotationKind::Core),
            "interface" => Ok(AnnotationKind::Interface),
            "inject" => Ok(AnnotationKind::Inject),
            "init" => Ok(AnnotationKind::Init),
            "logger" => Ok(AnnotationKind::Logger),
            "route_parser" => Ok(AnnotationKind::RouteParser),
            _ => Err(format!("Unknown annotation kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @acp:summary "A parsed directive bound to the symbol it annotates"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// `Type`, `Type.Method`, `Type.Field` or a function name
    pub target: String,
    /// Positional slots by slot name, key/value pairs by dashed key
    pub parameters: BTreeMap<String, String>,
    pub flags: BTreeSet<String>,
    pub dependencies: Vec<Dependency>,
    pub file: String,
    pub line: usize,
}

impl Annotation {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Comma-separated parameter split into entries; empty when absent
    pub fn list_param(&self, name: &str) -> Vec<String> {
        self.param(name)
            .map(|v| v.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Integer parameter; `None` when absent, a located diagnostic when not a number
    pub fn int_param(&self, name: &str) -> Result<Option<i64>, Diagnostic> {
        self.param(name)
            .map(|value| {
                value.parse::<i64>().map_err(|_| {
                    Diagnostic::validation(format!(
                        "parameter '{}' of annotation '{}' must be an integer, found '{}'",
                        name,
                        self.kind.as_str(),
                        value
                    ))
                    .at(&self.file, self.line)
                    .with_context("parameter", name)
                })
            })
            .transpose()
    }

    /// `UserController` for `UserController.GetUser`
    pub fn target_type(&self) -> &str {
        self.target.split_once('.').map_or(&self.target, |(ty, _)| ty)
    }

    /// `GetUser` for `UserController.GetUser`
    pub fn target_member(&self) -> Option<&str> {
        self.target.split_once('.').map(|(_, member)| member)
    }
}

fn strip_comment_marker(comment: &str) -> &str {
    let text = comment.trim();
    if let Some(rest) = text.strip_prefix("//") {
        return rest.trim();
    }
    if let Some(inner) = text.strip_prefix("/*").and_then(|t| t.strip_suffix("*/")) {
        return inner.trim();
    }
    text
}

/// True when a comment is meant as a directive (well-formed or not)
pub fn is_annotation_comment(comment: &str) -> bool {
    strip_comment_marker(comment).starts_with("axon:")
}

/// @acp:summary "Parse one directive comment"
///
/// Every failure carries `file:line` and names the offending token.
pub fn parse_annotation(
    comment: &str,
    target: &str,
    file: &str,
    line: usize,
) -> Result<Annotation, Diagnostic> {
    let body = strip_comment_marker(comment);
    let rest = body.strip_prefix(ANNOTATION_PREFIX).ok_or_else(|| {
        Diagnostic::syntax(format!(
            "annotation must start with '{}', found '{}'",
            ANNOTATION_PREFIX, body
        ))
        .at(file, line)
        .with_suggestion(format!("write the directive as //{}<kind>", ANNOTATION_PREFIX))
    })?;

    let mut tokens = rest.split_whitespace();
    let keyword = tokens.next().ok_or_else(|| {
        Diagnostic::syntax("empty annotation: expected a kind after 'axon::'")
            .at(file, line)
            .with_suggestion(format!("valid kinds: {}", AnnotationKind::keywords()))
    })?;
    let kind: AnnotationKind = keyword.parse().map_err(|_| {
        Diagnostic::syntax(format!("unknown annotation kind '{}'", keyword))
            .at(file, line)
            .with_context("kind", keyword)
            .with_suggestion(format!("valid kinds: {}", AnnotationKind::keywords()))
    })?;

    let schema = kind.schema();
    let invalid = |message: String| {
        Diagnostic::validation(message)
            .at(file, line)
            .with_context("annotation", kind.as_str())
    };

    let mut parameters = BTreeMap::new();
    let mut flags = BTreeSet::new();
    let mut slot = 0;

    for token in tokens {
        if let Some((key, value)) = token.split_once('=').filter(|_| token.starts_with('-')) {
            let rule = schema.key_rule(key).ok_or_else(|| {
                invalid(format!("unknown parameter '{}' for annotation '{}'", key, kind))
                    .with_suggestion(format!("allowed: {}", schema.option_names().join(", ")))
            })?;
            if value.is_empty() {
                return Err(invalid(format!("parameter '{}' has an empty value", key)));
            }
            if parameters.contains_key(key) {
                return Err(invalid(format!("parameter '{}' is given more than once", key)));
            }
            let value = rule
                .apply(value)
                .map_err(|reason| invalid(format!("invalid value for '{}': {}", key, reason)))?;
            parameters.insert(key.to_string(), value);
        } else if token.starts_with('-') && token.len() > 1 {
            if schema.allows_flag(token) {
                flags.insert(token.to_string());
            } else if schema.key_rule(token).is_some() {
                return Err(invalid(format!("parameter '{}' requires a value", token))
                    .with_suggestion(format!("write it as {}=<value>", token)));
            } else {
                let mut diagnostic =
                    invalid(format!("unknown flag '{}' for annotation '{}'", token, kind));
                if !schema.option_names().is_empty() {
                    diagnostic = diagnostic
                        .with_suggestion(format!("allowed: {}", schema.option_names().join(", ")));
                }
                return Err(diagnostic);
            }
        } else {
            let (name, rule) = schema.positional.get(slot).ok_or_else(|| {
                invalid(format!(
                    "unexpected argument '{}' for annotation '{}'",
                    token, kind
                ))
                .with_suggestion(format!("usage: {}", schema.usage))
            })?;
            let value = rule
                .apply(token)
                .map_err(|reason| invalid(format!("invalid {}: {}", name, reason)))?;
            parameters.insert(name.to_string(), value);
            slot += 1;
        }
    }

    if let Some(missing) = schema.required.iter().find(|r| !parameters.contains_key(**r)) {
        return Err(invalid(format!(
            "annotation '{}' is missing required parameter '{}'",
            kind, missing
        ))
        .with_context("field", *missing)
        .with_suggestion(format!("usage: {}", schema.usage)));
    }

    Ok(Annotation {
        kind,
        target: target.to_string(),
        parameters,
        flags,
        dependencies: Vec::new(),
        file: file.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn test_route_positional_slots() {
        let ann = parse_annotation(
            "//axon::route get /users/{id:int} -Middleware=Auth,Audit",
            "UserController.GetUser",
            "user.go",
            12,
        )
        .unwrap();
        assert_eq!(ann.kind, AnnotationKind::Route);
        assert_eq!(ann.param("method"), Some("GET"));
        assert_eq!(ann.param("path"), Some("/users/{id:int}"));
        assert_eq!(ann.list_param("-Middleware"), vec!["Auth", "Audit"]);
        assert_eq!(ann.target_type(), "UserController");
        assert_eq!(ann.target_member(), Some("GetUser"));
    }

    #[test]
    fn test_flags_and_keys() {
        let ann = parse_annotation("// axon::core -Init=Background -Mode=Transient", "Cache", "c.go", 3)
            .unwrap();
        assert_eq!(ann.param("-Init"), Some("Background"));
        assert_eq!(ann.param("-Mode"), Some("Transient"));

        let ann = parse_annotation("//axon::middleware Auth -Global -Priority=5", "AuthMw", "m.go", 1)
            .unwrap();
        assert!(ann.has_flag("-Global"));
        assert_eq!(ann.param("name"), Some("Auth"));
        assert_eq!(ann.param("-Priority"), Some("5"));
        assert_eq!(ann.int_param("-Priority").unwrap(), Some(5));
        assert_eq!(ann.int_param("-Missing").unwrap(), None);
    }

    #[test]
    fn test_int_param_rejects_hand_built_values() {
        let mut ann = parse_annotation("//axon::middleware Auth", "AuthMw", "m.go", 9).unwrap();
        ann.parameters.insert("-Priority".into(), "high".into());
        let err = ann.int_param("-Priority").unwrap_err();
        assert!(err.message.contains("must be an integer, found 'high'"));
        assert_eq!(err.location.unwrap().line, 9);
    }

    #[test]
    fn test_service_is_alias_for_core() {
        let ann = parse_annotation("//axon::service", "Db", "db.go", 1).unwrap();
        assert_eq!(ann.kind, AnnotationKind::Core);
    }

    #[test]
    fn test_block_comment_marker() {
        let ann = parse_annotation("/* axon::controller -Prefix=/api */", "Api", "a.go", 1).unwrap();
        assert_eq!(ann.param("-Prefix"), Some("/api"));
    }

    #[test]
    fn test_missing_prefix_is_syntax_error() {
        let err = parse_annotation("//axon:controller", "X", "x.go", 4).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.location.as_ref().unwrap().line, 4);
    }

    #[test]
    fn test_empty_remainder_is_syntax_error() {
        let err = parse_annotation("//axon::   ", "X", "x.go", 1).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn test_unknown_kind_lists_valid_kinds() {
        let err = parse_annotation("//axon::handler", "X", "x.go", 1).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert!(err.message.contains("'handler'"));
        assert!(err.suggestions[0].contains("route_parser"));
    }

    #[test]
    fn test_missing_required_slot_names_field() {
        let err = parse_annotation("//axon::route GET", "C.H", "c.go", 9).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Validation);
        assert!(err.message.contains("missing required parameter 'path'"));
        assert_eq!(err.context_value("field"), Some("path"));

        let err = parse_annotation("//axon::route_parser", "ParseX", "p.go", 2).unwrap_err();
        assert_eq!(err.context_value("field"), Some("name"));
    }

    #[test]
    fn test_schema_violations() {
        let cases = [
            ("//axon::controller -Bogus", "unknown flag '-Bogus'"),
            ("//axon::controller -Prefix=", "empty value"),
            ("//axon::controller -Prefix", "requires a value"),
            ("//axon::controller -Prefix=api", "must start with '/'"),
            ("//axon::route FETCH /x", "not an HTTP method"),
            ("//axon::route GET /x extra", "unexpected argument 'extra'"),
            ("//axon::middleware Auth -Priority=high", "expected an integer"),
            ("//axon::core -Mode=Scoped", "expected one of Singleton, Transient"),
            ("//axon::inject -Lazy=true", "unknown parameter '-Lazy'"),
        ];
        for (comment, expected) in cases {
            let err = parse_annotation(comment, "T", "t.go", 1).unwrap_err();
            assert_eq!(err.kind, DiagnosticKind::Validation, "{}", comment);
            assert!(err.message.contains(expected), "{} -> {}", comment, err.message);
        }
    }

    #[test]
    fn test_is_annotation_comment() {
        assert!(is_annotation_comment("//axon::route GET /"));
        assert!(is_annotation_comment("// axon:controller"));
        assert!(!is_annotation_comment("// UserController handles users"));
    }
}
