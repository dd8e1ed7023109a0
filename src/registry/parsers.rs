//! @acp:module "Parser Registry"
//! @acp:summary "Custom path-type parsers: registration, alias lookup, resolution"
//! @acp:domain routing
//! @acp:layer service

use std::collections::{BTreeMap, BTreeSet};

use crate::config::FrameworkConfig;
use crate::diagnostics::{Diagnostic, DiagnosticList};
use crate::metadata::{PackageMetadata, Parameter, ParameterSource, RouteMetadata, RouteParserMetadata};
use crate::names::trailing_segment;

/// File name recorded for parsers the runtime ships with
pub const BUILTIN_FILE: &str = "<builtin>";

/// (type, runtime parse function)
const BUILTINS: &[(&str, &str)] = &[
    ("uuid.UUID", "axon.ParseUUID"),
    ("time.Time", "axon.ParseTime"),
    ("time.Duration", "axon.ParseDuration"),
];

/// Short spellings accepted for built-in types
const ALIASES: &[(&str, &str)] = &[
    ("UUID", "uuid.UUID"),
    ("Uuid", "uuid.UUID"),
    ("uuid", "uuid.UUID"),
    ("Time", "time.Time"),
    ("Duration", "time.Duration"),
];

/// @acp:summary "Type name -> parser function table"
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: BTreeMap<String, RouteParserMetadata>,
    /// Every `file:line` a type was registered at, rejected ones included
    occurrences: BTreeMap<String, Vec<String>>,
    /// First parameter type shown in suggested parser signatures
    request_context: String,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::for_framework(&FrameworkConfig::default())
    }
}

impl ParserRegistry {
    /// An empty registry, without built-ins
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry whose suggestions follow the framework's type names
    pub fn for_framework(framework: &FrameworkConfig) -> Self {
        Self {
            parsers: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            request_context: framework.request_context.clone(),
        }
    }

    /// @acp:summary "Registry seeded with the runtime's built-in parsers"
    pub fn with_builtins(framework: &FrameworkConfig) -> Self {
        let mut registry = Self::for_framework(framework);
        for (type_name, func_name) in BUILTINS {
            registry.parsers.insert(
                type_name.to_string(),
                RouteParserMetadata {
                    type_name: type_name.to_string(),
                    func_name: func_name.to_string(),
                    file: BUILTIN_FILE.to_string(),
                    line: 0,
                    param_types: vec![framework.request_context.clone(), "string".to_string()],
                    return_types: vec![type_name.to_string(), framework.error_type.clone()],
                },
            );
        }
        registry
    }

    /// @acp:summary "Add a parser; a second parser for the same type is a Conflict"
    ///
    /// Registering the same function from the same location again is a no-op.
    pub fn register(&mut self, parser: RouteParserMetadata) -> Result<(), Diagnostic> {
        let type_name = parser.type_name.clone();
        if self.parsers.get(&type_name).is_some_and(|existing| same_declaration(existing, &parser)) {
            return Ok(());
        }
        let seen = self.occurrences.entry(type_name.clone()).or_default();
        if let Some(existing) = self.parsers.get(&type_name) {
            if seen.is_empty() {
                seen.push(existing.location());
            }
            seen.push(parser.location());
            return Err(Diagnostic::conflict(format!(
                "parser for type '{}' is registered more than once: {}",
                type_name,
                seen.join(", ")
            ))
            .at(&parser.file, parser.line)
            .with_context("type_name", type_name.as_str())
            .with_context("locations", seen.join(","))
            .with_suggestion("keep a single //axon::route_parser per type"));
        }
        seen.push(parser.location());
        tracing::debug!("Registered parser {} for {}", parser.func_name, type_name);
        self.parsers.insert(type_name, parser);
        Ok(())
    }

    /// Drop every parser declared in `file`, ahead of re-analyzing it
    pub fn forget_file(&mut self, file: &str) {
        self.parsers.retain(|_, parser| parser.file != file);
        for seen in self.occurrences.values_mut() {
            seen.retain(|location| location.rsplit_once(':').map(|(f, _)| f) != Some(file));
        }
        self.occurrences.retain(|_, seen| !seen.is_empty());
    }

    /// The registered name a spelled type resolves to
    pub fn canonical_name<'a>(&self, name: &'a str) -> &'a str {
        if self.parsers.contains_key(name) {
            return name;
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, target)| *target)
            .unwrap_or(name)
    }

    /// Exact lookup, then the alias table
    pub fn lookup(&self, name: &str) -> Option<&RouteParserMetadata> {
        self.parsers.get(self.canonical_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered type names, sorted
    pub fn available(&self) -> Vec<&str> {
        self.parsers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// @acp:summary "Find the parser for a route parameter's custom type"
    pub fn resolve(
        &self,
        route: &RouteMetadata,
        param: &Parameter,
    ) -> Result<&RouteParserMetadata, Diagnostic> {
        self.lookup(&param.type_name)
            .ok_or_else(|| self.missing(route, param))
    }

    fn missing(&self, route: &RouteMetadata, param: &Parameter) -> Diagnostic {
        let type_name = &param.type_name;
        let short = trailing_segment(type_name);
        Diagnostic::not_found(format!(
            "no parser registered for custom type '{}'",
            type_name
        ))
        .at(&route.file, route.line)
        .with_context("type_name", type_name.as_str())
        .with_context("route_method", route.method.as_str())
        .with_context("route_path", route.full_path.as_str())
        .with_context("parameter_name", param.name.as_str())
        .with_context("available_parsers", self.available().join(", "))
        .with_suggestion(format!(
            "register a parser:\n//axon::route_parser {}\nfunc Parse{}(c {}, raw string) ({}, error)",
            type_name, short, self.request_context, type_name
        ))
    }

    /// @acp:summary "Fill `parser_func` for every custom path parameter of a route"
    pub fn bind_route(&self, route: &mut RouteMetadata) -> Result<(), Diagnostic> {
        for index in 0..route.parameters.len() {
            let param = &route.parameters[index];
            if !needs_parser(param) {
                continue;
            }
            let func_name = self.resolve(route, param)?.func_name.clone();
            route.parameters[index].parser_func = Some(func_name);
        }
        Ok(())
    }

    /// @acp:summary "Report every missing and unused parser across packages"
    ///
    /// Missing parsers are errors; user-registered parsers no route uses
    /// are warnings.
    pub fn audit(&self, packages: &[PackageMetadata]) -> DiagnosticList {
        let mut diagnostics = DiagnosticList::new();
        let mut used = BTreeSet::new();

        for route in packages.iter().flat_map(|p| p.routes()) {
            for param in route.parameters.iter().filter(|p| needs_parser(p)) {
                match self.lookup(&param.type_name) {
                    Some(parser) => {
                        used.insert(parser.type_name.clone());
                    }
                    None => diagnostics.push(self.missing(route, param)),
                }
            }
        }

        for parser in self.parsers.values() {
            if parser.file == BUILTIN_FILE || used.contains(&parser.type_name) {
                continue;
            }
            tracing::warn!("Parser {} for {} is never used", parser.func_name, parser.type_name);
            diagnostics.push(
                Diagnostic::not_found(format!(
                    "parser '{}' for type '{}' is not used by any route",
                    parser.func_name, parser.type_name
                ))
                .at(&parser.file, parser.line)
                .with_context("type_name", parser.type_name.as_str())
                .as_warning(),
            );
        }

        diagnostics
    }
}

fn same_declaration(a: &RouteParserMetadata, b: &RouteParserMetadata) -> bool {
    a.file == b.file && a.line == b.line && a.func_name == b.func_name
}

fn needs_parser(param: &Parameter) -> bool {
    param.source == ParameterSource::Path && param.is_custom_type
}
