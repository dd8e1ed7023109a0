//! @acp:module "Metadata Model"
//! @acp:summary "Validated package metadata handed to the code-emission stage"
//! @acp:domain analysis
//! @acp:layer model
//!
//! These types serialize directly to JSON so the emitter can run as a
//! separate process. The whole model is rebuilt on every invocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::Import;

/// @acp:summary "Aggregator root for one Go package"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub package_name: String,
    /// Directory the package was read from
    pub package_path: String,
    /// Directory containing go.mod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_root: Option<String>,
    /// `module` directive of go.mod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    /// Canonical import path of this package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    pub controllers: Vec<ControllerMetadata>,
    pub middlewares: Vec<MiddlewareMetadata>,
    pub core_services: Vec<CoreServiceMetadata>,
    pub interfaces: Vec<InterfaceMetadata>,
    pub route_parsers: Vec<RouteParserMetadata>,
    pub loggers: Vec<LoggerMetadata>,
    /// Imports per source file
    pub file_imports: BTreeMap<String, Vec<Import>>,
}

impl PackageMetadata {
    pub fn controller(&self, name: &str) -> Option<&ControllerMetadata> {
        self.controllers.iter().find(|c| c.name == name)
    }

    pub fn core_service(&self, name: &str) -> Option<&CoreServiceMetadata> {
        self.core_services.iter().find(|s| s.struct_name == name)
    }

    pub fn middleware(&self, name: &str) -> Option<&MiddlewareMetadata> {
        self.middlewares.iter().find(|m| m.name == name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteMetadata> {
        self.controllers.iter().flat_map(|c| c.routes.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
            && self.middlewares.is_empty()
            && self.core_services.is_empty()
            && self.interfaces.is_empty()
            && self.route_parsers.is_empty()
            && self.loggers.is_empty()
    }
}

/// A struct field the DI container must provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Canonical type spelling (see `TypeExpr`'s `Display`)
    #[serde(rename = "type")]
    pub type_name: String,
    /// Resolved late (after construction) instead of at construction
    #[serde(default)]
    pub is_init: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub middlewares: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub routes: Vec<RouteMetadata>,
    pub file: String,
    pub line: usize,
}

/// How a handler reports its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// `error`
    ErrorOnly,
    /// `(T, error)`
    DataError,
    /// `(*Response, error)`
    ResponseError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
    pub method: String,
    /// Route template as declared, after collision renaming
    pub path: String,
    /// Controller prefix joined with `path`
    pub full_path: String,
    pub handler_name: String,
    pub controller_name: String,
    pub parameters: Vec<Parameter>,
    pub middlewares: Vec<String>,
    pub return_kind: ReturnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub file: String,
    pub line: usize,
}

impl RouteMetadata {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// `GET /users/{id:int}` style label for diagnostics
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.full_path)
    }
}

/// Where a handler parameter's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Path,
    Body,
    Query,
    Context,
}

impl std::fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterSource::Path => write!(f, "path"),
            ParameterSource::Body => write!(f, "body"),
            ParameterSource::Query => write!(f, "query"),
            ParameterSource::Context => write!(f, "context"),
        }
    }
}

/// @acp:summary "One handler parameter after path/signature reconciliation"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub source: ParameterSource,
    pub required: bool,
    pub is_custom_type: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_func: Option<String>,
    /// Index in the handler's declared parameter list
    pub position: usize,
    /// Placeholder name in the path template when it differs from `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_key: Option<String>,
}

impl Parameter {
    /// Name used to read the value from the request path
    pub fn path_name(&self) -> &str {
        self.path_key.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParserMetadata {
    pub type_name: String,
    pub func_name: String,
    pub file: String,
    pub line: usize,
    pub param_types: Vec<String>,
    pub return_types: Vec<String>,
}

impl RouteParserMetadata {
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareMetadata {
    pub name: String,
    pub struct_name: String,
    pub dependencies: Vec<Dependency>,
    /// Applied to every route
    pub is_global: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub file: String,
    pub line: usize,
}

/// When `Start` runs relative to the rest of startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    #[default]
    Same,
    Background,
}

impl std::str::FromStr for StartMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Same" => Ok(StartMode::Same),
            "Background" => Ok(StartMode::Background),
            _ => Err(format!("Unknown start mode: {}", s)),
        }
    }
}

/// Instance lifetime in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    #[default]
    Singleton,
    Transient,
}

impl std::str::FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Singleton" => Ok(ServiceMode::Singleton),
            "Transient" => Ok(ServiceMode::Transient),
            _ => Err(format!("Unknown service mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreServiceMetadata {
    pub struct_name: String,
    pub dependencies: Vec<Dependency>,
    pub is_init: bool,
    pub start_mode: StartMode,
    pub mode: ServiceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<String>,
    pub has_start: bool,
    pub has_stop: bool,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerMetadata {
    pub struct_name: String,
    pub dependencies: Vec<Dependency>,
    pub is_init: bool,
    pub start_mode: StartMode,
    pub has_start: bool,
    pub has_stop: bool,
    pub file: String,
    pub line: usize,
}

/// A method to expose on a generated interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<String>,
    pub results: Vec<String>,
    /// `Name(params) results` as it appears in an interface body
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMetadata {
    pub name: String,
    pub struct_name: String,
    pub methods: Vec<MethodSignature>,
    pub file: String,
    pub line: usize,
}
