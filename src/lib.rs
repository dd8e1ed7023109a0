#![forbid(unsafe_code)]

//! @acp:module "axon-meta Library"
//! @acp:summary "Parses //axon:: annotations in Go packages into validated metadata"
//! @acp:domain analysis
//! @acp:layer api
//! @acp:stability experimental
//!
//! # axon-meta
//!
//! Front-end of the axon code generator. Reads Go source, collects the
//! `//axon::` directives on types, fields, methods and functions, and
//! produces a cross-checked [`PackageMetadata`] describing controllers,
//! routes, middleware, core services, generated interfaces, loggers and
//! custom route-parameter parsers.
//!
//! ## Pipeline
//!
//! 1. **Load**: tree-sitter-go parses each file into a declaration IR
//! 2. **Walk**: doc comments are paired with declarations and parsed
//! 3. **Reduce**: annotations are grouped into components; routes are
//!    merged with their handler signatures
//! 4. **Validate**: custom path types resolve to registered parsers,
//!    middleware references resolve, lifecycle hooks have the right shape
//!
//! ## Example
//!
//! ```rust,no_run
//! use axon_meta::{BuildSession, Config};
//!
//! fn main() -> axon_meta::Result<()> {
//!     let mut session = BuildSession::new(Config::load_or_default())?;
//!     let package = session.build_package("./internal/users")?;
//!
//!     for route in package.routes() {
//!         println!("{} -> {}.{}", route.label(), route.controller_name, route.handler_name);
//!     }
//!     println!("{}", serde_json::to_string_pretty(&package)?);
//!     Ok(())
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod names;
pub mod package;
pub mod registry;
pub mod routing;
pub mod session;
pub mod source;
pub mod validate;
pub mod walker;

pub use annotation::{parse_annotation, Annotation, AnnotationKind};
pub use config::{BuildOptions, Config, FrameworkConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticList, Severity, SourceLocation};
pub use error::{AxonError, Result};
pub use metadata::{
    ControllerMetadata, CoreServiceMetadata, Dependency, InterfaceMetadata, LoggerMetadata,
    MiddlewareMetadata, PackageMetadata, Parameter, ParameterSource, ReturnKind, RouteMetadata,
    RouteParserMetadata,
};
pub use registry::{MiddlewareRegistry, ParserRegistry};
pub use session::BuildSession;
pub use walker::{WalkResult, Walker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
