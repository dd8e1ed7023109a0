//! @acp:module "Package Reducer"
//! @acp:summary "Groups a package's annotations into validated components"
//! @acp:domain analysis
//! @acp:layer service
//!
//! Pure over its inputs: loaded files plus the walker's annotations in,
//! `PackageMetadata` or the first diagnostic out. Registry-dependent
//! checks (parser resolution, middleware references) run in the session.

use std::collections::{BTreeMap, HashMap};

use crate::annotation::{Annotation, AnnotationKind};
use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::metadata::{
    ControllerMetadata, CoreServiceMetadata, InterfaceMetadata, LoggerMetadata, MethodSignature,
    MiddlewareMetadata, PackageMetadata, RouteMetadata, ServiceMode, StartMode,
};
use crate::names::is_exported;
use crate::routing::{build_route, RouteOwner};
use crate::source::{FuncDecl, SourceFile};
use crate::validate::{check_lifecycle, check_middleware_handle, validate_parser_function};

const LIFECYCLE_HOOKS: &[&str] = &["Start", "Stop"];

/// Declarations of one package indexed by name
struct PackageIndex<'a> {
    functions: HashMap<&'a str, &'a FuncDecl>,
    methods: HashMap<&'a str, Vec<&'a FuncDecl>>,
}

impl<'a> PackageIndex<'a> {
    fn new(files: &'a [SourceFile]) -> Self {
        let mut functions = HashMap::new();
        let mut methods: HashMap<&str, Vec<&FuncDecl>> = HashMap::new();
        for func in files.iter().flat_map(|f| f.functions()) {
            match &func.receiver {
                Some(recv) => methods.entry(recv.type_name.as_str()).or_default().push(func),
                None => {
                    functions.insert(func.name.as_str(), func);
                }
            }
        }
        Self { functions, methods }
    }

    fn methods_of(&self, type_name: &str) -> &[&'a FuncDecl] {
        self.methods.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn method(&self, type_name: &str, name: &str) -> Option<&'a FuncDecl> {
        self.methods_of(type_name).iter().copied().find(|m| m.name == name)
    }
}

/// @acp:summary "Build package metadata from loaded files and their annotations"
pub fn reduce(
    files: &[SourceFile],
    annotations: &[Annotation],
    framework: &FrameworkConfig,
) -> Result<PackageMetadata, Diagnostic> {
    let package_name = package_name(files)?;
    check_duplicates(annotations)?;
    let index = PackageIndex::new(files);

    let mut package = PackageMetadata {
        package_name,
        file_imports: files
            .iter()
            .map(|f| (f.path.clone(), f.imports.clone()))
            .collect(),
        ..PackageMetadata::default()
    };

    for ann in annotations {
        match ann.kind {
            AnnotationKind::Controller => package.controllers.push(controller(ann)),
            AnnotationKind::Middleware => {
                package.middlewares.push(middleware(ann, &index, framework)?)
            }
            AnnotationKind::Core => package.core_services.push(core_service(ann, &index, framework)?),
            AnnotationKind::Logger => package.loggers.push(logger(ann, &index, framework)?),
            AnnotationKind::Interface => package.interfaces.push(interface(ann, &index)),
            AnnotationKind::RouteParser => {
                let func = index.functions.get(ann.target.as_str()).ok_or_else(|| {
                    Diagnostic::not_found(format!("route parser function '{}' not found", ann.target))
                        .at(&ann.file, ann.line)
                })?;
                let type_name = ann.param("name").unwrap_or_default();
                package
                    .route_parsers
                    .push(validate_parser_function(func, type_name, &ann.file, framework)?);
            }
            AnnotationKind::Route | AnnotationKind::Inject | AnnotationKind::Init => {}
        }
    }

    let routes = annotations.iter().filter(|a| a.kind == AnnotationKind::Route);
    for ann in routes {
        let route = route_for(ann, &package.controllers, &index, framework)?;
        check_route_unique(&package, &route)?;
        if let Some(owner) = package
            .controllers
            .iter_mut()
            .find(|c| c.name == route.controller_name)
        {
            owner.routes.push(route);
        }
    }

    tracing::debug!(
        "Reduced package {}: {} controllers, {} routes, {} services",
        package.package_name,
        package.controllers.len(),
        package.routes().count(),
        package.core_services.len()
    );
    Ok(package)
}

fn package_name(files: &[SourceFile]) -> Result<String, Diagnostic> {
    let mut names: Vec<&str> = files.iter().map(|f| f.package.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    match names.as_slice() {
        [] => Err(Diagnostic::validation("package has no Go source files")),
        [single] => Ok(single.to_string()),
        several => {
            let first = &files[0];
            Err(Diagnostic::validation(format!(
                "files declare different packages: {}",
                several.join(", ")
            ))
            .at(&first.path, 1))
        }
    }
}

/// One component annotation of a kind per symbol
fn check_duplicates(annotations: &[Annotation]) -> Result<(), Diagnostic> {
    let mut seen: BTreeMap<(AnnotationKind, &str), &Annotation> = BTreeMap::new();
    for ann in annotations {
        if matches!(ann.kind, AnnotationKind::Inject | AnnotationKind::Init) {
            continue;
        }
        if let Some(first) = seen.insert((ann.kind, ann.target.as_str()), ann) {
            return Err(Diagnostic::conflict(format!(
                "'{}' is annotated with {} more than once ({}:{} and {}:{})",
                ann.target, ann.kind, first.file, first.line, ann.file, ann.line
            ))
            .at(&ann.file, ann.line));
        }
    }

    let mut names: BTreeMap<&str, &Annotation> = BTreeMap::new();
    for ann in annotations.iter().filter(|a| a.kind == AnnotationKind::Middleware) {
        let name = ann.param("name").unwrap_or_default();
        if let Some(first) = names.insert(name, ann) {
            return Err(Diagnostic::conflict(format!(
                "middleware '{}' is declared by both {} ({}:{}) and {} ({}:{})",
                name, first.target, first.file, first.line, ann.target, ann.file, ann.line
            ))
            .at(&ann.file, ann.line));
        }
    }
    Ok(())
}

fn controller(ann: &Annotation) -> ControllerMetadata {
    ControllerMetadata {
        name: ann.target.clone(),
        prefix: ann.param("-Prefix").map(str::to_string),
        middlewares: ann.list_param("-Middleware"),
        dependencies: ann.dependencies.clone(),
        routes: Vec::new(),
        file: ann.file.clone(),
        line: ann.line,
    }
}

fn middleware(
    ann: &Annotation,
    index: &PackageIndex<'_>,
    framework: &FrameworkConfig,
) -> Result<MiddlewareMetadata, Diagnostic> {
    let name = ann.param("name").unwrap_or_default().to_string();
    check_middleware_handle(
        &name,
        &ann.target,
        index.methods_of(&ann.target),
        &ann.file,
        ann.line,
        framework,
    )?;
    Ok(MiddlewareMetadata {
        name,
        struct_name: ann.target.clone(),
        dependencies: ann.dependencies.clone(),
        is_global: ann.has_flag("-Global"),
        priority: ann.int_param("-Priority")?,
        file: ann.file.clone(),
        line: ann.line,
    })
}

/// `-Init` as a flag or `-Init=<mode>`
fn init_mode(ann: &Annotation) -> Option<StartMode> {
    match ann.param("-Init") {
        Some(mode) => mode.parse().ok(),
        None if ann.has_flag("-Init") => Some(StartMode::Same),
        None => None,
    }
}

fn core_service(
    ann: &Annotation,
    index: &PackageIndex<'_>,
    framework: &FrameworkConfig,
) -> Result<CoreServiceMetadata, Diagnostic> {
    let start_mode = init_mode(ann);
    let lifecycle = check_lifecycle(
        "core service",
        &ann.target,
        index.methods_of(&ann.target),
        start_mode.is_some(),
        &ann.file,
        ann.line,
        framework,
    )?;
    if let Some(constructor) = ann.param("-Constructor") {
        if !index.functions.contains_key(constructor) {
            return Err(Diagnostic::not_found(format!(
                "constructor '{}' for core service '{}' not found in package",
                constructor, ann.target
            ))
            .at(&ann.file, ann.line));
        }
    }
    Ok(CoreServiceMetadata {
        struct_name: ann.target.clone(),
        dependencies: ann.dependencies.clone(),
        is_init: start_mode.is_some(),
        start_mode: start_mode.unwrap_or_default(),
        mode: ann
            .param("-Mode")
            .and_then(|m| m.parse().ok())
            .unwrap_or(ServiceMode::Singleton),
        constructor: ann.param("-Constructor").map(str::to_string),
        has_start: lifecycle.has_start,
        has_stop: lifecycle.has_stop,
        file: ann.file.clone(),
        line: ann.line,
    })
}

fn logger(
    ann: &Annotation,
    index: &PackageIndex<'_>,
    framework: &FrameworkConfig,
) -> Result<LoggerMetadata, Diagnostic> {
    let start_mode = init_mode(ann);
    let lifecycle = check_lifecycle(
        "logger",
        &ann.target,
        index.methods_of(&ann.target),
        start_mode.is_some(),
        &ann.file,
        ann.line,
        framework,
    )?;
    Ok(LoggerMetadata {
        struct_name: ann.target.clone(),
        dependencies: ann.dependencies.clone(),
        is_init: start_mode.is_some(),
        start_mode: start_mode.unwrap_or_default(),
        has_start: lifecycle.has_start,
        has_stop: lifecycle.has_stop,
        file: ann.file.clone(),
        line: ann.line,
    })
}

fn interface(ann: &Annotation, index: &PackageIndex<'_>) -> InterfaceMetadata {
    let methods = index
        .methods_of(&ann.target)
        .iter()
        .filter(|m| is_exported(&m.name) && !LIFECYCLE_HOOKS.contains(&m.name.as_str()))
        .map(|m| MethodSignature {
            name: m.name.clone(),
            params: m.signature.param_types(),
            results: m.signature.result_types(),
            text: format!("{}{}", m.name, m.signature),
        })
        .collect();
    InterfaceMetadata {
        name: ann
            .param("-Name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}Interface", ann.target)),
        struct_name: ann.target.clone(),
        methods,
        file: ann.file.clone(),
        line: ann.line,
    }
}

fn route_for(
    ann: &Annotation,
    controllers: &[ControllerMetadata],
    index: &PackageIndex<'_>,
    framework: &FrameworkConfig,
) -> Result<RouteMetadata, Diagnostic> {
    let owner_name = ann.target_type();
    let method_name = ann.target_member().unwrap_or_default();
    let controller = controllers.iter().find(|c| c.name == owner_name).ok_or_else(|| {
        Diagnostic::not_found(format!(
            "route handler '{}' belongs to '{}', which is not annotated as a controller",
            ann.target, owner_name
        ))
        .at(&ann.file, ann.line)
        .with_context("controller", owner_name)
        .with_suggestion(format!("add //axon::controller above type {}", owner_name))
    })?;
    let handler = index.method(owner_name, method_name).ok_or_else(|| {
        Diagnostic::not_found(format!("route handler '{}' not found", ann.target))
            .at(&ann.file, ann.line)
    })?;
    build_route(
        RouteOwner {
            name: &controller.name,
            prefix: controller.prefix.as_deref(),
        },
        handler,
        ann,
        framework,
    )
}

fn check_route_unique(package: &PackageMetadata, route: &RouteMetadata) -> Result<(), Diagnostic> {
    let clash = package
        .routes()
        .find(|r| r.method == route.method && r.full_path == route.full_path);
    match clash {
        Some(existing) => Err(Diagnostic::conflict(format!(
            "route {} is declared by both {}.{} ({}:{}) and {}.{}",
            route.label(),
            existing.controller_name,
            existing.handler_name,
            existing.file,
            existing.line,
            route.controller_name,
            route.handler_name
        ))
        .at(&route.file, route.line)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::metadata::{ParameterSource, ReturnKind};
    use crate::source::GoParser;
    use crate::walker::Walker;

    fn reduce_src(src: &str) -> Result<PackageMetadata, Diagnostic> {
        let file = GoParser::new().unwrap().parse_source("app.go", src).unwrap();
        let framework = FrameworkConfig::default();
        let annotations = Walker::new(&framework).walk(&file).into_result()?;
        reduce(&[file], &annotations, &framework)
    }

    const USERS: &str = r#"package users

//axon::controller -Prefix=/users -Middleware=Auth
type UserController struct {
	fx.In
	Service UserServiceInterface
}

//axon::route GET /{id:int}
func (c *UserController) Get(ctx echo.Context, id int) (*User, error) { return nil, nil }

//axon::route POST /
func (c *UserController) Create(ctx echo.Context, body CreateUser) (*axon.Response, error) { return nil, nil }

//axon::core -Init=Background -Mode=Transient
//axon::interface
type UserService struct {
	//axon::inject
	Repo *Repo
}

func (s *UserService) Start(ctx context.Context) error { return nil }
func (s *UserService) Find(id int) (*User, error) { return nil, nil }
func (s *UserService) helper() {}
"#;

    #[test]
    fn test_full_package() {
        let package = reduce_src(USERS).unwrap();
        assert_eq!(package.package_name, "users");

        let controller = package.controller("UserController").unwrap();
        assert_eq!(controller.prefix.as_deref(), Some("/users"));
        assert_eq!(controller.middlewares, vec!["Auth"]);
        assert_eq!(controller.dependencies[0].name, "Service");
        assert_eq!(controller.routes.len(), 2);

        let get = &controller.routes[0];
        assert_eq!(get.full_path, "/users/{id:int}");
        assert_eq!(get.parameter("id").unwrap().source, ParameterSource::Path);
        assert_eq!(controller.routes[1].return_kind, ReturnKind::ResponseError);
        assert_eq!(controller.routes[1].full_path, "/users");

        let service = package.core_service("UserService").unwrap();
        assert!(service.is_init);
        assert_eq!(service.start_mode, StartMode::Background);
        assert_eq!(service.mode, ServiceMode::Transient);
        assert!(service.has_start && !service.has_stop);
        assert_eq!(service.dependencies[0].type_name, "*Repo");

        let iface = &package.interfaces[0];
        assert_eq!(iface.name, "UserServiceInterface");
        assert_eq!(iface.methods.len(), 1);
        assert_eq!(iface.methods[0].text, "Find(id int) (*User, error)");
    }

    #[test]
    fn test_route_without_controller_is_not_found() {
        let err = reduce_src(
            "package p\n\ntype Plain struct{}\n\n//axon::route GET /x\nfunc (p *Plain) X(c echo.Context) error { return nil }\n",
        )
        .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::NotFound);
        assert!(err.message.contains("not annotated as a controller"));
    }

    #[test]
    fn test_init_without_start_fails() {
        let err = reduce_src("package p\n\n//axon::core -Init\ntype Clock struct{}\n").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lifecycle);
        assert!(err.message.contains("'Clock'"));
        assert!(err.message.contains("Start(ctx context.Context) error"));
    }

    #[test]
    fn test_logger_init_flag() {
        let package = reduce_src(
            "package p\n\n//axon::logger -Init\ntype AppLogger struct{}\n\nfunc (l *AppLogger) Start(ctx context.Context) error { return nil }\n",
        )
        .unwrap();
        assert!(package.loggers[0].is_init);
        assert_eq!(package.loggers[0].start_mode, StartMode::Same);
    }

    #[test]
    fn test_duplicate_route_is_conflict() {
        let err = reduce_src(
            r#"package p

//axon::controller
type A struct{}

//axon::route GET /x
func (a *A) One(c echo.Context) error { return nil }

//axon::route get /x
func (a *A) Two(c echo.Context) error { return nil }
"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Conflict);
        assert!(err.message.contains("GET /x"));
    }

    #[test]
    fn test_route_parser_is_validated() {
        let package = reduce_src(
            "package p\n\n//axon::route_parser OrderID\nfunc ParseOrderID(c echo.Context, raw string) (OrderID, error) { return 0, nil }\n",
        )
        .unwrap();
        assert_eq!(package.route_parsers[0].func_name, "ParseOrderID");

        let err = reduce_src(
            "package p\n\n//axon::route_parser OrderID\nfunc ParseOrderID(raw string) (OrderID, error) { return 0, nil }\n",
        )
        .unwrap_err();
        assert!(err.message.contains("has 1 parameters, expected 2"));
    }

    #[test]
    fn test_middleware_requires_handle() {
        let err = reduce_src("package p\n\n//axon::middleware Auth\ntype AuthMiddleware struct{}\n")
            .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lifecycle);
    }

    #[test]
    fn test_middleware_priority() {
        let package = reduce_src(
            "package p\n\n//axon::middleware Auth -Global -Priority=7\ntype AuthMiddleware struct{}\n\nfunc (m *AuthMiddleware) Handle(next echo.HandlerFunc) echo.HandlerFunc { return next }\n",
        )
        .unwrap();
        assert_eq!(package.middlewares[0].priority, Some(7));
        assert!(package.middlewares[0].is_global);
    }
}
