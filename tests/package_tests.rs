//! End-to-end package analysis tests
//!
//! Builds small Go packages on disk and checks the resulting metadata and
//! diagnostics through the public session API.

use std::path::Path;

use axon_meta::{
    BuildOptions, BuildSession, Config, DiagnosticKind, ParameterSource, PackageMetadata,
    ReturnKind,
};

fn write_package(dir: &Path, files: &[(&str, &str)]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (name, content) in files {
        std::fs::write(dir.join(name), content)?;
    }
    Ok(())
}

fn build(files: &[(&str, &str)]) -> anyhow::Result<(tempfile::TempDir, axon_meta::Result<PackageMetadata>)> {
    let dir = tempfile::tempdir()?;
    write_package(dir.path(), files)?;
    let mut session = BuildSession::new(Config::default())?;
    let result = session.build_package(dir.path());
    Ok((dir, result))
}

fn diagnostic_kind(err: &axon_meta::AxonError) -> Option<DiagnosticKind> {
    err.diagnostic().map(|d| d.kind)
}

const CONTROLLER: &str = r#"package users

import (
	"github.com/labstack/echo/v4"
	"go.uber.org/fx"
)

// UserController serves /users.
//axon::controller -Prefix=/users
type UserController struct {
	fx.In
	Service UserServiceInterface
}

//axon::route GET /{id:int}
func (c *UserController) GetUser(ctx echo.Context, id int) (*User, error) {
	return c.Service.Find(id)
}

//axon::route PUT /{id:int}
func (c *UserController) UpdateUser(id int, body UpdateUser) error {
	return nil
}

//axon::route GET /by-key/{key:UserKey}
func (c *UserController) ByKey(ctx echo.Context, key UserKey) (*axon.Response, error) {
	return nil, nil
}
"#;

const PARSERS: &str = r#"package users

import "github.com/labstack/echo/v4"

type UserKey string

//axon::route_parser UserKey
func ParseUserKey(c echo.Context, raw string) (UserKey, error) {
	return UserKey(raw), nil
}
"#;

const SERVICE: &str = r#"package users

import "context"

//axon::core -Init
//axon::interface
type UserService struct {
	//axon::inject
	Repo *UserRepo
}

func (s *UserService) Start(ctx context.Context) error { return nil }
func (s *UserService) Find(id int) (*User, error) { return nil, nil }
"#;

// =============================================================================
// Route merge
// =============================================================================

mod route_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_and_path_parameters() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("parsers.go", PARSERS), ("service.go", SERVICE)]).unwrap();
        let package = result.unwrap();

        let controller = package.controller("UserController").unwrap();
        let get = &controller.routes[0];
        assert_eq!(get.method, "GET");
        assert_eq!(get.full_path, "/users/{id:int}");
        assert_eq!(get.return_kind, ReturnKind::DataError);
        assert_eq!(get.return_type.as_deref(), Some("*User"));

        let ctx = &get.parameters[0];
        assert_eq!((ctx.name.as_str(), ctx.source, ctx.position), ("ctx", ParameterSource::Context, 0));
        let id = &get.parameters[1];
        assert_eq!(id.source, ParameterSource::Path);
        assert_eq!(id.type_name, "int");
        assert!(id.required);
    }

    #[test]
    fn test_unmatched_handler_parameter_is_body() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("parsers.go", PARSERS), ("service.go", SERVICE)]).unwrap();
        let package = result.unwrap();
        let update = package.routes().find(|r| r.handler_name == "UpdateUser").unwrap();

        let sources: Vec<_> = update.parameters.iter().map(|p| (p.name.as_str(), p.source)).collect();
        assert_eq!(sources, vec![("id", ParameterSource::Path), ("body", ParameterSource::Body)]);
        assert_eq!(update.return_kind, ReturnKind::ErrorOnly);
    }

    #[test]
    fn test_custom_type_bound_to_parser() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("parsers.go", PARSERS), ("service.go", SERVICE)]).unwrap();
        let package = result.unwrap();
        let by_key = package.routes().find(|r| r.handler_name == "ByKey").unwrap();

        let key = by_key.parameter("key").unwrap();
        assert!(key.is_custom_type);
        assert_eq!(key.parser_func.as_deref(), Some("ParseUserKey"));
        assert_eq!(by_key.return_kind, ReturnKind::ResponseError);
    }

    #[test]
    fn test_colon_placeholder_binds_as_string() {
        let src = r#"package items

//axon::controller
type ItemController struct{}

//axon::route GET /:id
func (c *ItemController) Get(ctx echo.Context, id int) error { return nil }
"#;
        let (_dir, result) = build(&[("items.go", src)]).unwrap();
        let package = result.unwrap();
        let id = package.routes().next().unwrap().parameter("id").unwrap().clone();
        assert_eq!(id.source, ParameterSource::Path);
        assert_eq!(id.type_name, "string");
        assert!(!id.is_custom_type);
        assert_eq!(id.parser_func, None);
    }

    #[test]
    fn test_files_are_analyzed_in_name_order() {
        let (_dir, result) = build(&[("service.go", SERVICE), ("parsers.go", PARSERS), ("controller.go", CONTROLLER)]).unwrap();
        let package = result.unwrap();
        let files: Vec<_> = package
            .file_imports
            .keys()
            .map(|k| Path::new(k).file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["controller.go", "parsers.go", "service.go"]);
        assert_eq!(package.file_imports.values().next().unwrap().len(), 2);
    }
}

// =============================================================================
// Parser registry
// =============================================================================

mod parser_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_parser_reports_type_and_route() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("service.go", SERVICE)]).unwrap();
        let err = result.unwrap_err();
        let diagnostic = err.diagnostic().unwrap();

        assert_eq!(diagnostic.kind, DiagnosticKind::NotFound);
        assert_eq!(diagnostic.message, "no parser registered for custom type 'UserKey'");
        assert_eq!(diagnostic.context_value("type_name"), Some("UserKey"));
        assert_eq!(diagnostic.context_value("route_path"), Some("/users/by-key/{key:UserKey}"));
        assert_eq!(diagnostic.context_value("parameter_name"), Some("key"));
    }

    #[test]
    fn test_duplicate_parser_lists_both_locations() {
        let dup = PARSERS.replace("type UserKey string\n", "").replace("ParseUserKey", "ParseUserKeyAgain");
        let (_dir, result) = build(&[("a.go", PARSERS), ("b.go", dup.as_str())]).unwrap();
        let err = result.unwrap_err();
        let diagnostic = err.diagnostic().unwrap();

        assert_eq!(diagnostic.kind, DiagnosticKind::Conflict);
        assert!(diagnostic.message.contains("a.go:8"), "{}", diagnostic.message);
        assert!(diagnostic.message.contains("b.go:7"), "{}", diagnostic.message);
    }

    #[test]
    fn test_one_parameter_parser_is_rejected() {
        let bad = PARSERS.replace("c echo.Context, raw string", "raw string");
        let (_dir, result) = build(&[("parsers.go", bad.as_str())]).unwrap();
        let err = result.unwrap_err();
        assert_eq!(diagnostic_kind(&err), Some(DiagnosticKind::Validation));
        assert!(err.to_string().contains("has 1 parameters, expected 2"));
    }

    #[test]
    fn test_builtin_alias_resolves_without_user_parser() {
        let src = r#"package orders

//axon::controller
type OrderController struct{}

//axon::route GET /orders/{id:UUID}
func (c *OrderController) Get(ctx echo.Context, id uuid.UUID) error { return nil }
"#;
        let (_dir, result) = build(&[("orders.go", src)]).unwrap();
        let package = result.unwrap();
        let id = package.routes().next().unwrap().parameter("id").unwrap().clone();
        assert_eq!(id.parser_func.as_deref(), Some("axon.ParseUUID"));
    }
}

// =============================================================================
// Lifecycle and middleware
// =============================================================================

mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_service_without_start() {
        let src = "package svc\n\n//axon::core -Init\ntype Mailer struct{}\n\nfunc (m *Mailer) Send() error { return nil }\n";
        let (_dir, result) = build(&[("mailer.go", src)]).unwrap();
        let err = result.unwrap_err();
        assert_eq!(diagnostic_kind(&err), Some(DiagnosticKind::Lifecycle));
        let message = err.to_string();
        assert!(message.contains("Mailer"));
        assert!(message.contains("Start(ctx context.Context) error"));
    }

    #[test]
    fn test_service_metadata() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("parsers.go", PARSERS), ("service.go", SERVICE)]).unwrap();
        let package = result.unwrap();
        let service = package.core_service("UserService").unwrap();
        assert!(service.is_init && service.has_start);
        assert_eq!(service.dependencies.len(), 1);
        assert_eq!(package.interfaces[0].name, "UserServiceInterface");
    }

    #[test]
    fn test_unknown_middleware_references_are_aggregated() {
        let src = r#"package api

//axon::middleware Auth
type AuthMiddleware struct{}

func (m *AuthMiddleware) Handle(next echo.HandlerFunc) echo.HandlerFunc { return next }

//axon::controller -Middleware=Auth,RateLimit,Audit
type Api struct{}
"#;
        let (_dir, result) = build(&[("api.go", src)]).unwrap();
        let err = result.unwrap_err();
        let diagnostic = err.diagnostic().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::NotFound);
        assert!(diagnostic.message.ends_with("RateLimit, Audit"));
    }
}

// =============================================================================
// Two-phase multi-package builds
// =============================================================================

mod session_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONSUMER: &str = r#"package web

//axon::controller -Middleware=Auth
type Web struct{}

//axon::route GET /items/{id:ItemID}
func (w *Web) Item(ctx echo.Context, id ItemID) error { return nil }
"#;

    const PROVIDER: &str = r#"package shared

//axon::route_parser ItemID
func ParseItemID(c echo.Context, raw string) (ItemID, error) { return ItemID(raw), nil }

//axon::middleware Auth
type AuthMiddleware struct{}

func (m *AuthMiddleware) Handle(next echo.HandlerFunc) echo.HandlerFunc { return next }
"#;

    #[test]
    fn test_deferred_validation_sees_later_packages() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("go.mod"), "module example.com/shop\n\ngo 1.22\n").unwrap();
        write_package(&root.path().join("web"), &[("web.go", CONSUMER)]).unwrap();
        write_package(&root.path().join("shared"), &[("shared.go", PROVIDER)]).unwrap();

        let mut config = Config::default();
        config.build = BuildOptions::deferred();
        let mut session = BuildSession::new(config).unwrap();

        let mut packages = vec![
            session.build_package(root.path().join("web")).unwrap(),
            session.build_package(root.path().join("shared")).unwrap(),
        ];
        assert_eq!(packages[0].routes().next().unwrap().parameters[1].parser_func, None);
        assert_eq!(packages[0].import_path.as_deref(), Some("example.com/shop/web"));
        assert_eq!(packages[1].module_path.as_deref(), Some("example.com/shop"));

        session.validate(&mut packages).unwrap();
        let id = &packages[0].routes().next().unwrap().parameters[1];
        assert_eq!(id.parser_func.as_deref(), Some("ParseItemID"));
    }

    #[test]
    fn test_eager_validation_fails_on_forward_reference() {
        let root = tempfile::tempdir().unwrap();
        write_package(&root.path().join("web"), &[("web.go", CONSUMER)]).unwrap();
        let mut session = BuildSession::new(Config::default()).unwrap();
        let err = session.build_package(root.path().join("web")).unwrap_err();
        assert!(err.to_string().contains("ItemID"));
    }

    #[test]
    fn test_audit_collects_every_problem() {
        let root = tempfile::tempdir().unwrap();
        write_package(&root.path().join("web"), &[("web.go", CONSUMER)]).unwrap();
        let mut session = BuildSession::new(Config::default()).unwrap();
        session.set_options(BuildOptions::deferred());

        let packages = vec![session.build_package(root.path().join("web")).unwrap()];
        let report = session.audit_parsers(&packages);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.get(0).unwrap().context_value("type_name"), Some("ItemID"));
    }

    #[test]
    fn test_rebuilding_a_package_reuses_its_registrations() {
        let root = tempfile::tempdir().unwrap();
        write_package(&root.path().join("shared"), &[("shared.go", PROVIDER)]).unwrap();
        let mut session = BuildSession::new(Config::default()).unwrap();

        let first = session.build_package(root.path().join("shared")).unwrap();
        let second = session.build_package(root.path().join("shared")).unwrap();
        assert_eq!(first, second);
        assert!(session.parsers().contains("ItemID"));
        assert_eq!(session.middlewares().names(), vec!["Auth"]);
    }

    #[test]
    fn test_retry_after_failed_build() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("shop");
        let broken = format!("{}\n//axon::controller -Middleware=Audit\ntype Shop struct{{}}\n", PROVIDER);
        write_package(&dir, &[("shop.go", broken.as_str())]).unwrap();
        let mut session = BuildSession::new(Config::default()).unwrap();

        let err = session.build_package(&dir).unwrap_err();
        assert_eq!(diagnostic_kind(&err), Some(DiagnosticKind::NotFound));

        let fixed = broken.replace("-Middleware=Audit", "-Middleware=Auth");
        write_package(&dir, &[("shop.go", fixed.as_str())]).unwrap();
        let package = session.build_package(&dir).unwrap();
        assert_eq!(package.controllers[0].middlewares, vec!["Auth"]);
    }

    #[test]
    fn test_metadata_serializes_to_json() {
        let (_dir, result) = build(&[("controller.go", CONTROLLER), ("parsers.go", PARSERS), ("service.go", SERVICE)]).unwrap();
        let package = result.unwrap();
        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["package_name"], "users");
        assert_eq!(json["controllers"][0]["routes"][0]["parameters"][1]["source"], "path");
        assert_eq!(json["core_services"][0]["start_mode"], "same");
    }
}
