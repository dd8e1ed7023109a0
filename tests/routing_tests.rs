//! Path template and annotation grammar tests through the public API

use axon_meta::annotation::parse_annotation;
use axon_meta::routing::{extract_path_parameters, parse_path_params};
use axon_meta::{AnnotationKind, DiagnosticKind, ParameterSource};

// =============================================================================
// Path parameter extraction
// =============================================================================

mod path_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_variable_becomes_a_required_path_parameter() {
        let params =
            extract_path_parameters("/a/{one:int64}/b/:two/{three}/{four:uuid.UUID}").unwrap();
        assert_eq!(params.len(), 4);
        assert!(params
            .iter()
            .all(|p| p.source == ParameterSource::Path && p.required));

        let typed: Vec<_> = params
            .iter()
            .map(|p| (p.name.as_str(), p.type_name.as_str(), p.is_custom_type))
            .collect();
        assert_eq!(
            typed,
            vec![
                ("one", "int64", false),
                ("two", "string", false),
                ("three", "string", false),
                ("four", "uuid.UUID", true),
            ]
        );
    }

    #[test]
    fn test_brace_and_colon_syntax_differ_only_in_type() {
        let braces = extract_path_parameters("/users/{id:int}").unwrap();
        let colon = extract_path_parameters("/users/:id").unwrap();
        assert_eq!(braces[0].name, colon[0].name);
        assert_eq!(braces[0].source, colon[0].source);
        assert_eq!(braces[0].type_name, "int");
        assert_eq!(colon[0].type_name, "string");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        for path in ["/users/{:int}", "/users/:", "/users/{}"] {
            let err = extract_path_parameters(path).unwrap_err();
            assert_eq!(err.kind, DiagnosticKind::Validation);
            assert!(err.message.contains("parameter name cannot be empty"), "{}", path);
        }
    }

    #[test]
    fn test_unclosed_bracket() {
        let err = extract_path_parameters("/users/{id:int").unwrap_err();
        assert!(err.message.contains("unclosed parameter bracket"));
        assert_eq!(err.context_value("path"), Some("/users/{id:int"));
    }

    #[test]
    fn test_repeated_variables_are_each_returned() {
        for (path, expected) in [("/a/*/b/*", 2), ("/x/{id}/y/{id}", 2), ("/x/:id/{id:int}/*", 3)] {
            let params = extract_path_parameters(path).unwrap();
            assert_eq!(params.len(), expected, "{}", path);
        }
    }

    #[test]
    fn test_wildcard_is_a_string_parameter() {
        let params = parse_path_params("/static/*").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "*");
        assert_eq!(params[0].type_name, "string");
        assert!(params[0].is_wildcard);
    }
}

// =============================================================================
// Annotation grammar
// =============================================================================

mod annotation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_kind_keyword_parses() {
        let lines = [
            ("//axon::controller", AnnotationKind::Controller),
            ("//axon::route GET /", AnnotationKind::Route),
            ("//axon::middleware Auth", AnnotationKind::Middleware),
            ("//axon::core", AnnotationKind::Core),
            ("//axon::service", AnnotationKind::Core),
            ("//axon::interface", AnnotationKind::Interface),
            ("//axon::inject", AnnotationKind::Inject),
            ("//axon::init", AnnotationKind::Init),
            ("//axon::logger", AnnotationKind::Logger),
            ("//axon::route_parser UserID", AnnotationKind::RouteParser),
        ];
        for (line, kind) in lines {
            let ann = parse_annotation(line, "T", "t.go", 1).unwrap();
            assert_eq!(ann.kind, kind, "{}", line);
        }
    }

    #[test]
    fn test_diagnostics_carry_location() {
        let err = parse_annotation("//axon::middleware", "AuthMiddleware", "auth.go", 17).unwrap_err();
        let location = err.location.clone().unwrap();
        assert_eq!((location.file.as_str(), location.line), ("auth.go", 17));
        assert!(err.to_string().starts_with("auth.go:17: validation error"));
        assert!(err.render().contains("error[AX0002]"));
    }
}
