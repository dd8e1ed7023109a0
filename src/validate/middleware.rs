//! @acp:module "Middleware Validator"
//! @acp:summary "Checks Handle(next HandlerFunc) HandlerFunc on middleware structs"
//! @acp:domain routing
//! @acp:layer service

use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::source::FuncDecl;

pub fn check_middleware_handle(
    name: &str,
    struct_name: &str,
    methods: &[&FuncDecl],
    file: &str,
    line: usize,
    framework: &FrameworkConfig,
) -> Result<(), Diagnostic> {
    let next = &framework.next_handler;
    let required = format!("Handle(next {}) {}", next, next);

    let Some(handle) = methods.iter().find(|m| m.name == "Handle") else {
        return Err(Diagnostic::lifecycle(format!(
            "middleware '{}' ({}) has no Handle method; required {}",
            name, struct_name, required
        ))
        .at(file, line)
        .with_context("middleware", name)
        .with_suggestion(format!(
            "func (m *{}) {} {{ return next }}",
            struct_name, required
        )));
    };

    let fail = |problem: String| {
        Diagnostic::validation(format!(
            "middleware '{}' Handle {}; required {}, found {}",
            name,
            problem,
            required,
            handle.signature_text()
        ))
        .at(file, handle.line)
        .with_context("middleware", name)
    };

    let params = handle.signature.param_types();
    if params.len() != 1 {
        return Err(fail(format!("has {} parameters, expected 1", params.len())));
    }
    if params[0] != *next {
        return Err(fail(format!("parameter is {}, expected {}", params[0], next)));
    }
    let results = handle.signature.result_types();
    if results.len() != 1 {
        return Err(fail(format!("has {} return values, expected 1", results.len())));
    }
    if results[0] != *next {
        return Err(fail(format!("returns {}, expected {}", results[0], next)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::source::GoParser;

    fn check(src: &str) -> Result<(), Diagnostic> {
        let file = GoParser::new()
            .unwrap()
            .parse_source("m.go", &format!("package m\n\n{}\n", src))
            .unwrap();
        let methods: Vec<&FuncDecl> = file.functions().collect();
        check_middleware_handle("Auth", "AuthMiddleware", &methods, "m.go", 1, &FrameworkConfig::default())
    }

    #[test]
    fn test_valid_handle() {
        check("func (m *AuthMiddleware) Handle(next echo.HandlerFunc) echo.HandlerFunc { return next }")
            .unwrap();
    }

    #[test]
    fn test_missing_handle_is_lifecycle() {
        let err = check("func (m *AuthMiddleware) Run() {}").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lifecycle);
        assert!(err.message.contains("Handle(next echo.HandlerFunc) echo.HandlerFunc"));
    }

    #[test]
    fn test_specific_mismatches() {
        let cases = [
            ("func (m *AuthMiddleware) Handle() echo.HandlerFunc { return nil }", "has 0 parameters"),
            ("func (m *AuthMiddleware) Handle(next http.Handler) echo.HandlerFunc { return nil }", "parameter is http.Handler"),
            ("func (m *AuthMiddleware) Handle(next echo.HandlerFunc) {}", "has 0 return values"),
            ("func (m *AuthMiddleware) Handle(next echo.HandlerFunc) error { return nil }", "returns error"),
        ];
        for (src, expected) in cases {
            let err = check(src).unwrap_err();
            assert_eq!(err.kind, DiagnosticKind::Validation);
            assert!(err.message.contains(expected), "{}", err.message);
        }
    }
}
