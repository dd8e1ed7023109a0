//! @acp:module "Parser Signature Validator"
//! @acp:summary "Checks route_parser functions against func(ctx, string) (T, error)"
//! @acp:domain routing
//! @acp:layer service

use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::metadata::RouteParserMetadata;
use crate::names::{is_primitive_type, trailing_segment};
use crate::source::FuncDecl;

/// @acp:summary "Validate a parser function and describe it for the registry"
pub fn validate_parser_function(
    func: &FuncDecl,
    type_name: &str,
    file: &str,
    framework: &FrameworkConfig,
) -> Result<RouteParserMetadata, Diagnostic> {
    let expected = format!(
        "func {}(c {}, raw string) ({}, {})",
        func.name, framework.request_context, type_name, framework.error_type
    );
    let fail = |problem: String| {
        Diagnostic::validation(format!(
            "parser function '{}' {}; expected {}, found {}",
            func.name,
            problem,
            expected,
            func.signature_text()
        ))
        .at(file, func.line)
        .with_context("function", func.name.as_str())
        .with_context("type_name", type_name)
    };

    if func.receiver.is_some() {
        return Err(fail("must be a package-level function".to_string()));
    }

    let params = func.signature.param_types();
    if params.len() != 2 {
        return Err(fail(format!("has {} parameters, expected 2", params.len())));
    }
    if params[0] != framework.request_context {
        return Err(fail(format!(
            "first parameter is {}, expected {}",
            params[0], framework.request_context
        )));
    }
    if params[1] != "string" {
        return Err(fail(format!("second parameter is {}, expected string", params[1])));
    }

    let results = func.signature.result_types();
    if results.len() != 2 {
        return Err(fail(format!("has {} return values, expected 2", results.len())));
    }
    if results[1] != framework.error_type {
        return Err(fail(format!(
            "second return value is {}, expected {}",
            results[1], framework.error_type
        )));
    }
    if !types_compatible(type_name, &results[0]) {
        return Err(fail(format!(
            "returns {}, which does not match {}",
            results[0], type_name
        )));
    }

    Ok(RouteParserMetadata {
        type_name: type_name.to_string(),
        func_name: func.name.clone(),
        file: file.to_string(),
        line: func.line,
        param_types: params,
        return_types: results,
    })
}

/// @acp:summary "Lenient match of a declared type against a returned type"
///
/// Exact, pointer-stripped and trailing-segment matches pass; of the
/// rest, only two different primitive names are rejected.
pub fn types_compatible(declared: &str, returned: &str) -> bool {
    let declared = declared.trim_start_matches('*');
    let returned = returned.trim_start_matches('*');
    if declared == returned || trailing_segment(declared) == trailing_segment(returned) {
        return true;
    }
    !(is_primitive_type(declared) && is_primitive_type(returned))
}
