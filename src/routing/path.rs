//! @acp:module "Path Templates"
//! @acp:summary "Extracts typed parameters from route path templates"
//! @acp:domain routing
//! @acp:layer parser
//!
//! Accepted placeholder forms, freely mixed in one template:
//!
//! - `{name:Type}` and `{name}`
//! - `:name` (always `string`)
//! - `*` wildcard (a parameter named `*`, typed `string`)

use std::ops::Range;

use crate::diagnostics::Diagnostic;
use crate::metadata::{Parameter, ParameterSource};
use crate::names::{is_identifier, is_primitive_type, is_qualified_identifier};

/// Name given to the wildcard segment
pub const WILDCARD: &str = "*";

/// @acp:summary "One placeholder found in a template"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    pub name: String,
    pub type_name: String,
    /// Declared as `{name:Type}`
    pub explicit_type: bool,
    pub is_custom_type: bool,
    pub is_wildcard: bool,
    /// Byte range of the name inside the template
    pub span: Range<usize>,
}

fn path_error(path: &str, reason: &str) -> Diagnostic {
    Diagnostic::validation(format!("invalid route path '{}': {}", path, reason))
        .with_context("path", path)
}

/// @acp:summary "Scan a template left to right and collect its placeholders"
pub fn parse_path_params(path: &str) -> Result<Vec<PathParam>, Diagnostic> {
    let bytes = path.as_bytes();
    let mut params: Vec<PathParam> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let close = path[i + 1..]
                    .find('}')
                    .ok_or_else(|| path_error(path, "unclosed parameter bracket"))?;
                let inner_start = i + 1;
                let inner = &path[inner_start..inner_start + close];
                let (name, ty) = match inner.split_once(':') {
                    Some((name, ty)) => (name, Some(ty.trim())),
                    None => (inner, None),
                };
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(path_error(path, "parameter name cannot be empty"));
                }
                if !is_identifier(trimmed) {
                    return Err(path_error(
                        path,
                        &format!("parameter name '{}' is not a valid identifier", trimmed),
                    ));
                }
                let name_start = inner_start + (name.len() - name.trim_start().len());
                let span = name_start..name_start + trimmed.len();
                let param = match ty {
                    Some(ty) if !is_qualified_identifier(ty) => {
                        return Err(path_error(
                            path,
                            &format!("invalid parameter type '{}' for '{}'", ty, trimmed),
                        )
                        .with_context("parameter_name", trimmed));
                    }
                    Some(ty) => PathParam {
                        name: trimmed.to_string(),
                        type_name: ty.to_string(),
                        explicit_type: true,
                        is_custom_type: !is_primitive_type(ty),
                        is_wildcard: false,
                        span,
                    },
                    None => string_param(trimmed, span),
                };
                params.push(param);
                i = inner_start + close + 1;
            }
            b':' => {
                let start = i + 1;
                let len = path[start..]
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(path.len() - start);
                if len == 0 {
                    return Err(path_error(path, "parameter name cannot be empty"));
                }
                let name = &path[start..start + len];
                if !is_identifier(name) {
                    return Err(path_error(
                        path,
                        &format!("parameter name '{}' is not a valid identifier", name),
                    ));
                }
                params.push(string_param(name, start..start + len));
                i = start + len;
            }
            b'*' => {
                let mut param = string_param(WILDCARD, i..i + 1);
                param.is_wildcard = true;
                params.push(param);
                i += 1;
            }
            _ => i += 1,
        }
    }

    Ok(params)
}

fn string_param(name: &str, span: Range<usize>) -> PathParam {
    PathParam {
        name: name.to_string(),
        type_name: "string".to_string(),
        explicit_type: false,
        is_custom_type: false,
        is_wildcard: false,
        span,
    }
}

/// @acp:summary "Template placeholders as required path parameters"
pub fn extract_path_parameters(path: &str) -> Result<Vec<Parameter>, Diagnostic> {
    Ok(parse_path_params(path)?
        .into_iter()
        .enumerate()
        .map(|(position, p)| Parameter {
            name: p.name,
            type_name: p.type_name,
            source: ParameterSource::Path,
            required: true,
            is_custom_type: p.is_custom_type,
            parser_func: None,
            position,
            path_key: None,
        })
        .collect())
}

/// Rewrite every placeholder called `from` to `to`, keeping its syntax
pub fn rename_path_param(path: &str, from: &str, to: &str) -> Result<String, Diagnostic> {
    let params = parse_path_params(path)?;
    let mut renamed = path.to_string();
    for param in params.iter().rev().filter(|p| p.name == from && !p.is_wildcard) {
        renamed.replace_range(param.span.clone(), to);
    }
    Ok(renamed)
}

/// Join a controller prefix and a route path with exactly one `/` between
pub fn join_paths(prefix: Option<&str>, path: &str) -> String {
    let prefix = prefix.unwrap_or("").trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() && !prefix.is_empty() {
        return prefix.to_string();
    }
    format!("{}/{}", prefix, path)
}
