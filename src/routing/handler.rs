//! @acp:module "Handler Signatures"
//! @acp:summary "Reconciles handler parameters with path placeholders"
//! @acp:domain routing
//! @acp:layer service

use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::metadata::{Parameter, ParameterSource, ReturnKind};
use crate::source::{FuncDecl, Signature};

use super::path::PathParam;

/// @acp:summary "Classify handler parameters before path information is known"
///
/// Request-context parameters become `Context` (all of them, in order);
/// everything else is tentatively `Body`. Unnamed parameters are called
/// `argN` after their position.
pub fn analyze_handler(signature: &Signature, framework: &FrameworkConfig) -> Vec<Parameter> {
    signature
        .params
        .iter()
        .enumerate()
        .map(|(position, param)| {
            let is_context = param.ty.is(&framework.request_context);
            Parameter {
                name: param
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("arg{}", position)),
                type_name: param.ty.to_string(),
                source: if is_context {
                    ParameterSource::Context
                } else {
                    ParameterSource::Body
                },
                required: false,
                is_custom_type: false,
                parser_func: None,
                position,
                path_key: None,
            }
        })
        .collect()
}

/// A path placeholder offered to the merge, with the key it has in the
/// final template
#[derive(Debug, Clone)]
pub struct PathBinding<'a> {
    pub param: &'a PathParam,
    pub key: String,
}

impl<'a> PathBinding<'a> {
    pub fn new(param: &'a PathParam) -> Self {
        Self {
            key: param.name.clone(),
            param,
        }
    }

    pub fn renamed(param: &'a PathParam, key: String) -> Self {
        Self { param, key }
    }
}

/// @acp:summary "Bind handler parameters to path placeholders"
///
/// A handler parameter named like a placeholder becomes a required `Path`
/// parameter and takes the placeholder's resolved type (`string` for
/// untyped forms). Placeholders without a matching handler parameter are
/// dropped, and so are repeats of a name already bound. The first wildcard
/// claims the first unclaimed `string` parameter that is not a request
/// context; later wildcards bind nothing.
pub fn merge_parameters(mut handler: Vec<Parameter>, bindings: &[PathBinding<'_>]) -> Vec<Parameter> {
    let mut claimed = vec![false; handler.len()];
    let mut seen: Vec<&str> = Vec::new();

    for binding in bindings.iter().filter(|b| !b.param.is_wildcard) {
        if seen.contains(&binding.param.name.as_str()) {
            continue;
        }
        seen.push(&binding.param.name);
        let found = handler.iter().enumerate().position(|(i, p)| {
            !claimed[i] && p.source != ParameterSource::Context && p.name == binding.param.name
        });
        if let Some(index) = found {
            claimed[index] = true;
            bind(&mut handler[index], binding);
        }
    }

    if let Some(binding) = bindings.iter().find(|b| b.param.is_wildcard) {
        let found = handler.iter().enumerate().position(|(i, p)| {
            !claimed[i] && p.source != ParameterSource::Context && p.type_name == "string"
        });
        if let Some(index) = found {
            bind(&mut handler[index], binding);
        }
    }

    handler
}

fn bind(param: &mut Parameter, binding: &PathBinding<'_>) {
    param.source = ParameterSource::Path;
    param.required = true;
    param.type_name = binding.param.type_name.clone();
    param.is_custom_type = binding.param.is_custom_type;
    if binding.key != param.name {
        param.path_key = Some(binding.key.clone());
    }
}

/// @acp:summary "Classify a handler's results"
///
/// Returns the kind and, for two-result handlers, the first result type.
pub fn classify_return(
    func: &FuncDecl,
    framework: &FrameworkConfig,
) -> Result<(ReturnKind, Option<String>), Diagnostic> {
    let results = func.signature.result_types();
    let error = framework.error_type.as_str();
    match results.as_slice() {
        [only] if only == error => Ok((ReturnKind::ErrorOnly, None)),
        [first, second] if second == error && *first == framework.response_type => {
            Ok((ReturnKind::ResponseError, Some(first.clone())))
        }
        [first, second] if second == error && first != error => {
            Ok((ReturnKind::DataError, Some(first.clone())))
        }
        _ => Err(Diagnostic::validation(format!(
            "handler '{}' must return {}, (T, {}) or ({}, {}); found {}",
            func.qualified_name(),
            error,
            error,
            framework.response_type,
            error,
            func.signature_text()
        ))
        .with_context("handler", func.qualified_name())),
    }
}
