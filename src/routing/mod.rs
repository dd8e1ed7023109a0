//! @acp:module "Routing"
//! @acp:summary "Builds route metadata from a route annotation and its handler"
//! @acp:domain routing
//! @acp:layer service

pub mod handler;
pub mod path;

pub use handler::{analyze_handler, classify_return, merge_parameters, PathBinding};
pub use path::{
    extract_path_parameters, join_paths, parse_path_params, rename_path_param, PathParam, WILDCARD,
};

use crate::annotation::Annotation;
use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::metadata::RouteMetadata;
use crate::source::FuncDecl;

/// The controller a route is declared on
#[derive(Debug, Clone, Copy)]
pub struct RouteOwner<'a> {
    pub name: &'a str,
    pub prefix: Option<&'a str>,
}

/// @acp:summary "Assemble one route: path, merged parameters, return kind"
///
/// Route placeholders that reuse a name from the controller prefix are
/// renamed to `<Controller>_<name>` so the full path stays unambiguous; the
/// handler parameter that binds to one records the new name as `path_key`.
/// Handler parameters may also bind to prefix placeholders.
pub fn build_route(
    owner: RouteOwner<'_>,
    handler: &FuncDecl,
    annotation: &Annotation,
    framework: &FrameworkConfig,
) -> Result<RouteMetadata, Diagnostic> {
    let locate = |d: Diagnostic| d.at(&annotation.file, annotation.line);
    let method = annotation.param("method").unwrap_or_default().to_string();
    let declared = annotation.param("path").unwrap_or_default();

    let route_params = parse_path_params(declared).map_err(locate)?;
    let prefix_params = match owner.prefix {
        Some(prefix) => parse_path_params(prefix).map_err(locate)?,
        None => Vec::new(),
    };

    let mut path = declared.to_string();
    let mut bindings = Vec::new();
    for param in &route_params {
        let collides =
            !param.is_wildcard && prefix_params.iter().any(|p| p.name == param.name);
        if collides {
            let key = format!("{}_{}", owner.name, param.name);
            tracing::debug!(
                "Renaming path parameter {} to {} in {}.{}",
                param.name,
                key,
                owner.name,
                handler.name
            );
            path = rename_path_param(&path, &param.name, &key).map_err(locate)?;
            bindings.push(PathBinding::renamed(param, key));
        } else {
            bindings.push(PathBinding::new(param));
        }
    }
    bindings.extend(
        prefix_params
            .iter()
            .filter(|p| !p.is_wildcard && !route_params.iter().any(|r| r.name == p.name))
            .map(PathBinding::new),
    );

    let parameters = merge_parameters(analyze_handler(&handler.signature, framework), &bindings);
    let (return_kind, return_type) = classify_return(handler, framework).map_err(locate)?;

    Ok(RouteMetadata {
        full_path: join_paths(owner.prefix, &path),
        path,
        method,
        handler_name: handler.name.clone(),
        controller_name: owner.name.to_string(),
        parameters,
        middlewares: annotation.list_param("-Middleware"),
        return_kind,
        return_type,
        file: annotation.file.clone(),
        line: annotation.line,
    })
}
