//! @acp:module "Lifecycle Validator"
//! @acp:summary "Start/Stop hook detection for services and loggers"
//! @acp:domain di
//! @acp:layer service

use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::source::FuncDecl;

/// Which lifecycle hooks a struct implements with the expected shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleMethods {
    pub has_start: bool,
    pub has_stop: bool,
}

/// `Name(ctx context.Context) error`
fn is_hook(method: &FuncDecl, framework: &FrameworkConfig) -> bool {
    let params = method.signature.param_types();
    let results = method.signature.result_types();
    params.len() == 1
        && params[0] == framework.lifecycle_context
        && results.len() == 1
        && results[0] == framework.error_type
}

fn hook_signature(name: &str, framework: &FrameworkConfig) -> String {
    format!("{}(ctx {}) {}", name, framework.lifecycle_context, framework.error_type)
}

/// @acp:summary "Inspect a struct's methods for Start/Stop"
///
/// With `requires_start`, a missing or malformed `Start` fails with a
/// Lifecycle diagnostic naming the component. `Stop` is never required.
pub fn check_lifecycle(
    component: &str,
    struct_name: &str,
    methods: &[&FuncDecl],
    requires_start: bool,
    file: &str,
    line: usize,
    framework: &FrameworkConfig,
) -> Result<LifecycleMethods, Diagnostic> {
    let start = methods.iter().find(|m| m.name == "Start");
    let stop = methods.iter().find(|m| m.name == "Stop");
    let lifecycle = LifecycleMethods {
        has_start: start.is_some_and(|m| is_hook(m, framework)),
        has_stop: stop.is_some_and(|m| is_hook(m, framework)),
    };

    if requires_start && !lifecycle.has_start {
        let required = hook_signature("Start", framework);
        let message = match start {
            Some(found) => format!(
                "{} '{}' is marked -Init but its Start method has the wrong signature: found {}, required {}",
                component,
                struct_name,
                found.signature_text(),
                required
            ),
            None => format!(
                "{} '{}' is marked -Init but has no Start method; required {}",
                component, struct_name, required
            ),
        };
        return Err(Diagnostic::lifecycle(message)
            .at(file, line)
            .with_context("component", struct_name)
            .with_context("required_signature", required.as_str())
            .with_suggestion(format!(
                "func (s *{}) {} {{ return nil }}",
                struct_name, required
            )));
    }

    if let Some(stop) = stop.filter(|_| !lifecycle.has_stop) {
        tracing::debug!(
            "{} has Stop with unexpected signature {}; not treated as a hook",
            struct_name,
            stop.signature_text()
        );
    }

    Ok(lifecycle)
}
