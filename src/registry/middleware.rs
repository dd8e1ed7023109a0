//! @acp:module "Middleware Registry"
//! @acp:summary "Named middleware table and reference resolution"
//! @acp:domain routing
//! @acp:layer service

use std::collections::BTreeMap;

use crate::diagnostics::Diagnostic;
use crate::metadata::{MiddlewareMetadata, PackageMetadata};

/// @acp:summary "Middleware name -> declaring struct"
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: BTreeMap<String, MiddlewareMetadata>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A name declared twice is a Conflict; the same declaration again replaces itself
    pub fn register(&mut self, middleware: &MiddlewareMetadata) -> Result<(), Diagnostic> {
        if let Some(existing) = self.entries.get(&middleware.name) {
            if existing.file == middleware.file
                && existing.line == middleware.line
                && existing.struct_name == middleware.struct_name
            {
                self.entries.insert(middleware.name.clone(), middleware.clone());
                return Ok(());
            }
            return Err(Diagnostic::conflict(format!(
                "middleware '{}' is declared more than once: {} ({}:{}) and {} ({}:{})",
                middleware.name,
                existing.struct_name,
                existing.file,
                existing.line,
                middleware.struct_name,
                middleware.file,
                middleware.line
            ))
            .at(&middleware.file, middleware.line)
            .with_context("middleware", middleware.name.as_str()));
        }
        self.entries
            .insert(middleware.name.clone(), middleware.clone());
        Ok(())
    }

    /// Drop every middleware declared in `file`, ahead of re-analyzing it
    pub fn forget_file(&mut self, file: &str) {
        self.entries.retain(|_, middleware| middleware.file != file);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MiddlewareMetadata> {
        self.entries.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Middlewares marked `-Global`, highest priority first
    pub fn globals(&self) -> Vec<&MiddlewareMetadata> {
        let mut globals: Vec<_> = self.entries.values().filter(|m| m.is_global).collect();
        globals.sort_by_key(|m| std::cmp::Reverse(m.priority.unwrap_or(0)));
        globals
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// @acp:summary "Resolve the names used at one reference site"
    ///
    /// All unknown names of the site are reported together.
    pub fn validate_references(
        &self,
        site: &str,
        names: &[String],
        file: &str,
        line: usize,
    ) -> Result<(), Diagnostic> {
        let missing: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| !self.contains(n))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Diagnostic::not_found(format!(
            "unknown middleware referenced by {}: {}",
            site,
            missing.join(", ")
        ))
        .at(file, line)
        .with_context("missing", missing.join(","))
        .with_context("available", self.names().join(","))
        .with_suggestion("declare it with //axon::middleware <Name> on a struct with a Handle method"))
    }

    /// Check every controller- and route-level reference of a package
    pub fn validate_package(&self, package: &PackageMetadata) -> Result<(), Diagnostic> {
        for controller in &package.controllers {
            self.validate_references(
                &format!("controller '{}'", controller.name),
                &controller.middlewares,
                &controller.file,
                controller.line,
            )?;
            for route in &controller.routes {
                self.validate_references(
                    &format!("route '{}' ({}.{})", route.label(), controller.name, route.handler_name),
                    &route.middlewares,
                    &route.file,
                    route.line,
                )?;
            }
        }
        Ok(())
    }
}
