//! @acp:module "Build Session"
//! @acp:summary "Runs the analysis pipeline per package and owns cross-package registries"
//! @acp:domain analysis
//! @acp:layer service
//!
//! One session per run. Packages are built one at a time; parsers and
//! middlewares discovered in earlier packages are visible to later ones.
//! For multi-package runs where references point forward, build every
//! package with [`BuildOptions::deferred`] and then call
//! [`BuildSession::validate`] once. Rebuilding a package replaces the
//! registry entries its files contributed before.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{BuildOptions, Config};
use crate::diagnostics::DiagnosticList;
use crate::error::{AxonError, Result};
use crate::metadata::PackageMetadata;
use crate::package::reduce;
use crate::registry::{MiddlewareRegistry, ParserRegistry};
use crate::source::{find_module, GoParser, SourceCache, SourceFile};
use crate::walker::Walker;

/// @acp:summary "Registries, cache and options of one analysis run"
pub struct BuildSession {
    config: Config,
    parsers: ParserRegistry,
    middlewares: MiddlewareRegistry,
    cache: SourceCache,
    go: GoParser,
}

impl BuildSession {
    pub fn new(config: Config) -> Result<Self> {
        config.check_patterns()?;
        Ok(Self {
            parsers: ParserRegistry::with_builtins(&config.framework),
            middlewares: MiddlewareRegistry::new(),
            cache: SourceCache::new(),
            go: GoParser::new()?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> BuildOptions {
        self.config.build
    }

    pub fn set_options(&mut self, options: BuildOptions) {
        self.config.build = options;
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn middlewares(&self) -> &MiddlewareRegistry {
        &self.middlewares
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// @acp:summary "List the analyzable .go files of a directory (non-recursive)"
    pub fn package_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| AxonError::io("list", dir, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".go") || name.ends_with("_test.go") {
                continue;
            }
            if self.config.is_included(&name) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// @acp:summary "Load, analyze and validate one package directory"
    pub fn build_package<P: AsRef<Path>>(&mut self, dir: P) -> Result<PackageMetadata> {
        let dir = dir.as_ref();
        let paths = self.package_files(dir)?;
        if paths.is_empty() {
            return Err(AxonError::Other(format!(
                "no Go source files in {}",
                dir.display()
            )));
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(self.cache.load(path, &mut self.go)?);
        }
        tracing::debug!("Loaded {} files from {}", files.len(), dir.display());

        let mut package = self.build_from_sources(&files)?;
        package.package_path = dir.to_string_lossy().to_string();

        let absolute = std::fs::canonicalize(dir).map_err(|e| AxonError::io("resolve", dir, e))?;
        match find_module(&absolute)? {
            Some(module) => {
                package.import_path = Some(module.import_path_for(&absolute));
                package.module_root = Some(module.root.to_string_lossy().to_string());
                package.module_path = Some(module.module_path);
            }
            None => {
                tracing::warn!("No go.mod found above {}; import path unknown", dir.display());
            }
        }
        Ok(package)
    }

    /// @acp:summary "Run the pipeline over already-loaded files of one package"
    pub fn build_from_sources(&mut self, files: &[SourceFile]) -> Result<PackageMetadata> {
        let walker = Walker::new(&self.config.framework);
        let mut annotations = Vec::new();
        for file in files {
            annotations.extend(walker.walk(file).into_result()?);
        }

        let mut package = reduce(files, &annotations, &self.config.framework)?;

        for file in files {
            self.parsers.forget_file(&file.path);
            self.middlewares.forget_file(&file.path);
        }
        for parser in &package.route_parsers {
            self.parsers.register(parser.clone())?;
        }
        for middleware in &package.middlewares {
            self.middlewares.register(middleware)?;
        }

        let options = self.config.build;
        if !options.skip_parser_validation {
            self.bind_parsers(&mut package)?;
        }
        if !options.skip_middleware_validation {
            self.middlewares.validate_package(&package)?;
        }
        Ok(package)
    }

    fn bind_parsers(&self, package: &mut PackageMetadata) -> Result<()> {
        for controller in &mut package.controllers {
            for route in &mut controller.routes {
                self.parsers.bind_route(route)?;
            }
        }
        Ok(())
    }

    /// @acp:summary "Deferred pass: resolve parsers and middleware across all packages"
    pub fn validate(&self, packages: &mut [PackageMetadata]) -> Result<()> {
        for package in packages.iter_mut() {
            self.bind_parsers(package)?;
            self.middlewares.validate_package(package)?;
        }
        Ok(())
    }

    /// Every missing and unused parser, without stopping at the first
    pub fn audit_parsers(&self, packages: &[PackageMetadata]) -> DiagnosticList {
        self.parsers.audit(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.go", "a.go", "a_test.go", "notes.md"] {
            std::fs::write(dir.path().join(name), "package x\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.go"), "package sub\n").unwrap();

        let session = BuildSession::new(Config::default()).unwrap();
        let files = session.package_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = BuildSession::new(Config::default()).unwrap();
        let err = session.build_package(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no Go source files"));
    }
}
