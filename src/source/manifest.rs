//! @acp:module "Module Manifest"
//! @acp:summary "Locates go.mod and derives canonical package import paths"
//! @acp:domain analysis
//! @acp:layer service

use std::path::{Path, PathBuf};

use crate::error::{AxonError, Result};

pub const MANIFEST_FILE: &str = "go.mod";

/// @acp:summary "The enclosing Go module of a package directory"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Directory containing go.mod
    pub root: PathBuf,
    /// `module` directive value
    pub module_path: String,
    pub go_version: Option<String>,
}

impl ModuleInfo {
    /// Import path of a package directory inside this module
    pub fn import_path_for(&self, package_dir: &Path) -> String {
        let relative = package_dir
            .strip_prefix(&self.root)
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        if relative.is_empty() {
            self.module_path.clone()
        } else {
            format!("{}/{}", self.module_path, relative)
        }
    }
}

/// @acp:summary "Walk parent directories until a go.mod is found"
///
/// Returns `Ok(None)` when no manifest exists up to the filesystem root or
/// when the manifest has no `module` directive; callers treat that as a
/// soft warning.
pub fn find_module(start: &Path) -> Result<Option<ModuleInfo>> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)
                .map_err(|e| AxonError::io("read", &candidate, e))?;
            return Ok(parse_manifest(&content).map(|(module_path, go_version)| ModuleInfo {
                root: current.to_path_buf(),
                module_path,
                go_version,
            }));
        }
        dir = current.parent();
    }
    Ok(None)
}

/// Extract the `module` and `go` directives
pub fn parse_manifest(content: &str) -> Option<(String, Option<String>)> {
    let mut module = None;
    let mut go_version = None;
    for line in content.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("module"), Some(path)) => {
                module = Some(path.trim_matches('"').to_string());
            }
            (Some("go"), Some(version)) => go_version = Some(version.to_string()),
            _ => {}
        }
    }
    module.map(|m| (m, go_version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let content = "// comment\nmodule github.com/acme/shop\n\ngo 1.22\n\nrequire (\n\tgithub.com/labstack/echo/v4 v4.11.0\n)\n";
        let (module, go) = parse_manifest(content).unwrap();
        assert_eq!(module, "github.com/acme/shop");
        assert_eq!(go.as_deref(), Some("1.22"));
        assert!(parse_manifest("go 1.21\n").is_none());
    }

    #[test]
    fn test_find_module_walks_parents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        let pkg = dir.path().join("internal").join("users");
        std::fs::create_dir_all(&pkg).unwrap();

        let info = find_module(&pkg).unwrap().unwrap();
        assert_eq!(info.module_path, "example.com/app");
        assert_eq!(info.import_path_for(&pkg), "example.com/app/internal/users");
        assert_eq!(info.import_path_for(dir.path()), "example.com/app");
    }
}
