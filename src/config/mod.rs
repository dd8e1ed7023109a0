//! @acp:module "Configuration"
//! @acp:summary "Analyzer configuration loading and defaults"
//! @acp:domain analysis
//! @acp:layer config

use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::{AxonError, Result};

/// Default config file looked up by [`Config::load_or_default`]
pub const CONFIG_FILE: &str = ".axon.config.json";

/// @acp:summary "Main analyzer configuration"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File patterns to include (glob syntax, relative to the package dir)
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// File patterns to exclude (glob syntax)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Type names of the target web/DI framework
    #[serde(default)]
    pub framework: FrameworkConfig,

    /// Validation toggles
    #[serde(default)]
    pub build: BuildOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            framework: FrameworkConfig::default(),
            build: BuildOptions::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a file"
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| AxonError::io("read", path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        config.check_patterns()?;
        Ok(config)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| AxonError::io("write", path, e))?;
        Ok(())
    }

    /// @acp:summary "Load from default location or fall back to defaults"
    pub fn load_or_default() -> Self {
        match Self::load(CONFIG_FILE) {
            Ok(config) => config,
            Err(AxonError::Io { .. }) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring invalid {}: {}", CONFIG_FILE, e);
                Self::default()
            }
        }
    }

    /// Reject malformed include/exclude globs up front
    pub fn check_patterns(&self) -> Result<()> {
        for pattern in self.include.iter().chain(self.exclude.iter()) {
            Pattern::new(pattern)
                .map_err(|e| AxonError::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        }
        Ok(())
    }

    /// Whether a file name (relative to its package directory) is analyzed
    pub fn is_included(&self, relative: &str) -> bool {
        let opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let matches = |patterns: &[String]| {
            patterns
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .any(|p| p.matches_with(relative, opts))
        };
        (self.include.is_empty() || matches(&self.include)) && !matches(&self.exclude)
    }
}

fn default_include() -> Vec<String> {
    vec!["*.go".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["*_test.go".to_string()]
}

/// @acp:summary "Spelled type names the analyzer matches against"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Handler parameter type carrying the HTTP request
    #[serde(default = "default_request_context")]
    pub request_context: String,

    /// Parameter type of `Start`/`Stop`
    #[serde(default = "default_lifecycle_context")]
    pub lifecycle_context: String,

    /// Parameter and result type of middleware `Handle`
    #[serde(default = "default_next_handler")]
    pub next_handler: String,

    /// First result of a `(response, error)` handler
    #[serde(default = "default_response_type")]
    pub response_type: String,

    /// Embedded field that turns every exported field into a dependency
    #[serde(default = "default_auto_wire_marker")]
    pub auto_wire_marker: String,

    #[serde(default = "default_error_type")]
    pub error_type: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            request_context: default_request_context(),
            lifecycle_context: default_lifecycle_context(),
            next_handler: default_next_handler(),
            response_type: default_response_type(),
            auto_wire_marker: default_auto_wire_marker(),
            error_type: default_error_type(),
        }
    }
}

fn default_request_context() -> String {
    "echo.Context".to_string()
}

fn default_lifecycle_context() -> String {
    "context.Context".to_string()
}

fn default_next_handler() -> String {
    "echo.HandlerFunc".to_string()
}

fn default_response_type() -> String {
    "*axon.Response".to_string()
}

fn default_auto_wire_marker() -> String {
    "fx.In".to_string()
}

fn default_error_type() -> String {
    "error".to_string()
}

/// @acp:summary "Toggles for the deferred validation passes"
///
/// Multi-package runs build every package with both passes skipped, then
/// call `BuildSession::validate` once all registries are populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Do not resolve custom path types against the parser registry
    #[serde(default)]
    pub skip_parser_validation: bool,

    /// Do not resolve middleware references
    #[serde(default)]
    pub skip_middleware_validation: bool,
}

impl BuildOptions {
    /// Both deferred passes skipped
    pub fn deferred() -> Self {
        Self {
            skip_parser_validation: true,
            skip_middleware_validation: true,
        }
    }
}
