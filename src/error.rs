//! @acp:module "Errors"
//! @acp:summary "Crate error type wrapping diagnostics and internal failures"
//! @acp:domain analysis
//! @acp:layer model

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticList};

/// @acp:summary "Library error"
#[derive(Debug, Error)]
pub enum AxonError {
    /// A semantic problem found in the analyzed sources
    #[error(transparent)]
    Diagnostic(Box<Diagnostic>),

    /// Several semantic problems reported together
    #[error("{0}")]
    Diagnostics(DiagnosticList),

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Go source that tree-sitter could not parse cleanly
    #[error("failed to parse Go source {}: {message}", .path.display())]
    SourceParse { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AxonError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AxonError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn source_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AxonError::SourceParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The wrapped diagnostic, when this error carries exactly one
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            AxonError::Diagnostic(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Diagnostic> for AxonError {
    fn from(diagnostic: Diagnostic) -> Self {
        AxonError::Diagnostic(Box::new(diagnostic))
    }
}

impl From<DiagnosticList> for AxonError {
    fn from(list: DiagnosticList) -> Self {
        AxonError::Diagnostics(list)
    }
}

pub type Result<T> = std::result::Result<T, AxonError>;
