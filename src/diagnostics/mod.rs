//! @acp:module "Diagnostics"
//! @acp:summary "Structured diagnostics with location, suggestions and tooling context"
//! @acp:domain analysis
//! @acp:layer model
//!
//! Every validator in the pipeline reports problems as a [`Diagnostic`]:
//! a kind from the fixed taxonomy, an optional source location, a message,
//! ordered remediation suggestions and a free-form context map that tools
//! can read without parsing the message.
//!
//! [`DiagnosticList`] batches several diagnostics for the report-style
//! entry points (e.g. a package-wide parser audit). The default control
//! flow is still fail-fast on the first error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// @acp:summary "Diagnostic taxonomy"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed annotation text
    Syntax,
    /// Structurally wrong parameter, signature or value
    Validation,
    /// Duplicate registration of a name
    Conflict,
    /// Unresolved custom-type parser or middleware reference
    NotFound,
    /// Missing or malformed lifecycle method
    Lifecycle,
}

impl DiagnosticKind {
    /// Get string representation for serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Validation => "validation",
            DiagnosticKind::Conflict => "conflict",
            DiagnosticKind::NotFound => "not_found",
            DiagnosticKind::Lifecycle => "lifecycle",
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "AX0001",
            DiagnosticKind::Validation => "AX0002",
            DiagnosticKind::Conflict => "AX0003",
            DiagnosticKind::NotFound => "AX0004",
            DiagnosticKind::Lifecycle => "AX0005",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level, after the lint-issue model: errors stop generation,
/// warnings are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Position of a diagnostic in the analyzed sources (1-indexed line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(col) => write!(f, "{}:{}:{}", self.file, self.line, col),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// @acp:summary "A single structured diagnostic"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default)]
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub message: String,
    /// Remediation hints, most relevant first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Machine-readable context for tooling (e.g. `type_name`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            location: None,
            message: message.into(),
            suggestions: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Conflict, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::NotFound, message)
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Lifecycle, message)
    }

    /// Attach a file/line location
    pub fn at(mut self, file: impl Into<String>, line: usize) -> Self {
        self.location = Some(SourceLocation::new(file, line));
        self
    }

    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Downgrade to a warning
    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Look up a context value by key
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// @acp:summary "Multi-line rendering with suggestions, for terminal output"
    pub fn render(&self) -> String {
        let mut out = format!("{}[{}]: {}", self.severity, self.kind.code(), self.message);
        if let Some(loc) = &self.location {
            out.push_str(&format!("\n  --> {}", loc));
        }
        for suggestion in &self.suggestions {
            for (i, line) in suggestion.lines().enumerate() {
                if i == 0 {
                    out.push_str(&format!("\n  = help: {}", line));
                } else {
                    out.push_str(&format!("\n          {}", line));
                }
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: ", loc)?;
        }
        write!(f, "{} {}: {}", self.kind, self.severity, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// @acp:summary "Aggregate of diagnostics for batch reporting"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.diagnostics.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics of one kind, in insertion order
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// First error-severity diagnostic, if any
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.errors().next()
    }

    /// `Err(self)` when at least one error is present
    pub fn into_result(self) -> std::result::Result<(), DiagnosticList> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} diagnostic(s) ({} error(s), {} warning(s)):",
            self.len(),
            self.error_count(),
            self.warning_count()
        )?;
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticList {}

impl From<Vec<Diagnostic>> for DiagnosticList {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl FromIterator<Diagnostic> for DiagnosticList {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

impl Extend<Diagnostic> for DiagnosticList {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.diagnostics.extend(iter);
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location_and_message() {
        let diag = Diagnostic::validation("bad thing").at("user.go", 12);
        assert_eq!(diag.to_string(), "user.go:12: validation error: bad thing");
    }

    #[test]
    fn test_render_lists_suggestions() {
        let diag = Diagnostic::not_found("missing")
            .at("a.go", 3)
            .with_suggestion("add this\nand this");
        let rendered = diag.render();
        assert!(rendered.starts_with("error[AX0004]: missing"));
        assert!(rendered.contains("--> a.go:3"));
        assert!(rendered.contains("= help: add this"));
        assert!(rendered.contains("          and this"));
    }

    #[test]
    fn test_list_numbering_and_inspection() {
        let mut list = DiagnosticList::new();
        list.push(Diagnostic::syntax("one"));
        list.push(Diagnostic::not_found("two").as_warning());
        list.push(Diagnostic::not_found("three"));

        assert_eq!(list.len(), 3);
        assert_eq!(list.error_count(), 2);
        assert_eq!(list.warning_count(), 1);
        assert_eq!(list.of_kind(DiagnosticKind::NotFound).count(), 2);
        assert_eq!(list.get(1).map(|d| d.message.as_str()), Some("two"));

        let text = list.to_string();
        assert!(text.contains("1. syntax error: one"));
        assert!(text.contains("2. not_found warning: two"));
        assert!(text.contains("3. not_found error: three"));
    }

    #[test]
    fn test_into_result_ignores_warnings() {
        let list: DiagnosticList = vec![Diagnostic::validation("w").as_warning()].into();
        assert!(list.into_result().is_ok());

        let list: DiagnosticList = vec![Diagnostic::validation("e")].into();
        assert!(list.into_result().is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&DiagnosticKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }
}
