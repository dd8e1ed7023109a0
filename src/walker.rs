//! @acp:module "Declaration Walker"
//! @acp:summary "Pairs doc comments with declarations and extracts struct dependencies"
//! @acp:domain analysis
//! @acp:layer service
//!
//! Operates on the loaded IR only. Malformed directives are collected next
//! to the good ones so one pass reports everything in a file.

use crate::annotation::{is_annotation_comment, parse_annotation, Annotation, AnnotationKind, Placement};
use crate::config::FrameworkConfig;
use crate::diagnostics::Diagnostic;
use crate::metadata::Dependency;
use crate::names::is_exported;
use crate::source::{Comment, FieldDecl, FuncDecl, SourceFile, TypeDecl};

/// @acp:summary "Annotations and diagnostics found in one file"
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub annotations: Vec<Annotation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkResult {
    /// Fail-fast view: the first diagnostic, if any
    pub fn into_result(self) -> Result<Vec<Annotation>, Diagnostic> {
        match self.diagnostics.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(self.annotations),
        }
    }

    pub fn of_kind(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.kind == kind)
    }
}

/// @acp:summary "Single-pass annotation collector"
pub struct Walker<'a> {
    framework: &'a FrameworkConfig,
}

impl<'a> Walker<'a> {
    pub fn new(framework: &'a FrameworkConfig) -> Self {
        Self { framework }
    }

    pub fn walk(&self, file: &SourceFile) -> WalkResult {
        let mut result = WalkResult::default();
        for ty in file.types() {
            self.visit_type(file, ty, &mut result);
        }
        for func in file.functions() {
            self.visit_func(file, func, &mut result);
        }
        tracing::debug!(
            "Walked {}: {} annotations, {} diagnostics",
            file.path,
            result.annotations.len(),
            result.diagnostics.len()
        );
        result
    }

    fn visit_type(&self, file: &SourceFile, ty: &TypeDecl, result: &mut WalkResult) {
        let mut annotations = Vec::new();
        for comment in directives(&ty.docs) {
            match parse_annotation(&comment.text, &ty.name, &file.path, comment.line) {
                Ok(ann) if ann.kind.placement() != Placement::Type => {
                    result.diagnostics.push(misplaced(&ann, "type", &ty.name));
                }
                Ok(ann) if !ty.is_struct() => {
                    result.diagnostics.push(
                        Diagnostic::validation(format!(
                            "annotation '{}' requires a struct type, but '{}' is not a struct",
                            ann.kind, ty.name
                        ))
                        .at(&file.path, comment.line),
                    );
                }
                Ok(ann) => annotations.push(ann),
                Err(diagnostic) => result.diagnostics.push(diagnostic),
            }
        }

        let tagged = self.field_annotations(file, ty, result);
        if annotations.iter().any(|a| a.kind.collects_dependencies()) {
            let dependencies = self.extract_dependencies(ty, &tagged);
            for ann in annotations.iter_mut().filter(|a| a.kind.collects_dependencies()) {
                ann.dependencies = dependencies.clone();
            }
        }

        result.annotations.extend(annotations);
        result.annotations.extend(tagged.into_iter().map(|(_, ann)| ann));
    }

    /// Parse `inject`/`init` tags on struct fields; returns (field index, annotation)
    fn field_annotations(
        &self,
        file: &SourceFile,
        ty: &TypeDecl,
        result: &mut WalkResult,
    ) -> Vec<(usize, Annotation)> {
        let mut tagged = Vec::new();
        for (index, field) in ty.fields().iter().enumerate() {
            for comment in directives(&field.docs) {
                for name in field_names(field) {
                    let target = format!("{}.{}", ty.name, name);
                    match parse_annotation(&comment.text, &target, &file.path, comment.line) {
                        Ok(ann) if ann.kind.placement() != Placement::Field => {
                            result.diagnostics.push(misplaced(&ann, "field", &target));
                        }
                        Ok(ann) => tagged.push((index, ann)),
                        Err(diagnostic) => result.diagnostics.push(diagnostic),
                    }
                }
            }
        }
        tagged
    }

    /// @acp:summary "Dependency list of an annotated struct"
    ///
    /// With the auto-wire marker embedded, every exported named field is a
    /// dependency and field tags are ignored. Otherwise only tagged fields
    /// count.
    pub fn extract_dependencies(
        &self,
        ty: &TypeDecl,
        tagged: &[(usize, Annotation)],
    ) -> Vec<Dependency> {
        let fields = ty.fields();
        let marker = &self.framework.auto_wire_marker;
        let has_marker = fields
            .iter()
            .any(|f| f.embedded && f.ty.strip_pointer().is(marker));

        if has_marker {
            if !tagged.is_empty() {
                tracing::debug!(
                    "{} embeds {}; field-level inject/init tags are ignored",
                    ty.name,
                    marker
                );
            }
            return fields
                .iter()
                .filter(|f| !f.embedded)
                .flat_map(|f| {
                    f.names
                        .iter()
                        .filter(|n| is_exported(n))
                        .map(move |n| Dependency {
                            name: n.clone(),
                            type_name: f.ty.to_string(),
                            is_init: false,
                        })
                })
                .collect();
        }

        let mut dependencies: Vec<Dependency> = Vec::new();
        for (index, ann) in tagged {
            let field = &fields[*index];
            let Some(name) = ann.target_member() else {
                continue;
            };
            if dependencies.iter().any(|d| d.name == name) {
                continue;
            }
            dependencies.push(Dependency {
                name: name.to_string(),
                type_name: field.ty.to_string(),
                is_init: ann.kind == AnnotationKind::Init,
            });
        }
        dependencies
    }

    fn visit_func(&self, file: &SourceFile, func: &FuncDecl, result: &mut WalkResult) {
        let target = func.qualified_name();
        for comment in directives(&func.docs) {
            let ann = match parse_annotation(&comment.text, &target, &file.path, comment.line) {
                Ok(ann) => ann,
                Err(diagnostic) => {
                    result.diagnostics.push(diagnostic);
                    continue;
                }
            };
            let expected = if func.receiver.is_some() {
                Placement::Method
            } else {
                Placement::Function
            };
            if ann.kind.placement() == expected {
                result.annotations.push(ann);
            } else {
                let what = if func.receiver.is_some() { "method" } else { "function" };
                result.diagnostics.push(misplaced(&ann, what, &target));
            }
        }
    }
}

fn directives(docs: &[Comment]) -> impl Iterator<Item = &Comment> {
    docs.iter().filter(|c| is_annotation_comment(&c.text))
}

/// Named fields, or the type name of an embedded field
fn field_names(field: &FieldDecl) -> Vec<String> {
    if field.embedded {
        field
            .ty
            .strip_pointer()
            .base_name()
            .map(|n| vec![n.to_string()])
            .unwrap_or_default()
    } else {
        field.names.clone()
    }
}

fn misplaced(ann: &Annotation, found: &str, target: &str) -> Diagnostic {
    Diagnostic::validation(format!(
        "annotation '{}' must be attached to {}, found on {} '{}'",
        ann.kind,
        ann.kind.placement(),
        found,
        target
    ))
    .at(&ann.file, ann.line)
}
