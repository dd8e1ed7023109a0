//! @acp:module "Source Model"
//! @acp:summary "Declaration-level IR of a Go source file"
//! @acp:domain analysis
//! @acp:layer model
//!
//! The loader turns a tree-sitter tree into these plain values; everything
//! downstream (walker, reducer, validators) works on them only, so those
//! passes can be tested without touching the parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// @acp:summary "One parsed Go file"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub imports: Vec<Import>,
    pub declarations: Vec<Declaration>,
}

impl SourceFile {
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Type(t) => Some(t),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Func(f) => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
}

/// A comment line or block, 1-indexed lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub line: usize,
    pub end_line: usize,
}

impl Comment {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
            end_line: line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    Type(TypeDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub line: usize,
    pub docs: Vec<Comment>,
    pub body: TypeBody,
}

impl TypeDecl {
    pub fn fields(&self) -> &[FieldDecl] {
        match &self.body {
            TypeBody::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.body, TypeBody::Struct(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeBody {
    Struct(Vec<FieldDecl>),
    Interface(Vec<MethodSpec>),
    Other(TypeExpr),
}

/// A struct field; embedded fields have no names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub embedded: bool,
    pub line: usize,
    /// Leading doc comments plus a trailing same-line comment
    pub docs: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub type_name: String,
    pub pointer: bool,
}

/// @acp:summary "Function or method declaration"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Receiver>,
    pub signature: Signature,
    pub line: usize,
    pub docs: Vec<Comment>,
}

impl FuncDecl {
    /// `Receiver.Method` for methods, plain name for functions
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("{}.{}", recv.type_name, self.name),
            None => self.name.clone(),
        }
    }

    /// Source-like rendering used in diagnostics
    pub fn signature_text(&self) -> String {
        match &self.receiver {
            Some(recv) => {
                let star = if recv.pointer { "*" } else { "" };
                match &recv.name {
                    Some(n) => format!("func ({} {}{}) {}{}", n, star, recv.type_name, self.name, self.signature),
                    None => format!("func ({}{}) {}{}", star, recv.type_name, self.name, self.signature),
                }
            }
            None => format!("func {}{}", self.name, self.signature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ty: TypeExpr,
}

impl Param {
    pub fn new(name: Option<&str>, ty: TypeExpr) -> Self {
        Self {
            name: name.map(str::to_string),
            ty,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", name, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Parameters and results of a function or function type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>, results: Vec<Param>) -> Self {
        Self { params, results }
    }

    pub fn result_types(&self) -> Vec<String> {
        self.results.iter().map(|r| r.ty.to_string()).collect()
    }

    pub fn param_types(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.to_string()).collect()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", join(&self.params))?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {}", single.ty),
            results => write!(f, " ({})", join(results)),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// @acp:summary "Go type expression"
///
/// `Display` is the canonical spelling handed to code emission: it must
/// reproduce compound forms exactly, so it is written out recursively
/// instead of copying source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named {
        #[serde(skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        name: String,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: String,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(Box<Signature>),
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// Variadic parameter type (`...T`)
    Ellipsis(Box<TypeExpr>),
    /// Inline struct/interface literals and anything else kept verbatim
    Raw(String),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: None,
            name: name.into(),
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn slice(inner: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(inner))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Parse a simple spelled type (`*pkg.Name`, `[]T`, `Name`) from config
    /// strings. Compound forms beyond pointer/slice fall back to `Raw`.
    pub fn parse_simple(spelled: &str) -> Self {
        let spelled = spelled.trim();
        if let Some(inner) = spelled.strip_prefix('*') {
            return TypeExpr::pointer(TypeExpr::parse_simple(inner));
        }
        if let Some(inner) = spelled.strip_prefix("[]") {
            return TypeExpr::slice(TypeExpr::parse_simple(inner));
        }
        if crate::names::is_qualified_identifier(spelled) {
            return match spelled.split_once('.') {
                Some((pkg, name)) => TypeExpr::qualified(pkg, name),
                None => TypeExpr::named(spelled),
            };
        }
        TypeExpr::Raw(spelled.to_string())
    }

    /// Compare against a spelled type such as `echo.Context`
    pub fn is(&self, spelled: &str) -> bool {
        self.to_string() == spelled
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeExpr::Pointer(_))
    }

    /// The pointee for pointers, `self` otherwise
    pub fn strip_pointer(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer(inner) => inner.strip_pointer(),
            other => other,
        }
    }

    /// Base type name for named and generic types (`Box[T]` -> `Box`)
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named { name, .. } => Some(name),
            TypeExpr::Generic { base, .. } => base.base_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named {
                package: Some(pkg),
                name,
            } => write!(f, "{}.{}", pkg, name),
            TypeExpr::Named {
                package: None,
                name,
            } => write!(f, "{}", name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(inner) => write!(f, "[]{}", inner),
            TypeExpr::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            TypeExpr::Func(sig) => write!(f, "func{}", sig),
            TypeExpr::Generic { base, args } => write!(f, "{}[{}]", base, join(args)),
            TypeExpr::Ellipsis(inner) => write!(f, "...{}", inner),
            TypeExpr::Raw(text) => write!(f, "{}", text),
        }
    }
}
