//! @acp:module "Go Loader"
//! @acp:summary "Converts tree-sitter-go trees into the declaration IR"
//! @acp:domain analysis
//! @acp:layer parser
//!
//! This is the pure traversal half of the walker: it visits top-level
//! declarations in order and attaches each one's leading comment block,
//! without interpreting annotations.

use std::path::Path;

use tree_sitter::{Node, Parser as TsParser};

use super::model::{
    ChanDir, Comment, Declaration, FieldDecl, FuncDecl, Import, MethodSpec, Param, Receiver,
    Signature, SourceFile, TypeBody, TypeDecl, TypeExpr,
};
use crate::error::{AxonError, Result};

/// @acp:summary "tree-sitter-go backed loader"
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| AxonError::Other(format!("Failed to set Go language: {:?}", e)))?;
        Ok(Self { parser })
    }

    /// @acp:summary "Read and parse a Go file from disk"
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AxonError::io("read", path, e))?;
        self.parse_source(&path.to_string_lossy(), &content)
    }

    /// @acp:summary "Parse Go source text already in memory"
    pub fn parse_source(&mut self, path: &str, content: &str) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| AxonError::source_parse(path, "parser produced no tree"))?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(AxonError::source_parse(
                path,
                format!("syntax error near line {}", line),
            ));
        }

        Converter { src: content, path }.source_file(root)
    }
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    children(node).into_iter().find_map(first_error_line)
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// Accumulates a contiguous comment block until a declaration claims it.
#[derive(Default)]
struct DocCollector {
    pending: Vec<Comment>,
}

impl DocCollector {
    fn push(&mut self, comment: Comment) {
        if let Some(last) = self.pending.last() {
            if last.end_line + 1 < comment.line {
                self.pending.clear();
            }
        }
        self.pending.push(comment);
    }

    /// Comments directly above `line`; anything separated by a blank line
    /// is dropped.
    fn take_for(&mut self, line: usize) -> Vec<Comment> {
        let docs = std::mem::take(&mut self.pending);
        match docs.last() {
            Some(last) if last.end_line + 1 == line => docs,
            _ => Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

struct Converter<'a> {
    src: &'a str,
    path: &'a str,
}

impl<'a> Converter<'a> {
    fn text(&self, node: Node) -> Result<&'a str> {
        node.utf8_text(self.src.as_bytes())
            .map_err(|e| AxonError::source_parse(self.path, e.to_string()))
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            AxonError::source_parse(
                self.path,
                format!(
                    "missing '{}' in {} at line {}",
                    name,
                    node.kind(),
                    line_of(node)
                ),
            )
        })
    }

    fn comment(&self, node: Node) -> Result<Comment> {
        Ok(Comment {
            text: self.text(node)?.to_string(),
            line: line_of(node),
            end_line: node.end_position().row + 1,
        })
    }

    fn source_file(&self, root: Node) -> Result<SourceFile> {
        let mut file = SourceFile {
            path: self.path.to_string(),
            ..Default::default()
        };
        let mut docs = DocCollector::default();
        let mut last_decl_row: Option<usize> = None;

        for child in named_children(root) {
            match child.kind() {
                "comment" => {
                    // trailing comment on the line of the previous declaration
                    if last_decl_row == Some(child.start_position().row) {
                        continue;
                    }
                    docs.push(self.comment(child)?);
                }
                "package_clause" => {
                    docs.clear();
                    if let Some(ident) = named_children(child)
                        .into_iter()
                        .find(|n| n.kind() == "package_identifier")
                    {
                        file.package = self.text(ident)?.to_string();
                    }
                }
                "import_declaration" => {
                    docs.clear();
                    self.imports(child, &mut file.imports)?;
                }
                "type_declaration" => {
                    let outer = docs.take_for(line_of(child));
                    for decl in self.type_declaration(child, outer)? {
                        file.declarations.push(Declaration::Type(decl));
                    }
                }
                "function_declaration" | "method_declaration" => {
                    let outer = docs.take_for(line_of(child));
                    let func = self.function(child, outer)?;
                    file.declarations.push(Declaration::Func(func));
                }
                _ => docs.clear(),
            }
            if child.kind() != "comment" {
                last_decl_row = Some(child.end_position().row);
            }
        }

        Ok(file)
    }

    fn imports(&self, node: Node, out: &mut Vec<Import>) -> Result<()> {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => out.push(self.import_spec(child)?),
                "import_spec_list" => {
                    for spec in named_children(child) {
                        if spec.kind() == "import_spec" {
                            out.push(self.import_spec(spec)?);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn import_spec(&self, node: Node) -> Result<Import> {
        let path = self.text(self.field(node, "path")?)?;
        let alias = match node.child_by_field_name("name") {
            Some(n) => Some(self.text(n)?.to_string()),
            None => None,
        };
        Ok(Import {
            alias,
            path: path.trim_matches(|c| c == '"' || c == '`').to_string(),
        })
    }

    fn type_declaration(&self, node: Node, outer: Vec<Comment>) -> Result<Vec<TypeDecl>> {
        let kids = named_children(node);
        let grouped = children(node).iter().any(|c| c.kind() == "(");
        let mut outer = Some(outer);
        let mut docs = DocCollector::default();
        let mut decls = Vec::new();

        for child in kids {
            match child.kind() {
                "comment" => docs.push(self.comment(child)?),
                "type_spec" | "type_alias" => {
                    let inner = docs.take_for(line_of(child));
                    let spec_docs = if grouped {
                        inner
                    } else {
                        outer.take().unwrap_or_default()
                    };
                    decls.push(self.type_spec(child, spec_docs)?);
                }
                _ => docs.clear(),
            }
        }
        Ok(decls)
    }

    fn type_spec(&self, node: Node, docs: Vec<Comment>) -> Result<TypeDecl> {
        let name = self.text(self.field(node, "name")?)?.to_string();
        let ty = self.field(node, "type")?;
        let body = if node.kind() == "type_alias" {
            TypeBody::Other(self.type_expr(ty)?)
        } else {
            match ty.kind() {
                "struct_type" => TypeBody::Struct(self.struct_fields(ty)?),
                "interface_type" => TypeBody::Interface(self.interface_methods(ty)?),
                _ => TypeBody::Other(self.type_expr(ty)?),
            }
        };
        Ok(TypeDecl {
            name,
            line: line_of(node),
            docs,
            body,
        })
    }

    fn struct_fields(&self, node: Node) -> Result<Vec<FieldDecl>> {
        let mut fields: Vec<FieldDecl> = Vec::new();
        let Some(list) = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Ok(fields);
        };

        let mut docs = DocCollector::default();
        for child in named_children(list) {
            match child.kind() {
                "comment" => {
                    let comment = self.comment(child)?;
                    match fields.last_mut() {
                        Some(prev) if prev.line == comment.line => prev.docs.push(comment),
                        _ => docs.push(comment),
                    }
                }
                "field_declaration" => {
                    let leading = docs.take_for(line_of(child));
                    fields.push(self.field_declaration(child, leading)?);
                }
                _ => docs.clear(),
            }
        }
        Ok(fields)
    }

    fn field_declaration(&self, node: Node, mut docs: Vec<Comment>) -> Result<FieldDecl> {
        let names = field_children(node, "name")
            .into_iter()
            .map(|n| self.text(n).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        let mut ty = self.type_expr(self.field(node, "type")?)?;
        let embedded = names.is_empty();
        if embedded && children(node).iter().any(|c| !c.is_named() && c.kind() == "*") {
            ty = TypeExpr::pointer(ty);
        }
        // same-line comment that ended up inside the declaration node
        for child in named_children(node) {
            if child.kind() == "comment" {
                docs.push(self.comment(child)?);
            }
        }
        let tag = match node.child_by_field_name("tag") {
            Some(t) => Some(self.text(t)?.to_string()),
            None => None,
        };
        Ok(FieldDecl {
            names,
            ty,
            embedded,
            line: line_of(node),
            docs,
            tag,
        })
    }

    fn interface_methods(&self, node: Node) -> Result<Vec<MethodSpec>> {
        let mut methods = Vec::new();
        for child in named_children(node) {
            if matches!(child.kind(), "method_elem" | "method_spec") {
                let name = self.text(self.field(child, "name")?)?.to_string();
                let signature = self.signature(child)?;
                methods.push(MethodSpec { name, signature });
            }
        }
        Ok(methods)
    }

    fn function(&self, node: Node, docs: Vec<Comment>) -> Result<FuncDecl> {
        let name = self.text(self.field(node, "name")?)?.to_string();
        let receiver = match node.child_by_field_name("receiver") {
            Some(list) => self.receiver(list)?,
            None => None,
        };
        Ok(FuncDecl {
            name,
            receiver,
            signature: self.signature(node)?,
            line: line_of(node),
            docs,
        })
    }

    fn receiver(&self, list: Node) -> Result<Option<Receiver>> {
        let Some(decl) = named_children(list)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")
        else {
            return Ok(None);
        };
        let name = match decl.child_by_field_name("name") {
            Some(n) => Some(self.text(n)?.to_string()),
            None => None,
        };
        let ty = self.type_expr(self.field(decl, "type")?)?;
        let pointer = ty.is_pointer();
        let type_name = ty
            .strip_pointer()
            .base_name()
            .map(str::to_string)
            .unwrap_or_else(|| ty.strip_pointer().to_string());
        Ok(Some(Receiver {
            name,
            type_name,
            pointer,
        }))
    }

    /// Reads the `parameters` and `result` fields shared by functions,
    /// methods, interface methods and function types.
    fn signature(&self, node: Node) -> Result<Signature> {
        let params = self.parameter_list(self.field(node, "parameters")?)?;
        let results = match node.child_by_field_name("result") {
            Some(r) if r.kind() == "parameter_list" => self.parameter_list(r)?,
            Some(r) => vec![Param::new(None, self.type_expr(r)?)],
            None => Vec::new(),
        };
        Ok(Signature::new(params, results))
    }

    fn parameter_list(&self, node: Node) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "parameter_declaration" => {
                    let ty = self.type_expr(self.field(child, "type")?)?;
                    let names = field_children(child, "name");
                    if names.is_empty() {
                        params.push(Param::new(None, ty));
                    } else {
                        for n in names {
                            params.push(Param::new(Some(self.text(n)?), ty.clone()));
                        }
                    }
                }
                "variadic_parameter_declaration" => {
                    let ty = self.type_expr(self.field(child, "type")?)?;
                    let name = match child.child_by_field_name("name") {
                        Some(n) => Some(self.text(n)?),
                        None => None,
                    };
                    params.push(Param::new(name, TypeExpr::Ellipsis(Box::new(ty))));
                }
                _ => {}
            }
        }
        Ok(params)
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>> {
        named_children(node)
            .into_iter()
            .find(|n| n.kind() != "comment")
            .ok_or_else(|| {
                AxonError::source_parse(
                    self.path,
                    format!("empty {} at line {}", node.kind(), line_of(node)),
                )
            })
    }

    fn type_expr(&self, node: Node) -> Result<TypeExpr> {
        let expr = match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::named(self.text(node)?),
            "qualified_type" => TypeExpr::qualified(
                self.text(self.field(node, "package")?)?,
                self.text(self.field(node, "name")?)?,
            ),
            "pointer_type" => TypeExpr::pointer(self.type_expr(self.first_named(node)?)?),
            "slice_type" => TypeExpr::slice(self.type_expr(self.field(node, "element")?)?),
            "array_type" => TypeExpr::Array {
                len: self.text(self.field(node, "length")?)?.to_string(),
                elem: Box::new(self.type_expr(self.field(node, "element")?)?),
            },
            "implicit_length_array_type" => TypeExpr::Array {
                len: "...".to_string(),
                elem: Box::new(self.type_expr(self.field(node, "element")?)?),
            },
            "map_type" => TypeExpr::map(
                self.type_expr(self.field(node, "key")?)?,
                self.type_expr(self.field(node, "value")?)?,
            ),
            "channel_type" => {
                let tokens: Vec<&str> = children(node)
                    .iter()
                    .filter(|c| !c.is_named())
                    .map(|c| c.kind())
                    .collect();
                let dir = match tokens.as_slice() {
                    ["<-", "chan", ..] => ChanDir::Recv,
                    ["chan", "<-", ..] => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.type_expr(self.field(node, "value")?)?),
                }
            }
            "function_type" => TypeExpr::Func(Box::new(self.signature(node)?)),
            "generic_type" => {
                let base = self.type_expr(self.field(node, "type")?)?;
                let mut args = Vec::new();
                for arg in named_children(self.field(node, "type_arguments")?) {
                    let arg = if arg.kind() == "type_elem" {
                        self.first_named(arg)?
                    } else {
                        arg
                    };
                    args.push(self.type_expr(arg)?);
                }
                TypeExpr::Generic {
                    base: Box::new(base),
                    args,
                }
            }
            "parenthesized_type" => self.type_expr(self.first_named(node)?)?,
            _ => TypeExpr::Raw(
                self.text(node)?
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        };
        Ok(expr)
    }
}
