//! @acp:module "Names"
//! @acp:summary "Go identifier and built-in type name helpers"
//! @acp:domain analysis
//! @acp:layer utility

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Identifier optionally qualified with a package name (`uuid.UUID`)
static QUALIFIED_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*\.)?[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

/// Go predeclared types that path segments convert to without a parser
pub const PRIMITIVE_TYPES: &[&str] = &[
    "string", "bool", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "float32", "float64", "byte", "rune",
];

pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

pub fn is_qualified_identifier(s: &str) -> bool {
    QUALIFIED_IDENTIFIER.is_match(s)
}

pub fn is_primitive_type(s: &str) -> bool {
    PRIMITIVE_TYPES.contains(&s)
}

/// Go exports identifiers that start with an upper-case letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// Last segment of a qualified name (`models.User` -> `User`)
pub fn trailing_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
