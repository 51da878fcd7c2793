//! Source units - the declaration model the extractor consumes.
//!
//! A [`SourceUnit`] is one scanned file: its package name, its path relative to
//! the source root, and the ordered list of top-level declarations together with
//! the doc comment lines attached to each one.
//!
//! ## Module Structure
//!
//! - `scanner`: Line-oriented scanner turning Go-style source text into declarations
//! - `loader`: File-system loader (walk, include/ignore globs, read, scan)

pub mod loader;
pub mod scanner;

use std::collections::BTreeMap;

pub use loader::{FsSourceLoader, SourceLoader};
pub use scanner::scan_source;

/// A type expression as written at a declaration or field site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Plain or package-qualified name (`string`, `User`, `workspace.Fee`).
    Named(String),
    Pointer(Box<TypeExpr>),
    /// Slices and fixed-size arrays.
    Slice(Box<TypeExpr>),
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Inline anonymous struct.
    Struct(Vec<FieldDecl>),
    /// `interface{}` / `any`.
    Interface,
}

impl TypeExpr {
    pub fn is_byte(&self) -> bool {
        matches!(self, Self::Named(name) if name == "byte")
    }

    /// Parse a single-line type expression.
    ///
    /// Inline multi-line structs are handled by the scanner; this only sees
    /// `struct{}` in its collapsed form.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(rest) = text.strip_prefix('*') {
            return Self::parse(rest).map(|inner| Self::Pointer(Box::new(inner)));
        }
        if let Some(rest) = text.strip_prefix("[]") {
            return Self::parse(rest).map(|inner| Self::Slice(Box::new(inner)));
        }
        // Fixed-size array `[4]T`
        if text.starts_with('[')
            && let Some(close) = text.find(']')
            && is_array_length(&text[1..close])
        {
            return Self::parse(&text[close + 1..]).map(|inner| Self::Slice(Box::new(inner)));
        }
        if let Some(rest) = text.strip_prefix("map[") {
            let close = matching_bracket(rest)?;
            let key = Self::parse(&rest[..close])?;
            let value = Self::parse(&rest[close + 1..])?;
            return Some(Self::Map {
                key: Box::new(key),
                value: Box::new(value),
            });
        }

        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "interface{}" | "any" => Some(Self::Interface),
            "struct{}" => Some(Self::Struct(Vec::new())),
            _ => {
                // Drop generic instantiation arguments: `Page[User]` -> `Page`
                let name = text.split('[').next().unwrap_or(text).trim();
                if name.is_empty() {
                    None
                } else {
                    Some(Self::Named(name.to_string()))
                }
            }
        }
    }

    /// The innermost named type, looking through pointers, slices and map values.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Pointer(inner) | Self::Slice(inner) => inner.base_name(),
            Self::Map { value, .. } => value.base_name(),
            Self::Struct(_) | Self::Interface => None,
        }
    }
}

fn is_array_length(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Find the `]` closing the bracket that was opened just before `text`.
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// One field of a struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// `None` for embedded members.
    pub name: Option<String>,
    pub ty: TypeExpr,
    /// Raw struct tag without the surrounding backticks.
    pub tag: Option<String>,
    /// Doc comment lines above the field plus its trailing comment.
    pub doc: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// The `package` clause; its doc comment carries package-level directives.
    Package,
    Struct { fields: Vec<FieldDecl> },
    Interface,
    /// `type A = B`
    Alias { target: TypeExpr },
    /// `type A B`
    Named { underlying: TypeExpr },
    Const {
        type_name: Option<String>,
        value: String,
    },
    Func,
}

impl DeclarationKind {
    /// Right-hand side of a `type` declaration that is not a struct or interface.
    pub fn underlying(&self) -> Option<&TypeExpr> {
        match self {
            Self::Alias { target } => Some(target),
            Self::Named { underlying } => Some(underlying),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Comment lines with the `//` marker removed, in source order.
    pub doc: Vec<String>,
    pub line: usize,
}

/// One scanned source file.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    /// Path relative to the source root.
    pub path: String,
    pub package: String,
    /// Hex digest of the file content (see `core::cache::checksum`).
    pub checksum: String,
    pub declarations: Vec<Declaration>,
}

impl SourceUnit {
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Qualify a local type name with this unit's package.
    pub fn qualify(&self, name: &str) -> String {
        qualify(&self.package, name)
    }
}

/// Qualify `name` with `package` unless it is already qualified or a builtin.
pub fn qualify(package: &str, name: &str) -> String {
    if name.contains('.') || package.is_empty() || is_builtin_type(name) {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

/// Go builtin types and the handful of standard-library types that map onto
/// schema primitives.
pub fn is_builtin_type(name: &str) -> bool {
    matches!(
        name,
        "string"
            | "bool"
            | "byte"
            | "rune"
            | "int"
            | "int8"
            | "int16"
            | "int32"
            | "int64"
            | "uint"
            | "uint8"
            | "uint16"
            | "uint32"
            | "uint64"
            | "uintptr"
            | "float32"
            | "float64"
            | "error"
            | "any"
            | "interface{}"
            | "time.Time"
            | "time.Duration"
            | "json.RawMessage"
            | "json.Number"
            | "uuid.UUID"
            | "decimal.Decimal"
    )
}

/// Semantic type lookup for types that live outside the local registry.
///
/// Used by the type resolver when an embedded member names a type that carries
/// no directive of its own.
pub trait SemanticResolver {
    /// Resolve a package-qualified type name to its field list.
    fn resolve_named_type(&self, qualified_name: &str) -> Option<Vec<FieldDecl>>;
}

/// No semantic facility: every lookup misses.
impl SemanticResolver for () {
    fn resolve_named_type(&self, _qualified_name: &str) -> Option<Vec<FieldDecl>> {
        None
    }
}

/// Semantic facility backed by every struct declaration of the loaded units.
#[derive(Debug, Default)]
pub struct UnitIndex {
    structs: BTreeMap<String, Vec<FieldDecl>>,
}

impl UnitIndex {
    pub fn new(units: &[SourceUnit]) -> Self {
        let mut structs = BTreeMap::new();
        for unit in units {
            for decl in &unit.declarations {
                if let DeclarationKind::Struct { fields } = &decl.kind {
                    structs.insert(unit.qualify(&decl.name), fields.clone());
                }
            }
        }
        Self { structs }
    }
}

impl SemanticResolver for UnitIndex {
    fn resolve_named_type(&self, qualified_name: &str) -> Option<Vec<FieldDecl>> {
        self.structs.get(qualified_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_type_expr_nested() {
        assert_eq!(
            TypeExpr::parse("map[string][]*model.User"),
            Some(TypeExpr::Map {
                key: Box::new(TypeExpr::Named("string".to_string())),
                value: Box::new(TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(
                    TypeExpr::Named("model.User".to_string())
                ))))),
            })
        );
    }

    #[test]
    fn test_parse_type_expr_special_forms() {
        assert_eq!(TypeExpr::parse("interface{}"), Some(TypeExpr::Interface));
        assert_eq!(TypeExpr::parse("any"), Some(TypeExpr::Interface));
        assert_eq!(TypeExpr::parse("struct{}"), Some(TypeExpr::Struct(vec![])));
        assert_eq!(
            TypeExpr::parse("[16]byte"),
            Some(TypeExpr::Slice(Box::new(TypeExpr::Named("byte".to_string()))))
        );
        assert_eq!(
            TypeExpr::parse("Page[User]"),
            Some(TypeExpr::Named("Page".to_string()))
        );
        assert_eq!(TypeExpr::parse("   "), None);
    }

    #[test]
    fn test_base_name() {
        let expr = TypeExpr::parse("[]*Fee").unwrap();
        assert_eq!(expr.base_name(), Some("Fee"));
        assert_eq!(TypeExpr::Interface.base_name(), None);
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("model", "Fee"), "model.Fee");
        assert_eq!(qualify("model", "workspace.Fee"), "workspace.Fee");
        assert_eq!(qualify("model", "string"), "string");
        assert_eq!(qualify("", "Fee"), "Fee");
    }

    #[test]
    fn test_unit_index_resolves_qualified_structs() {
        let unit = SourceUnit {
            path: "a.go".to_string(),
            package: "base".to_string(),
            checksum: String::new(),
            declarations: vec![Declaration {
                name: "Audit".to_string(),
                kind: DeclarationKind::Struct {
                    fields: vec![FieldDecl {
                        name: Some("CreatedBy".to_string()),
                        ty: TypeExpr::Named("string".to_string()),
                        tag: None,
                        doc: vec![],
                        line: 2,
                    }],
                },
                doc: vec![],
                line: 1,
            }],
        };

        let index = UnitIndex::new(&[unit]);
        assert_eq!(
            index.resolve_named_type("base.Audit").map(|f| f.len()),
            Some(1)
        );
        assert!(index.resolve_named_type("Audit").is_none());
    }
}
