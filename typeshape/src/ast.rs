//! Declaration model.
//!
//! This module defines the raw, unresolved trees produced by the parser.
//! References are kept by name; resolution happens later against the
//! [`TypeRegistry`](crate::TypeRegistry).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a declaration (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// One named type declaration found in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Declared name, unique within a compilation unit
    pub name: String,

    /// Whether the declaration carries the `export` modifier
    pub exported: bool,

    /// Declared shape
    pub shape: DeclShape,

    /// Where the declaration starts
    pub span: Span,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, exported: bool, shape: DeclShape) -> Self {
        Self {
            name: name.into(),
            exported,
            shape,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The object shape, if the declaration is an object literal.
    pub fn object(&self) -> Option<&ObjectShape> {
        match &self.shape {
            DeclShape::Object(shape) => Some(shape),
            DeclShape::Expr(_) => None,
        }
    }

    /// The literal values, if the declaration is a union of string literals only.
    pub fn string_literal_union(&self) -> Option<Vec<&str>> {
        match &self.shape {
            DeclShape::Expr(TypeExpr::Union(members)) => string_literals(members),
            _ => None,
        }
    }
}

/// Top-level shape of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum DeclShape {
    /// `{ ... }`
    Object(ObjectShape),
    /// Any other type expression
    Expr(TypeExpr),
}

/// An object literal type. Property order is kept for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectShape {
    pub properties: Vec<PropertySignature>,
}

impl ObjectShape {
    pub fn new(properties: Vec<PropertySignature>) -> Self {
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&PropertySignature> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// One member of an object literal type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySignature {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    pub readonly: bool,
}

impl PropertySignature {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            readonly: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Scalar keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }
}

/// A literal value usable as a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Render the way union messages list options: strings quoted, everything else bare.
    pub fn describe(&self) -> String {
        match self {
            Literal::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{}", s),
            Literal::Number(n) => write!(f, "{}", format_number(*n)),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Format a number the way the declaration source would spell it (`1`, not `1.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A type expression.
///
/// The variant set is closed; anything the parser cannot represent
/// becomes [`TypeExpr::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypeExpr {
    /// `string`, `number`, `boolean`
    Primitive(PrimitiveKind),

    /// `T[]`, `Array<T>`
    Array(Box<TypeExpr>),

    /// `[A, B, ...C]`
    Tuple {
        elements: Vec<TypeExpr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest: Option<Box<TypeExpr>>,
    },

    /// `"a"`, `1`, `true`, `null`
    Literal(Literal),

    /// `A | B | C`
    Union(Vec<TypeExpr>),

    /// Another declaration by name
    Reference(String),

    /// The built-in `Date`
    Date,

    /// The `object` keyword
    AnyObject,

    /// Unsupported or unrecognized
    Unknown,
}

impl TypeExpr {
    pub fn string() -> Self {
        TypeExpr::Primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        TypeExpr::Primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        TypeExpr::Primitive(PrimitiveKind::Boolean)
    }

    pub fn array(inner: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(inner))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        TypeExpr::Reference(name.into())
    }

    pub fn string_lit(value: impl Into<String>) -> Self {
        TypeExpr::Literal(Literal::String(value.into()))
    }

    /// Names referenced anywhere in this expression.
    pub fn references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Reference(name) => out.push(name),
            TypeExpr::Array(inner) => inner.references(out),
            TypeExpr::Tuple { elements, rest } => {
                for e in elements {
                    e.references(out);
                }
                if let Some(rest) = rest {
                    rest.references(out);
                }
            }
            TypeExpr::Union(members) => {
                for m in members {
                    m.references(out);
                }
            }
            TypeExpr::Primitive(_)
            | TypeExpr::Literal(_)
            | TypeExpr::Date
            | TypeExpr::AnyObject
            | TypeExpr::Unknown => {}
        }
    }
}

/// Returns the values when every member is a string literal.
pub(crate) fn string_literals(members: &[TypeExpr]) -> Option<Vec<&str>> {
    if members.is_empty() {
        return None;
    }
    members
        .iter()
        .map(|m| match m {
            TypeExpr::Literal(Literal::String(s)) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_describe() {
        assert_eq!(Literal::String("air".into()).describe(), "'air'");
        assert_eq!(Literal::Number(4.0).describe(), "4");
        assert_eq!(Literal::Number(2.5).describe(), "2.5");
        assert_eq!(Literal::Bool(false).describe(), "false");
        assert_eq!(Literal::Null.describe(), "null");
    }

    #[test]
    fn test_string_literal_union_detection() {
        let decl = TypeDeclaration::new(
            "Cooling",
            false,
            DeclShape::Expr(TypeExpr::Union(vec![
                TypeExpr::string_lit("air"),
                TypeExpr::string_lit("liquid"),
            ])),
        );
        assert_eq!(decl.string_literal_union(), Some(vec!["air", "liquid"]));

        let mixed = TypeDeclaration::new(
            "Mixed",
            false,
            DeclShape::Expr(TypeExpr::Union(vec![
                TypeExpr::string_lit("air"),
                TypeExpr::Literal(Literal::Null),
            ])),
        );
        assert_eq!(mixed.string_literal_union(), None);
    }

    #[test]
    fn test_collect_references() {
        let expr = TypeExpr::Union(vec![
            TypeExpr::reference("A"),
            TypeExpr::array(TypeExpr::reference("B")),
            TypeExpr::Tuple {
                elements: vec![TypeExpr::string()],
                rest: Some(Box::new(TypeExpr::reference("C"))),
            },
        ]);
        let mut refs = Vec::new();
        expr.references(&mut refs);
        assert_eq!(refs, vec!["A", "B", "C"]);
    }
}
