//! Type-expression translator.
//!
//! Turns one [`TypeExpr`] into a [`Schema`]. The property name is threaded
//! through so union messages can name the field they guard.

use crate::ast::{string_literals, Literal, PrimitiveKind, TypeExpr};
use crate::registry::TypeRegistry;
use crate::schema::Schema;
use tracing::{trace, warn};

/// Join options as `a, b or c`.
pub fn format_options<S: AsRef<str>>(options: &[S]) -> String {
    match options {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} or {}", head.join(", "), last.as_ref())
        }
    }
}

/// Message reported when a union or enum rejects a value.
pub fn invalid_value_message<S: AsRef<str>>(subject: &str, options: &[S]) -> String {
    format!(
        "Invalid value for '{}'. Expected {}",
        subject,
        format_options(options)
    )
}

/// Human-readable name of a union member.
pub fn describe(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Literal(literal) => literal.describe(),
        TypeExpr::Primitive(kind) => kind.keyword().to_string(),
        TypeExpr::Reference(name) => name.clone(),
        TypeExpr::Date => "Date".to_string(),
        TypeExpr::Array(inner) => format!("{}[]", describe(inner)),
        TypeExpr::Tuple { .. } | TypeExpr::Union(_) | TypeExpr::AnyObject | TypeExpr::Unknown => {
            "other".to_string()
        }
    }
}

/// Compiles type expressions against a frozen registry.
#[derive(Debug, Clone, Copy)]
pub struct TypeTranslator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> TypeTranslator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Compile `expr`, the declared type of `property`.
    pub fn compile(&self, expr: &TypeExpr, property: &str) -> Schema {
        match expr {
            TypeExpr::Primitive(PrimitiveKind::String) => Schema::string(),
            TypeExpr::Primitive(PrimitiveKind::Number) => Schema::Number,
            TypeExpr::Primitive(PrimitiveKind::Boolean) => Schema::Boolean,
            TypeExpr::Array(inner) => Schema::array(self.compile(inner, property)),
            TypeExpr::Tuple { elements, rest } => Schema::Tuple {
                items: elements
                    .iter()
                    .map(|element| self.compile(element, property))
                    .collect(),
                rest: rest
                    .as_deref()
                    .map(|rest| Box::new(self.rest_element(rest, property))),
            },
            TypeExpr::Literal(literal) => Schema::Literal(literal.clone()),
            TypeExpr::Union(members) => self.union(members, property),
            TypeExpr::Reference(name) => self.reference(name),
            TypeExpr::Date => Schema::DateTime,
            TypeExpr::AnyObject => Schema::Record,
            TypeExpr::Unknown => {
                trace!(property, "Unsupported type expression; accepting any value");
                Schema::Any
            }
        }
    }

    /// Element validator of a `...rest` tuple member.
    fn rest_element(&self, rest: &TypeExpr, property: &str) -> Schema {
        match rest {
            TypeExpr::Array(inner) => self.compile(inner, property),
            other => match self.compile(other, property) {
                Schema::Array(inner) => *inner,
                compiled => compiled,
            },
        }
    }

    fn union(&self, members: &[TypeExpr], property: &str) -> Schema {
        if let Some(values) = string_literals(members) {
            let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
            return Schema::Enum {
                message: invalid_value_message(property, &quoted),
                values: values.into_iter().map(str::to_string).collect(),
            };
        }

        let descriptions: Vec<String> = members.iter().map(describe).collect();
        Schema::Union {
            options: members
                .iter()
                .map(|member| self.compile(member, property))
                .collect(),
            message: invalid_value_message(property, &descriptions),
        }
    }

    fn reference(&self, name: &str) -> Schema {
        if name == "Date" {
            return Schema::DateTime;
        }
        let Some(target) = self.registry.lookup(name) else {
            warn!(name, "Unresolved type reference; accepting any value");
            return Schema::Any;
        };
        match target.string_literal_union() {
            Some(values) => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| Literal::String(v.to_string()).describe())
                    .collect();
                Schema::Enum {
                    message: invalid_value_message(name, &quoted),
                    values: values.into_iter().map(str::to_string).collect(),
                }
            }
            None => Schema::Ref(name.to_string()),
        }
    }
}
