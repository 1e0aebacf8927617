//! Runtime schema tree.
//!
//! A [`Schema`] is the compiled, resolved form of a type expression. Named
//! references stay pointers into a shared [`SchemaTable`] and are looked up
//! while checking, so recursive and mutually recursive declarations never
//! need to be expanded.
//!
//! Error messages follow the wording of the generated Zod module, so the
//! in-memory validators and the emitted ones report identical errors.

use crate::ast::{format_number, Literal};
use crate::validate::{FieldError, IssueCode};
use chrono::DateTime;
use indexmap::IndexMap;
use serde_json::Value;

/// Compiled validators of one compilation, keyed by declared name.
pub type SchemaTable = IndexMap<String, Schema>;

/// A compiled validator expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Any string. With `required`, a non-empty string whose absence and
    /// emptiness are reported with the given message.
    String { required: Option<String> },
    Number,
    Boolean,
    /// ISO-8601 UTC date-time string
    DateTime,
    Literal(Literal),
    /// Finite set of strings with a custom message
    Enum { values: Vec<String>, message: String },
    /// Alternation; the message is reported when no option accepts
    Union { options: Vec<Schema>, message: String },
    Array(Box<Schema>),
    Tuple {
        items: Vec<Schema>,
        rest: Option<Box<Schema>>,
    },
    Object(ObjectSchema),
    /// Any JSON object
    Record,
    /// Also accepts absence
    Optional(Box<Schema>),
    /// Pointer to another compiled declaration
    Ref(String),
    Any,
}

impl Schema {
    pub fn array(inner: Schema) -> Self {
        Schema::Array(Box::new(inner))
    }

    pub fn optional(inner: Schema) -> Self {
        match inner {
            already @ Schema::Optional(_) => already,
            other => Schema::Optional(Box::new(other)),
        }
    }

    pub fn string() -> Self {
        Schema::String { required: None }
    }

    /// Non-empty string reporting `message` when absent or empty.
    pub fn required_string(message: impl Into<String>) -> Self {
        Schema::String {
            required: Some(message.into()),
        }
    }

    /// Names of the declarations this schema points to.
    pub fn references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Schema::Ref(name) => out.push(name),
            Schema::Array(inner) | Schema::Optional(inner) => inner.references(out),
            Schema::Union { options, .. } => {
                for option in options {
                    option.references(out);
                }
            }
            Schema::Tuple { items, rest } => {
                for item in items {
                    item.references(out);
                }
                if let Some(rest) = rest {
                    rest.references(out);
                }
            }
            Schema::Object(object) => {
                for field in object.fields.values() {
                    field.references(out);
                }
            }
            Schema::String { .. }
            | Schema::Number
            | Schema::Boolean
            | Schema::DateTime
            | Schema::Literal(_)
            | Schema::Enum { .. }
            | Schema::Record
            | Schema::Any => {}
        }
    }
}

/// Object validator. Field order follows the declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub fields: IndexMap<String, Schema>,
    /// Reject keys that are not declared
    pub strict: bool,
}

impl ObjectSchema {
    pub fn strict() -> Self {
        Self {
            fields: IndexMap::new(),
            strict: true,
        }
    }

    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }
}

/// JavaScript-style type name of a candidate value.
pub(crate) fn received(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn literal_matches(literal: &Literal, value: &Value) -> bool {
    match (literal, value) {
        (Literal::String(expected), Value::String(actual)) => expected == actual,
        (Literal::Number(expected), Value::Number(actual)) => actual.as_f64() == Some(*expected),
        (Literal::Bool(expected), Value::Bool(actual)) => expected == actual,
        (Literal::Null, Value::Null) => true,
        _ => false,
    }
}

/// Render a literal the way `JSON.stringify` would.
pub(crate) fn literal_json(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => Value::String(s.clone()).to_string(),
        Literal::Number(n) => format_number(*n),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

/// UTC timestamp as produced by `Date.prototype.toISOString`.
pub(crate) fn is_iso_datetime(s: &str) -> bool {
    s.len() > 10
        && s.as_bytes()[10] == b'T'
        && s.ends_with('Z')
        && DateTime::parse_from_rfc3339(s).is_ok()
}

/// Walks a candidate value against a schema, collecting field errors.
pub(crate) struct Checker<'t> {
    table: &'t SchemaTable,
    path: Vec<String>,
    errors: Vec<FieldError>,
    /// References followed since the last descent into a child value
    hops: usize,
}

impl<'t> Checker<'t> {
    pub(crate) fn new(table: &'t SchemaTable) -> Self {
        Self {
            table,
            path: Vec::new(),
            errors: Vec::new(),
            hops: 0,
        }
    }

    pub(crate) fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    fn report(&mut self, message: impl Into<String>, code: IssueCode) {
        self.errors
            .push(FieldError::new(self.path.join("."), message, code));
    }

    fn invalid_type(&mut self, expected: &str, value: Option<&Value>) {
        match value {
            None => self.report("Required", IssueCode::Required),
            Some(_) => self.report(
                format!("Expected {}, received {}", expected, received(value)),
                IssueCode::InvalidType,
            ),
        }
    }

    fn descend(&mut self, segment: String, schema: &Schema, value: Option<&Value>) {
        let hops = std::mem::replace(&mut self.hops, 0);
        self.path.push(segment);
        self.check(schema, value);
        self.path.pop();
        self.hops = hops;
    }

    /// Whether `schema` accepts `value`, without recording anything.
    fn accepts(&self, schema: &Schema, value: Option<&Value>) -> bool {
        let mut scratch = Checker {
            table: self.table,
            path: Vec::new(),
            errors: Vec::new(),
            hops: self.hops,
        };
        scratch.check(schema, value);
        scratch.errors.is_empty()
    }

    pub(crate) fn check(&mut self, schema: &Schema, value: Option<&Value>) {
        match schema {
            Schema::Any => {}
            Schema::Optional(inner) => {
                if value.is_some() {
                    self.check(inner, value);
                }
            }
            Schema::String { required } => match (value, required) {
                (Some(Value::String(s)), Some(message)) if s.is_empty() => {
                    let message = message.clone();
                    self.report(message, IssueCode::TooSmall);
                }
                (Some(Value::String(_)), _) => {}
                (None, Some(message)) => {
                    let message = message.clone();
                    self.report(message, IssueCode::Required);
                }
                _ => self.invalid_type("string", value),
            },
            Schema::Number => {
                if !matches!(value, Some(Value::Number(_))) {
                    self.invalid_type("number", value);
                }
            }
            Schema::Boolean => {
                if !matches!(value, Some(Value::Bool(_))) {
                    self.invalid_type("boolean", value);
                }
            }
            Schema::DateTime => match value {
                Some(Value::String(s)) => {
                    if !is_iso_datetime(s) {
                        self.report("Invalid date format", IssueCode::InvalidString);
                    }
                }
                _ => self.invalid_type("string", value),
            },
            Schema::Literal(literal) => match value {
                None => self.report("Required", IssueCode::Required),
                Some(v) if literal_matches(literal, v) => {}
                Some(_) => self.report(
                    format!("Invalid literal value, expected {}", literal_json(literal)),
                    IssueCode::InvalidLiteral,
                ),
            },
            Schema::Enum { values, message } => {
                let ok = matches!(value, Some(Value::String(s)) if values.iter().any(|v| v == s));
                if !ok {
                    let message = message.clone();
                    self.report(message, IssueCode::InvalidEnumValue);
                }
            }
            Schema::Union { options, message } => {
                if value.is_none() {
                    self.report("Required", IssueCode::Required);
                } else if !options.iter().any(|option| self.accepts(option, value)) {
                    let message = message.clone();
                    self.report(message, IssueCode::InvalidUnion);
                }
            }
            Schema::Array(inner) => match value {
                Some(Value::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        self.descend(i.to_string(), inner, Some(item));
                    }
                }
                _ => self.invalid_type("array", value),
            },
            Schema::Tuple { items, rest } => match value {
                Some(Value::Array(values)) => {
                    if values.len() < items.len() {
                        self.report(
                            format!("Array must contain at least {} element(s)", items.len()),
                            IssueCode::TooSmall,
                        );
                        return;
                    }
                    if rest.is_none() && values.len() > items.len() {
                        self.report(
                            format!("Array must contain at most {} element(s)", items.len()),
                            IssueCode::TooBig,
                        );
                        return;
                    }
                    for (i, item) in values.iter().enumerate() {
                        let schema = match items.get(i) {
                            Some(schema) => schema,
                            None => match rest {
                                Some(rest) => rest,
                                None => break,
                            },
                        };
                        self.descend(i.to_string(), schema, Some(item));
                    }
                }
                _ => self.invalid_type("array", value),
            },
            Schema::Record => {
                if !matches!(value, Some(Value::Object(_))) {
                    self.invalid_type("object", value);
                }
            }
            Schema::Object(object) => match value {
                Some(Value::Object(map)) => {
                    for (name, field) in &object.fields {
                        self.descend(name.clone(), field, map.get(name));
                    }
                    if object.strict {
                        let unknown: Vec<String> = map
                            .keys()
                            .filter(|key| !object.fields.contains_key(key.as_str()))
                            .map(|key| format!("'{}'", key))
                            .collect();
                        if !unknown.is_empty() {
                            self.report(
                                format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
                                IssueCode::UnrecognizedKeys,
                            );
                        }
                    }
                }
                _ => self.invalid_type("object", value),
            },
            Schema::Ref(name) => {
                let table = self.table;
                let Some(target) = table.get(name) else {
                    return;
                };
                // A reference chain that never reaches a value is a cycle
                // through aliases only; it constrains nothing.
                if self.hops > table.len() {
                    return;
                }
                self.hops += 1;
                self.check(target, value);
                self.hops -= 1;
            }
        }
    }
}
