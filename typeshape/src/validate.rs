//! Validation results and validator functions.
//!
//! A [`TypeValidator`] is the runtime form of one exported declaration. It
//! never fails on bad data: every structural violation is returned as a
//! [`FieldError`] inside [`ValidationResult::Invalid`].

use crate::schema::{Checker, Schema, SchemaTable};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Kind of structural violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A required value is absent.
    Required,
    /// The value has the wrong JSON type.
    InvalidType,
    /// The value is not the expected literal.
    InvalidLiteral,
    /// The value is not one of the enum options.
    InvalidEnumValue,
    /// No union member accepted the value.
    InvalidUnion,
    /// A string failed a format check.
    InvalidString,
    /// A string or tuple is too short.
    TooSmall,
    /// A fixed-length tuple is too long.
    TooBig,
    /// A closed object carries undeclared keys.
    UnrecognizedKeys,
    #[default]
    Custom,
}

/// Validation error for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (empty for the root value)
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Kind of violation
    #[serde(skip)]
    pub code: IssueCode,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: IssueCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }

    /// Create a custom field error
    pub fn custom(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, IssueCode::Custom)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Outcome of validating one candidate value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The candidate satisfied the validator.
    Valid { data: Value },
    /// One entry per violated field, in discovery order.
    Invalid { errors: Vec<FieldError> },
}

impl ValidationResult {
    /// Build a result from collected errors.
    pub fn from_errors(data: &Value, errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            trace!("Validation passed");
            ValidationResult::Valid { data: data.clone() }
        } else {
            let field_names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
            debug!(
                error_count = errors.len(),
                fields = ?field_names,
                "Validation failed"
            );
            ValidationResult::Invalid { errors }
        }
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    /// The validated data, if valid.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ValidationResult::Valid { data } => Some(data),
            ValidationResult::Invalid { .. } => None,
        }
    }

    /// Get the errors (empty if valid)
    pub fn errors(&self) -> &[FieldError] {
        match self {
            ValidationResult::Valid { .. } => &[],
            ValidationResult::Invalid { errors } => errors,
        }
    }

    /// Convert to a map of field -> messages, keeping the first-seen field order.
    pub fn errors_by_field(&self) -> Vec<(&str, Vec<&str>)> {
        let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for error in self.errors() {
            let field = error.field.as_str();
            let message = error.message.as_str();
            match index.get(field) {
                Some(&i) => grouped[i].1.push(message),
                None => {
                    index.insert(field, grouped.len());
                    grouped.push((field, vec![message]));
                }
            }
        }
        grouped
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            ValidationResult::Valid { data } => {
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("data", data)?;
            }
            ValidationResult::Invalid { errors } => {
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("errors", errors)?;
            }
        }
        map.end()
    }
}

/// Validator function for one exported declaration.
///
/// Cloning is cheap; all validators of a compilation share one schema table.
#[derive(Debug, Clone)]
pub struct TypeValidator {
    name: String,
    table: Arc<SchemaTable>,
}

impl TypeValidator {
    pub(crate) fn new(name: impl Into<String>, table: Arc<SchemaTable>) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Declared name of the validated type.
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// The compiled schema this validator runs.
    pub fn schema(&self) -> Option<&Schema> {
        self.table.get(&self.name)
    }

    /// Validate a candidate value.
    pub fn validate(&self, candidate: &Value) -> ValidationResult {
        let errors = match self.table.get(&self.name) {
            Some(schema) => {
                let mut checker = Checker::new(&self.table);
                checker.check(schema, Some(candidate));
                checker.into_errors()
            }
            None => {
                warn!(type_name = %self.name, "No compiled schema for validator; rejecting candidate");
                vec![FieldError::new(
                    "",
                    format!("No schema compiled for type '{}'", self.name),
                    IssueCode::Custom,
                )]
            }
        };
        trace!(type_name = %self.name, "Validated candidate");
        ValidationResult::from_errors(candidate, errors)
    }
}
