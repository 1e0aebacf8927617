//! Update guard for resource servers.
//!
//! Updates are checked in a fixed order: server-managed fields are dropped
//! from the patch, readonly fields are rejected as a distinct failure, and
//! only then is the merged document validated.

use crate::builder::CompiledArtifacts;
use crate::options::ServerFields;
use crate::schema::received;
use crate::validate::{FieldError, IssueCode, ValidationResult};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

/// Why an update was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateRejection {
    #[error("No validator registered for type '{name}'")]
    UnknownType { name: String },

    /// The patch touches fields that are immutable once created.
    #[error("The following properties are readonly and cannot be updated: {}", fields.join(", "))]
    ReadonlyViolation { fields: Vec<String> },

    /// The merged document fails validation.
    #[error("Invalid data: {}", errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid { errors: Vec<FieldError> },
}

/// Applies the readonly and validation rules to partial updates.
pub struct UpdateGuard<'a> {
    artifacts: &'a CompiledArtifacts,
    server_fields: ServerFields,
}

impl<'a> UpdateGuard<'a> {
    pub fn new(artifacts: &'a CompiledArtifacts) -> Self {
        Self::with_server_fields(artifacts, ServerFields::default())
    }

    pub fn with_server_fields(artifacts: &'a CompiledArtifacts, server_fields: ServerFields) -> Self {
        Self {
            artifacts,
            server_fields,
        }
    }

    /// Check `patch` against `existing` for the exported type `type_name`
    /// (lower-cased registry key) and return the merged document.
    pub fn check(&self, type_name: &str, existing: &Value, patch: &Value) -> Result<Value, UpdateRejection> {
        let validator =
            self.artifacts
                .validators
                .get(type_name)
                .ok_or_else(|| UpdateRejection::UnknownType {
                    name: type_name.to_string(),
                })?;

        let Value::Object(patch) = patch else {
            return Err(UpdateRejection::Invalid {
                errors: vec![FieldError::new(
                    "",
                    format!("Expected object, received {}", received(Some(patch))),
                    IssueCode::InvalidType,
                )],
            });
        };

        let fields: Map<String, Value> = patch
            .iter()
            .filter(|(key, _)| !self.server_fields.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let touched: Vec<String> = fields
            .keys()
            .filter(|key| self.artifacts.readonly.is_readonly(type_name, key))
            .cloned()
            .collect();
        if !touched.is_empty() {
            debug!(type_name, fields = ?touched, "Rejected update of readonly fields");
            return Err(UpdateRejection::ReadonlyViolation { fields: touched });
        }

        let mut merged = match existing {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let changed = !fields.is_empty();
        merged.extend(fields);
        let merged = Value::Object(merged);

        if !changed {
            trace!(type_name, "Empty update; nothing to validate");
            return Ok(merged);
        }

        match validator.validate(&merged) {
            ValidationResult::Valid { data } => Ok(data),
            ValidationResult::Invalid { errors } => Err(UpdateRejection::Invalid { errors }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compile;
    use serde_json::json;

    fn artifacts() -> CompiledArtifacts {
        compile(
            r#"
            export type Product = {
                readonly id: number;
                readonly sku: string;
                title: string;
                category: string;
                price: number;
            };
            "#,
        )
        .unwrap()
    }

    fn existing() -> Value {
        json!({
            "id": 1,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z",
            "sku": "A-1",
            "title": "Phone",
            "category": "phones",
            "price": 10
        })
    }

    #[test]
    fn test_readonly_violation_is_distinct() {
        let artifacts = artifacts();
        let guard = UpdateGuard::new(&artifacts);
        let err = guard
            .check("product", &existing(), &json!({"sku": "B-2", "price": 12}))
            .unwrap_err();
        assert_eq!(
            err,
            UpdateRejection::ReadonlyViolation {
                fields: vec!["sku".into()]
            }
        );
        assert_eq!(
            err.to_string(),
            "The following properties are readonly and cannot be updated: sku"
        );
    }

    #[test]
    fn test_server_fields_are_dropped_from_patch() {
        let artifacts = artifacts();
        let guard = UpdateGuard::new(&artifacts);
        let merged = guard
            .check("product", &existing(), &json!({"id": 99, "price": 12}))
            .unwrap();
        assert_eq!(merged["id"], json!(1));
        assert_eq!(merged["price"], json!(12));
    }

    #[test]
    fn test_invalid_merge_reports_field_errors() {
        let artifacts = artifacts();
        let guard = UpdateGuard::new(&artifacts);
        let err = guard
            .check("product", &existing(), &json!({"price": "free"}))
            .unwrap_err();
        let UpdateRejection::Invalid { errors } = err else {
            panic!("expected invalid");
        };
        assert_eq!(errors[0].field, "price");
        assert_eq!(errors[0].message, "Expected number, received string");
    }

    #[test]
    fn test_unknown_type_and_non_object_patch() {
        let artifacts = artifacts();
        let guard = UpdateGuard::new(&artifacts);
        assert!(matches!(
            guard.check("order", &existing(), &json!({})),
            Err(UpdateRejection::UnknownType { .. })
        ));
        assert!(matches!(
            guard.check("product", &existing(), &json!([1])),
            Err(UpdateRejection::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_patch_returns_existing() {
        let artifacts = artifacts();
        let guard = UpdateGuard::new(&artifacts);
        let merged = guard
            .check("product", &existing(), &json!({"updatedAt": "x"}))
            .unwrap();
        assert_eq!(merged, existing());
    }
}
