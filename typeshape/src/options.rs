//! Compiler options.
//!
//! Defaults reproduce the business rules of the resource server: `id`,
//! `createdAt` and `updatedAt` are server-managed, `title` and `category`
//! are mandatory on every exported type.

use serde::{Deserialize, Serialize};

/// Names of the fields the resource server sets itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerFields {
    /// Numeric identifier
    pub id: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Default for ServerFields {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            created_at: "createdAt".to_string(),
            updated_at: "updatedAt".to_string(),
        }
    }
}

impl ServerFields {
    /// Whether `name` is one of the server-managed fields.
    pub fn contains(&self, name: &str) -> bool {
        self.id == name || self.created_at == name || self.updated_at == name
    }
}

/// A field forced onto every exported type as a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandatoryField {
    pub name: String,
    pub message: String,
}

impl MandatoryField {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Options controlling the object-shape business rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub server_fields: ServerFields,
    pub mandatory_fields: Vec<MandatoryField>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            server_fields: ServerFields::default(),
            mandatory_fields: vec![
                MandatoryField::new("title", "Title is required"),
                MandatoryField::new("category", "Category is required"),
            ],
        }
    }
}

impl CompilerOptions {
    /// The mandatory rule for `name`, if any.
    pub fn mandatory(&self, name: &str) -> Option<&MandatoryField> {
        self.mandatory_fields.iter().find(|f| f.name == name)
    }
}
