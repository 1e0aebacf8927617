//! Type registry: the symbol table of a single compiler run.
//!
//! The registry is filled in one left-to-right pass over the parsed
//! declarations and is only read afterwards, so any declaration may refer
//! to any other regardless of textual order.

use crate::ast::TypeDeclaration;
use indexmap::IndexMap;
use tracing::warn;

/// Lookup table from declaration name to declaration.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    declarations: IndexMap<String, TypeDeclaration>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from parsed declarations in source order.
    pub fn from_declarations(declarations: impl IntoIterator<Item = TypeDeclaration>) -> Self {
        let mut registry = Self::new();
        for decl in declarations {
            registry.register(decl);
        }
        registry
    }

    /// Register a declaration.
    ///
    /// A later declaration with the same name replaces the earlier one but
    /// keeps its position.
    pub fn register(&mut self, decl: TypeDeclaration) {
        if let Some(previous) = self.declarations.get(&decl.name) {
            warn!(
                name = %decl.name,
                first_line = previous.span.line,
                line = decl.span.line,
                "Duplicate type declaration; the later one wins"
            );
        }
        self.declarations.insert(decl.name.clone(), decl);
    }

    /// Get a declaration by name.
    pub fn lookup(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// All declarations in registration order.
    pub fn declarations(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.values()
    }

    /// Exported declarations in registration order.
    pub fn exported(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.values().filter(|d| d.exported)
    }

    /// Get the number of registered declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
