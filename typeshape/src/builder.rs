//! Emission and registry building.
//!
//! Every declaration is compiled into the shared schema table so it can be
//! referenced by name. Exported declarations additionally get a validator
//! and a readonly-field entry, both keyed by the lower-cased type name.

use crate::ast::TypeDeclaration;
use crate::error::{CompileError, CompileResult, RegistryError};
use crate::options::CompilerOptions;
use crate::parser::DeclarationParser;
use crate::registry::TypeRegistry;
use crate::schema::SchemaTable;
use crate::shape::ShapeCompiler;
use crate::translator::TypeTranslator;
use crate::validate::{TypeValidator, ValidationResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validators of exported types, keyed by lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: IndexMap<String, TypeValidator>,
}

impl ValidatorRegistry {
    /// Get a validator by lower-cased type name.
    pub fn get(&self, name: &str) -> Option<&TypeValidator> {
        self.validators.get(name)
    }

    /// Validate `candidate` against the validator registered under `name`.
    ///
    /// An unknown name is a caller bug and is reported as an error rather
    /// than as a failed validation.
    pub fn validate(&self, name: &str, candidate: &Value) -> Result<ValidationResult, RegistryError> {
        self.validators
            .get(name)
            .map(|validator| validator.validate(candidate))
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Registered keys in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeValidator)> {
        self.validators.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Readonly properties of exported types, keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadonlyRegistry {
    fields: IndexMap<String, Vec<String>>,
}

impl ReadonlyRegistry {
    /// Readonly fields of a type, if the type is registered.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Whether `field` is readonly on the type `name`.
    pub fn is_readonly(&self, name: &str, field: &str) -> bool {
        self.get(name)
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything one compiler run produces.
#[derive(Debug, Clone)]
pub struct CompiledArtifacts {
    pub validators: ValidatorRegistry,
    pub readonly: ReadonlyRegistry,
    /// Compiled schemas of all declarations, exported or not
    pub schemas: Arc<SchemaTable>,
    /// The declarations the artifacts were built from
    pub declarations: TypeRegistry,
}

impl CompiledArtifacts {
    /// Validate `candidate` as an instance of the exported type `name`.
    pub fn validate(&self, name: &str, candidate: &Value) -> Result<ValidationResult, RegistryError> {
        self.validators.validate(name, candidate)
    }
}

/// Builds the artifacts from a frozen registry.
pub struct RegistryBuilder<'a> {
    registry: &'a TypeRegistry,
    options: &'a CompilerOptions,
}

impl<'a> RegistryBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry, options: &'a CompilerOptions) -> Self {
        Self { registry, options }
    }

    pub fn build(&self) -> CompiledArtifacts {
        let compiler = ShapeCompiler::new(TypeTranslator::new(self.registry), self.options);

        let mut table = SchemaTable::new();
        let mut readonly_by_decl = Vec::new();
        for decl in self.registry.declarations() {
            let compiled = compiler.compile(decl);
            table.insert(decl.name.clone(), compiled.schema);
            if decl.exported {
                readonly_by_decl.push((decl, compiled.readonly));
            }
        }

        let table = Arc::new(table);
        let mut validators = IndexMap::new();
        let mut readonly = IndexMap::new();
        for (decl, fields) in readonly_by_decl {
            let key = registry_key(decl);
            if validators.contains_key(&key) {
                warn!(
                    name = %decl.name,
                    key = %key,
                    "Exported types collide after lower-casing; the later one wins"
                );
            }
            validators.insert(key.clone(), TypeValidator::new(&decl.name, Arc::clone(&table)));
            readonly.insert(key, fields);
        }

        debug!(
            declarations = table.len(),
            exported = validators.len(),
            "Built validator registries"
        );

        CompiledArtifacts {
            validators: ValidatorRegistry { validators },
            readonly: ReadonlyRegistry { fields: readonly },
            schemas: table,
            declarations: self.registry.clone(),
        }
    }
}

/// Registry key of an exported declaration.
pub fn registry_key(decl: &TypeDeclaration) -> String {
    decl.name.to_lowercase()
}

/// Compile declaration source with default options.
pub fn compile(source: &str) -> CompileResult<CompiledArtifacts> {
    compile_with(source, &CompilerOptions::default())
}

/// Compile declaration source.
pub fn compile_with(source: &str, options: &CompilerOptions) -> CompileResult<CompiledArtifacts> {
    compile_source(&DeclarationParser::default(), source, options)
}

/// Read and compile a declaration file with default options.
pub fn compile_file(path: &Path) -> CompileResult<CompiledArtifacts> {
    compile_file_with(path, &CompilerOptions::default())
}

/// Read and compile a declaration file.
pub fn compile_file_with(path: &Path, options: &CompilerOptions) -> CompileResult<CompiledArtifacts> {
    let source =
        std::fs::read_to_string(path).map_err(|e| CompileError::source_missing(path, e))?;
    let parser = DeclarationParser::new(path.display().to_string());
    compile_source(&parser, &source, options)
}

fn compile_source(
    parser: &DeclarationParser,
    source: &str,
    options: &CompilerOptions,
) -> CompileResult<CompiledArtifacts> {
    let declarations = parser.parse(source)?;
    let registry = TypeRegistry::from_declarations(declarations);
    let artifacts = RegistryBuilder::new(&registry, options).build();
    info!(
        origin = parser.origin(),
        types = artifacts.validators.len(),
        "Compiled declarations"
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_exported_types_are_registered() {
        let artifacts = compile(
            r#"
            type Dimensions = { width: number; height: number };
            export type Monitor = { title: string; category: string; size: Dimensions };
            "#,
        )
        .unwrap();

        assert_eq!(artifacts.validators.names().collect::<Vec<_>>(), vec!["monitor"]);
        assert!(artifacts.schemas.contains_key("Dimensions"));
        assert!(artifacts.validators.get("dimensions").is_none());
        assert_eq!(artifacts.readonly.get("monitor"), Some(&[][..]));
    }

    #[test]
    fn test_validate_unknown_type_is_an_error() {
        let artifacts = compile("export type A = { title: string; category: string };").unwrap();
        let err = artifacts.validate("b", &json!({})).unwrap_err();
        assert_eq!(err, RegistryError::UnknownType { name: "b".into() });
    }

    #[test]
    fn test_forward_reference_resolves() {
        let artifacts = compile(
            r#"
            export type Order = { title: string; category: string; line: Line };
            type Line = { qty: number };
            "#,
        )
        .unwrap();
        let ok = json!({"title": "o", "category": "c", "line": {"qty": 2}});
        assert!(artifacts.validate("order", &ok).unwrap().is_valid());

        let bad = json!({"title": "o", "category": "c", "line": {"qty": "2"}});
        let result = artifacts.validate("order", &bad).unwrap();
        assert_eq!(result.errors()[0].field, "line.qty");
    }

    #[test]
    fn test_lowercase_collision_later_wins() {
        let artifacts = compile(
            r#"
            export type Item = { title: string; category: string; a: number };
            export type ITEM = { title: string; category: string; readonly b: number };
            "#,
        )
        .unwrap();
        assert_eq!(artifacts.validators.len(), 1);
        assert_eq!(artifacts.validators.get("item").unwrap().type_name(), "ITEM");
        assert_eq!(artifacts.readonly.get("item"), Some(&["b".to_string()][..]));
    }

    #[test]
    fn test_compile_file_missing() {
        let err = compile_file(Path::new("/definitely/not/here/types.ts")).unwrap_err();
        assert!(matches!(err, CompileError::SourceMissing { .. }));
    }

    #[test]
    fn test_compile_file_reads_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.ts");
        std::fs::write(&path, "export type Note = { title: string; category: string };").unwrap();
        let artifacts = compile_file(&path).unwrap();
        assert!(artifacts.validators.contains("note"));
    }
}
