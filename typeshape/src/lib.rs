//! # typeshape
//!
//! Compile TypeScript-style type declarations into runtime JSON validators.
//!
//! The compiler reads type aliases (`type X = ...` / `export type X = ...`)
//! and produces, for every exported declaration:
//!
//! - a validator returning [`ValidationResult`] for a `serde_json::Value`
//! - an entry in the [`ValidatorRegistry`], keyed by lower-cased name
//! - an entry in the [`ReadonlyRegistry`] listing its readonly properties
//!
//! The same artifacts can be rendered as a Zod module with [`ZodEmitter`].
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let artifacts = typeshape::compile(
//!     r#"
//!     type Cooling = "air" | "liquid" | "none";
//!     export type Product = {
//!         title: string;
//!         category: string;
//!         price: number;
//!         cooling?: Cooling;
//!     };
//!     "#,
//! )?;
//!
//! let result = artifacts.validate(
//!     "product",
//!     &json!({ "title": "Phone A", "category": "phones", "price": 499 }),
//! )?;
//! assert!(result.is_valid());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Business rules
//!
//! Exported object types follow the conventions of a JSON resource server:
//!
//! | Rule | Default |
//! |------|---------|
//! | Server-managed fields, never validated as input | `id`, `createdAt`, `updatedAt` |
//! | Mandatory non-empty string fields | `title`, `category` |
//! | Extra properties | rejected |
//!
//! Both field lists are configurable through [`CompilerOptions`].

pub mod ast;
pub mod builder;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod shape;
pub mod translator;
pub mod update;
pub mod validate;
pub mod zod;

pub use ast::{
    DeclShape, Literal, ObjectShape, PrimitiveKind, PropertySignature, Span, TypeDeclaration,
    TypeExpr,
};
pub use builder::{
    compile, compile_file, compile_file_with, compile_with, CompiledArtifacts, ReadonlyRegistry,
    RegistryBuilder, ValidatorRegistry,
};
pub use error::{CompileError, CompileResult, RegistryError};
pub use options::{CompilerOptions, MandatoryField, ServerFields};
pub use parser::DeclarationParser;
pub use registry::TypeRegistry;
pub use schema::{ObjectSchema, Schema, SchemaTable};
pub use shape::{CompiledShape, ShapeCompiler};
pub use translator::TypeTranslator;
pub use update::{UpdateGuard, UpdateRejection};
pub use validate::{FieldError, IssueCode, TypeValidator, ValidationResult};
pub use zod::ZodEmitter;
