//! Object-shape compiler.
//!
//! Applies the resource-server rules on top of the translator output:
//!
//! - server-managed fields are never validated as caller input; exported
//!   types accept them as optional passthrough
//! - mandatory fields are forced to non-empty strings on exported types,
//!   and injected when the declaration omits them
//! - readonly properties are recorded, including server-managed ones
//!
//! Every object shape compiles to a closed (strict) object.

use crate::ast::{DeclShape, ObjectShape, TypeDeclaration};
use crate::options::CompilerOptions;
use crate::schema::{ObjectSchema, Schema};
use crate::translator::TypeTranslator;
use tracing::{debug, warn};

/// Output of compiling one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShape {
    pub schema: Schema,
    /// Readonly property names in declaration order
    pub readonly: Vec<String>,
}

pub struct ShapeCompiler<'a> {
    translator: TypeTranslator<'a>,
    options: &'a CompilerOptions,
}

impl<'a> ShapeCompiler<'a> {
    pub fn new(translator: TypeTranslator<'a>, options: &'a CompilerOptions) -> Self {
        Self {
            translator,
            options,
        }
    }

    pub fn compile(&self, decl: &TypeDeclaration) -> CompiledShape {
        let compiled = match &decl.shape {
            DeclShape::Object(shape) => self.object(shape, decl.exported),
            DeclShape::Expr(expr) if !decl.exported => CompiledShape {
                schema: self.translator.compile(expr, &decl.name),
                readonly: Vec::new(),
            },
            DeclShape::Expr(_) => {
                warn!(
                    name = %decl.name,
                    line = decl.span.line,
                    "Exported type is not an object shape; compiling it as an empty object"
                );
                self.object(&ObjectShape::default(), true)
            }
        };
        debug!(
            name = %decl.name,
            exported = decl.exported,
            readonly = compiled.readonly.len(),
            "Compiled declaration"
        );
        compiled
    }

    fn object(&self, shape: &ObjectShape, exported: bool) -> CompiledShape {
        let server = &self.options.server_fields;
        let mut object = ObjectSchema::strict();
        let mut readonly = Vec::new();

        if exported {
            object = object
                .field(&server.id, Schema::optional(Schema::Number))
                .field(&server.created_at, Schema::optional(Schema::string()))
                .field(&server.updated_at, Schema::optional(Schema::string()));
        }

        for property in &shape.properties {
            if property.readonly {
                readonly.push(property.name.clone());
            }
            if server.contains(&property.name) {
                continue;
            }

            let mandatory = exported
                .then(|| self.options.mandatory(&property.name))
                .flatten();
            let schema = match mandatory {
                Some(rule) => Schema::required_string(&rule.message),
                None => self.translator.compile(&property.ty, &property.name),
            };
            let schema = if property.optional {
                Schema::optional(schema)
            } else {
                schema
            };
            object.fields.insert(property.name.clone(), schema);
        }

        if exported {
            for rule in &self.options.mandatory_fields {
                if shape.get(&rule.name).is_none() && !object.fields.contains_key(&rule.name) {
                    object
                        .fields
                        .insert(rule.name.clone(), Schema::required_string(&rule.message));
                }
            }
        }

        CompiledShape {
            schema: Schema::Object(object),
            readonly,
        }
    }
}
