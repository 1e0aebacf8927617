//! Zod module emitter.
//!
//! Renders compiled artifacts as a JavaScript module for resource servers
//! that validate with [Zod](https://zod.dev/). The module exports one
//! `<Name>Schema` per exported declaration, a `validate<Name>` function per
//! exported declaration, and the `validators` and `readonlyProperties` maps.
//!
//! Schemas are emitted dependencies first. A reference to a schema that is
//! not yet defined (a cycle or a self reference) is wrapped in `z.lazy()`.

use crate::builder::CompiledArtifacts;
use crate::schema::{literal_json, ObjectSchema, Schema, SchemaTable};
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::debug;

const INDENT: &str = "  ";

/// Renders [`Schema`] trees and whole modules as Zod source text.
#[derive(Debug, Clone)]
pub struct ZodEmitter {
    source_name: String,
}

impl Default for ZodEmitter {
    fn default() -> Self {
        Self::new("types.ts")
    }
}

impl ZodEmitter {
    /// Create an emitter; `source_name` is mentioned in the module header.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }

    /// Render the complete module.
    pub fn emit_module(&self, artifacts: &CompiledArtifacts) -> String {
        let order = dependency_order(&artifacts.schemas);
        let mut out = String::new();

        out.push_str(&format!(
            "// Auto-generated by typeshape from {}\n",
            self.source_name
        ));
        out.push_str("// Do not edit manually\n\n");
        out.push_str("import { z } from 'zod';\n");

        let mut emitted: HashSet<&str> = HashSet::new();
        for name in &order {
            let Some(schema) = artifacts.schemas.get(*name) else {
                continue;
            };
            let exported = artifacts
                .declarations
                .lookup(name)
                .is_some_and(|decl| decl.exported);
            let body = self.render(schema, &emitted, 0);
            let _ = write!(
                out,
                "\n{}const {} = {};\n",
                if exported { "export " } else { "" },
                schema_name(name),
                body
            );
            emitted.insert(*name);
        }

        for decl in artifacts.declarations.exported() {
            let _ = write!(
                out,
                r#"
export function validate{name}(data) {{
  const result = {schema}.safeParse(data);
  if (result.success) {{
    return {{ valid: true, data: result.data }};
  }}
  return {{
    valid: false,
    errors: result.error.errors.map((err) => ({{
      field: err.path.join('.'),
      message: err.message,
    }})),
  }};
}}
"#,
                name = decl.name,
                schema = schema_name(&decl.name),
            );
        }

        out.push_str("\nexport const validators = {\n");
        for (key, validator) in artifacts.validators.iter() {
            let _ = writeln!(
                out,
                "{}{}: validate{},",
                INDENT,
                quote(key),
                validator.type_name()
            );
        }
        out.push_str("};\n");

        out.push_str("\nexport const readonlyProperties = {\n");
        for (key, fields) in artifacts.readonly.iter() {
            let list: Vec<String> = fields.iter().map(|f| quote(f)).collect();
            let _ = writeln!(out, "{}{}: [{}],", INDENT, quote(key), list.join(", "));
        }
        out.push_str("};\n");

        debug!(
            schemas = order.len(),
            bytes = out.len(),
            "Rendered Zod module"
        );
        out
    }

    /// Render one schema expression. `defined` holds the schemas already
    /// declared above the expression.
    pub fn render(&self, schema: &Schema, defined: &HashSet<&str>, depth: usize) -> String {
        match schema {
            Schema::String { required: None } => "z.string()".to_string(),
            Schema::String {
                required: Some(message),
            } => {
                let message = quote(message);
                format!(
                    "z.string({{ required_error: {} }}).min(1, {})",
                    message, message
                )
            }
            Schema::Number => "z.number()".to_string(),
            Schema::Boolean => "z.boolean()".to_string(),
            Schema::DateTime => "z.string().datetime(\"Invalid date format\")".to_string(),
            Schema::Literal(literal) => format!("z.literal({})", literal_json(literal)),
            Schema::Enum { values, message } => {
                let values: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!(
                    "z.enum([{}], {{ errorMap: () => ({{ message: {} }}) }})",
                    values.join(", "),
                    quote(message)
                )
            }
            Schema::Union { options, message } => {
                let options: Vec<String> = options
                    .iter()
                    .map(|o| self.render(o, defined, depth))
                    .collect();
                format!(
                    "z.union([{}], {{ errorMap: (issue, ctx) => ({{ message: issue.code === 'invalid_union' ? {} : ctx.defaultError }}) }})",
                    options.join(", "),
                    quote(message)
                )
            }
            Schema::Array(inner) => format!("z.array({})", self.render(inner, defined, depth)),
            Schema::Tuple { items, rest } => {
                let items: Vec<String> = items
                    .iter()
                    .map(|i| self.render(i, defined, depth))
                    .collect();
                let mut out = format!("z.tuple([{}])", items.join(", "));
                if let Some(rest) = rest {
                    out.push_str(&format!(".rest({})", self.render(rest, defined, depth)));
                }
                out
            }
            Schema::Object(object) => self.render_object(object, defined, depth),
            Schema::Record => "z.record(z.any())".to_string(),
            Schema::Optional(inner) => format!("{}.optional()", self.render(inner, defined, depth)),
            Schema::Ref(name) if defined.contains(name.as_str()) => schema_name(name),
            Schema::Ref(name) => format!("z.lazy(() => {})", schema_name(name)),
            Schema::Any => "z.any()".to_string(),
        }
    }

    fn render_object(&self, object: &ObjectSchema, defined: &HashSet<&str>, depth: usize) -> String {
        let mut out = String::from("z.object({");
        if !object.fields.is_empty() {
            out.push('\n');
            let pad = INDENT.repeat(depth + 1);
            for (name, field) in &object.fields {
                let _ = writeln!(
                    out,
                    "{}{}: {},",
                    pad,
                    property_key(name),
                    self.render(field, defined, depth + 1)
                );
            }
            out.push_str(&INDENT.repeat(depth));
        }
        out.push_str("})");
        if object.strict {
            out.push_str(".strict()");
        }
        out
    }
}

/// Name of the emitted schema constant.
pub fn schema_name(name: &str) -> String {
    format!("{}Schema", name)
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Declaration names ordered so that dependencies come first.
///
/// Cycles are tolerated; the back edge is left for `z.lazy()`.
pub fn dependency_order(table: &SchemaTable) -> Vec<&str> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    for name in table.keys() {
        visit(name, table, &mut visited, &mut in_progress, &mut result);
    }
    result
}

fn visit<'a>(
    name: &'a str,
    table: &'a SchemaTable,
    visited: &mut HashSet<&'a str>,
    in_progress: &mut HashSet<&'a str>,
    result: &mut Vec<&'a str>,
) {
    if visited.contains(name) || in_progress.contains(name) {
        return;
    }
    let Some((key, schema)) = table.get_key_value(name) else {
        return;
    };
    in_progress.insert(key.as_str());

    let mut deps = Vec::new();
    schema.references(&mut deps);
    for dep in deps {
        visit(dep, table, visited, in_progress, result);
    }

    in_progress.remove(key.as_str());
    visited.insert(key.as_str());
    result.push(key.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::builder::compile;

    fn render(schema: &Schema) -> String {
        ZodEmitter::default().render(schema, &HashSet::new(), 0)
    }

    #[test]
    fn test_render_scalars() {
        insta::assert_snapshot!(render(&Schema::array(Schema::string())), @"z.array(z.string())");
        insta::assert_snapshot!(
            render(&Schema::optional(Schema::Literal(Literal::String("a".into())))),
            @r#"z.literal("a").optional()"#
        );
        insta::assert_snapshot!(
            render(&Schema::DateTime),
            @r#"z.string().datetime("Invalid date format")"#
        );
        insta::assert_snapshot!(render(&Schema::Record), @"z.record(z.any())");
    }

    #[test]
    fn test_render_required_string() {
        insta::assert_snapshot!(
            render(&Schema::required_string("Title is required")),
            @r#"z.string({ required_error: "Title is required" }).min(1, "Title is required")"#
        );
    }

    #[test]
    fn test_render_tuple_with_rest() {
        let tuple = Schema::Tuple {
            items: vec![Schema::string()],
            rest: Some(Box::new(Schema::Number)),
        };
        insta::assert_snapshot!(render(&tuple), @"z.tuple([z.string()]).rest(z.number())");
    }

    #[test]
    fn test_render_enum() {
        let schema = Schema::Enum {
            values: vec!["air".into(), "liquid".into()],
            message: "Invalid value for 'cooling'. Expected 'air' or 'liquid'".into(),
        };
        insta::assert_snapshot!(
            render(&schema),
            @r#"z.enum(["air", "liquid"], { errorMap: () => ({ message: "Invalid value for 'cooling'. Expected 'air' or 'liquid'" }) })"#
        );
    }

    #[test]
    fn test_render_refs_lazily_until_defined() {
        let reference = Schema::Ref("Node".into());
        assert_eq!(render(&reference), "z.lazy(() => NodeSchema)");

        let mut defined = HashSet::new();
        defined.insert("Node");
        assert_eq!(
            ZodEmitter::default().render(&reference, &defined, 0),
            "NodeSchema"
        );
    }

    #[test]
    fn test_render_object_quotes_odd_keys() {
        let object = Schema::Object(
            ObjectSchema::strict()
                .field("name", Schema::string())
                .field("content-type", Schema::string()),
        );
        assert_eq!(
            render(&object),
            "z.object({\n  name: z.string(),\n  \"content-type\": z.string(),\n}).strict()"
        );
    }

    #[test]
    fn test_dependency_order_puts_dependencies_first() {
        let artifacts = compile(
            r#"
            export type Order = { title: string; category: string; line: Line; tags: Tags };
            type Line = { qty: number };
            type Tags = string[];
            "#,
        )
        .unwrap();
        assert_eq!(
            dependency_order(&artifacts.schemas),
            vec!["Line", "Tags", "Order"]
        );
    }

    #[test]
    fn test_module_layout() {
        let artifacts = compile(
            r#"
            type Cooling = "air" | "liquid";
            export type Product = {
                readonly sku: string;
                title: string;
                category: string;
                cooling?: Cooling;
            };
            "#,
        )
        .unwrap();
        let module = ZodEmitter::new("types.ts").emit_module(&artifacts);

        assert!(module.starts_with("// Auto-generated by typeshape from types.ts\n"));
        assert!(module.contains("import { z } from 'zod';"));
        assert!(module.contains("\nconst CoolingSchema = z.enum("));
        assert!(module.contains("\nexport const ProductSchema = z.object({"));
        assert!(module.contains("export function validateProduct(data) {"));
        assert!(module.contains("  \"product\": validateProduct,\n"));
        assert!(module.contains("  \"product\": [\"sku\"],\n"));
    }

    #[test]
    fn test_self_reference_is_lazy() {
        let artifacts = compile(
            r#"
            type Node = { value: number; children: Node[] };
            export type Tree = { title: string; category: string; root: Node };
            "#,
        )
        .unwrap();
        let module = ZodEmitter::default().emit_module(&artifacts);
        assert!(module.contains("children: z.array(z.lazy(() => NodeSchema)),"));
        assert!(module.contains("root: NodeSchema,"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let source = r#"
            export type A = { title: string; category: string; b: B };
            export type B = { title: string; category: string; a?: A };
        "#;
        let first = ZodEmitter::default().emit_module(&compile(source).unwrap());
        let second = ZodEmitter::default().emit_module(&compile(source).unwrap());
        assert_eq!(first, second);
    }
}
