//! Integration tests for typeshape-cli.
//!
//! These tests drive the library the same way the commands do: load a
//! configuration, compile the declaration file, write or compare the module,
//! and check data files.

use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use typeshape::{UpdateGuard, UpdateRejection};
use typeshape_cli::{
    checker::{group_by_field, DataChecker, FileOutcome},
    config::{CliArgs, Config, ConfigManager, CONFIG_FILENAME},
    error::CliError,
    generator::ModuleGenerator,
    writer::{FileWriter, WriteResult},
};

/// Get the path to test fixtures.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Configuration pointing at the fixture project.
fn fixture_config() -> Config {
    ConfigManager::merge_cli_args(
        Config::default(),
        &CliArgs {
            input: Some(fixtures_path().join("types.ts")),
            data_dir: Some(fixtures_path().join("database")),
            ..Default::default()
        },
    )
}

/// Create a temporary directory with test files.
fn create_temp_project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

const SIMPLE_TYPES: &str = r#"
export type Note = {
  readonly author: string;
  title: string;
  category: string;
  body?: string;
};
"#;

fn temp_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.file = dir.path().join("types.ts");
    config.output.dir = dir.path().join("generated");
    config.data.dir = dir.path().join("database");
    config
}

// =============================================================================
// Generation Tests
// =============================================================================

#[test]
fn test_generate_fixture_module() {
    let output = ModuleGenerator::new(fixture_config()).generate().unwrap();

    assert_eq!(output.exported_count(), 2);
    assert_eq!(output.declaration_count(), 4);

    let content = &output.content;
    assert!(content.starts_with("// Auto-generated by typeshape from types.ts\n"));
    assert!(content.contains("import { z } from 'zod';"));
    assert!(content.contains("export const ProductSchema = "));
    assert!(content.contains("export const ReviewSchema = "));
    assert!(content.contains("export function validateProduct(data)"));
    assert!(content.contains("\"product\": validateProduct"));
    assert!(content.contains("\"review\": validateReview"));
    assert!(!content.contains("formatPrice"));
}

#[test]
fn test_generate_is_deterministic() {
    let first = ModuleGenerator::new(fixture_config()).generate().unwrap();
    let second = ModuleGenerator::new(fixture_config()).generate().unwrap();
    assert_eq!(first.content, second.content);
}

#[test]
fn test_generate_and_write_then_up_to_date() {
    let dir = create_temp_project(&[("types.ts", SIMPLE_TYPES)]);
    let config = temp_config(&dir);

    let output = ModuleGenerator::new(config.clone()).generate().unwrap();
    let writer = FileWriter::new(false);
    let result = writer.write(&config.output_path(), &output.content).unwrap();
    assert!(result.was_written());

    let written = fs::read_to_string(config.output_path()).unwrap();
    let regenerated = ModuleGenerator::new(config.clone()).generate().unwrap();
    assert_eq!(written.trim(), regenerated.content.trim());

    let again = writer
        .write(&config.output_path(), &regenerated.content)
        .unwrap();
    assert!(matches!(again, WriteResult::Unchanged { .. }));
}

#[test]
fn test_generated_module_goes_stale_after_edit() {
    let dir = create_temp_project(&[("types.ts", SIMPLE_TYPES)]);
    let config = temp_config(&dir);
    let before = ModuleGenerator::new(config.clone()).generate().unwrap();

    fs::write(
        dir.path().join("types.ts"),
        SIMPLE_TYPES.replace("body?: string;", "body?: string;\n  pinned: boolean;"),
    )
    .unwrap();

    let after = ModuleGenerator::new(config).generate().unwrap();
    assert_ne!(before.content, after.content);
    assert!(after.content.contains("pinned: z.boolean()"));
}

#[test]
fn test_generate_without_exports_fails() {
    let dir = create_temp_project(&[("types.ts", "type Internal = { a: string };\n")]);
    let err = ModuleGenerator::new(temp_config(&dir))
        .generate()
        .unwrap_err();
    assert!(matches!(err, CliError::Compile(_)));
    assert_eq!(err.exit_code(), 1);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_config_file_changes_mandatory_fields() {
    let dir = create_temp_project(&[
        (
            "types.ts",
            "export type Author = { name: string; bio?: string };\n",
        ),
        (
            CONFIG_FILENAME,
            r#"
[[compiler.mandatory_fields]]
name = "name"
message = "Name is required"
"#,
        ),
    ]);

    let config = ConfigManager::load(Some(&dir.path().join(CONFIG_FILENAME))).unwrap();
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            input: Some(dir.path().join("types.ts")),
            ..Default::default()
        },
    );

    let artifacts = ModuleGenerator::new(config).compile().unwrap();
    let result = artifacts.validate("author", &json!({ "name": "" })).unwrap();
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].field, "name");
    assert_eq!(result.errors()[0].message, "Name is required");

    // title and category are no longer forced
    assert!(artifacts
        .validate("author", &json!({ "name": "Ada" }))
        .unwrap()
        .is_valid());
}

#[test]
fn test_init_content_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(&path, ConfigManager::default_config_content()).unwrap();

    let config = ConfigManager::load(Some(&path)).unwrap();
    assert_eq!(config.source.file, PathBuf::from("types.ts"));
    assert_eq!(config.data.dir, PathBuf::from("database"));
    assert_eq!(config.compiler.mandatory_fields.len(), 2);
}

// =============================================================================
// Data Check Tests
// =============================================================================

#[test]
fn test_check_fixture_database() {
    let config = fixture_config();
    let artifacts = ModuleGenerator::new(config.clone()).compile().unwrap();
    let reports = DataChecker::new(&artifacts, &config.data.dir)
        .check_all()
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].type_name, "product");
    assert!(matches!(reports[0].outcome, FileOutcome::Valid { count: 2 }));
    assert_eq!(reports[1].type_name, "review");
    assert!(matches!(reports[1].outcome, FileOutcome::Missing));
}

#[test]
fn test_check_reports_invalid_items() {
    let dir = create_temp_project(&[
        ("types.ts", SIMPLE_TYPES),
        (
            "database/note.json",
            r#"[
  { "id": 1, "author": "ann", "title": "First", "category": "misc" },
  { "author": "bob", "category": "misc", "color": "red" }
]"#,
        ),
    ]);
    let config = temp_config(&dir);
    let artifacts = ModuleGenerator::new(config.clone()).compile().unwrap();
    let report = DataChecker::new(&artifacts, &config.data.dir)
        .check_type("note")
        .unwrap();
    assert!(report.is_failure());

    let FileOutcome::Invalid { count, items } = report.outcome else {
        panic!("expected invalid outcome");
    };
    assert_eq!(count, 2);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].index, 1);
    assert_eq!(items[0].id, None);

    let grouped = group_by_field(&items[0].errors);
    let fields: Vec<&str> = grouped.iter().map(|(field, _)| field.as_str()).collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"General"));
}

#[test]
fn test_check_rejects_non_array_file() {
    let dir = create_temp_project(&[
        ("types.ts", SIMPLE_TYPES),
        ("database/note.json", r#"{ "title": "not a list" }"#),
    ]);
    let config = temp_config(&dir);
    let artifacts = ModuleGenerator::new(config.clone()).compile().unwrap();
    let report = DataChecker::new(&artifacts, &config.data.dir)
        .check_type("note")
        .unwrap();
    assert!(matches!(report.outcome, FileOutcome::NotAnArray));
}

// =============================================================================
// Payload Tests
// =============================================================================

#[test]
fn test_payload_against_fixture_types() {
    let artifacts = ModuleGenerator::new(fixture_config()).compile().unwrap();

    let result = artifacts
        .validate(
            "review",
            &json!({ "title": "Great", "category": "phones", "product": 1, "stars": 6 }),
        )
        .unwrap();
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].field, "stars");

    let result = artifacts
        .validate(
            "product",
            &json!({
                "sku": "X",
                "title": "Fan",
                "category": "cooling",
                "price": 20,
                "cooling": "gas",
                "tags": []
            }),
        )
        .unwrap();
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].field, "cooling");
}

#[test]
fn test_update_rejects_readonly_fixture_field() {
    let artifacts = ModuleGenerator::new(fixture_config()).compile().unwrap();
    let guard = UpdateGuard::new(&artifacts);
    let existing = json!({
        "id": 1,
        "sku": "PH-001",
        "title": "Phone A",
        "category": "phones",
        "price": 499,
        "tags": []
    });

    let rejection = guard
        .check("product", &existing, &json!({ "sku": "PH-002" }))
        .unwrap_err();
    assert_eq!(
        rejection.to_string(),
        "The following properties are readonly and cannot be updated: sku"
    );

    let merged = guard
        .check("product", &existing, &json!({ "id": 9, "price": 450 }))
        .unwrap();
    assert_eq!(merged["price"], json!(450));
    assert_eq!(merged["id"], json!(1));

    assert!(matches!(
        guard.check("product", &existing, &json!({ "price": "free" })),
        Err(UpdateRejection::Invalid { .. })
    ));
}
