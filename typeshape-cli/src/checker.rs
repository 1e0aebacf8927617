//! Data file checker.
//!
//! A resource server keeps one `<type>.json` file per exported type, each
//! holding a JSON array. Every element must pass the type's validator
//! before the server may start; this module runs the same check offline.

use crate::error::{CliResult, DataError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use typeshape::{CompiledArtifacts, FieldError, ValidationResult};

/// Label for errors that belong to the whole document.
pub const GENERAL_FIELD: &str = "General";

/// One element that failed validation.
#[derive(Debug, Clone)]
pub struct InvalidItem {
    /// Zero-based position in the array
    pub index: usize,
    /// The element's `id`, when it has one
    pub id: Option<Value>,
    pub errors: Vec<FieldError>,
}

impl InvalidItem {
    /// `Item #<n> (id: <id>)`, numbered from one.
    pub fn label(&self) -> String {
        let id = self
            .id
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        format!("Item #{} (id: {})", self.index + 1, id)
    }
}

/// Outcome for one data file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// No data file exists for the type.
    Missing,
    /// Every element is valid.
    Valid { count: usize },
    /// Some elements failed validation.
    Invalid {
        count: usize,
        items: Vec<InvalidItem>,
    },
    /// The file does not hold a JSON array.
    NotAnArray,
}

/// Result of checking one type's data file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Registry key of the type
    pub type_name: String,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            FileOutcome::Invalid { .. } | FileOutcome::NotAnArray
        )
    }
}

/// Checks a data directory against compiled validators.
pub struct DataChecker<'a> {
    artifacts: &'a CompiledArtifacts,
    data_dir: PathBuf,
}

impl<'a> DataChecker<'a> {
    pub fn new(artifacts: &'a CompiledArtifacts, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts,
            data_dir: data_dir.into(),
        }
    }

    /// Check the data file of every exported type, in declaration order.
    pub fn check_all(&self) -> CliResult<Vec<FileReport>> {
        self.artifacts
            .validators
            .names()
            .map(|name| self.check_type(name))
            .collect()
    }

    /// Check the data file of one exported type.
    pub fn check_type(&self, type_name: &str) -> CliResult<FileReport> {
        let path = self.data_dir.join(format!("{}.json", type_name));
        let outcome = if path.exists() {
            let document = read_json(&path)?;
            self.check_document(type_name, &document)?
        } else {
            FileOutcome::Missing
        };
        debug!(type_name, path = %path.display(), ?outcome, "Checked data file");
        Ok(FileReport {
            type_name: type_name.to_string(),
            path,
            outcome,
        })
    }

    /// Check an already parsed document.
    pub fn check_document(&self, type_name: &str, document: &Value) -> CliResult<FileOutcome> {
        let Value::Array(elements) = document else {
            return Ok(FileOutcome::NotAnArray);
        };

        let mut items = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            if let ValidationResult::Invalid { errors } =
                self.artifacts.validate(type_name, element)?
            {
                items.push(InvalidItem {
                    index,
                    id: element.get("id").cloned(),
                    errors,
                });
            }
        }

        let count = elements.len();
        Ok(if items.is_empty() {
            FileOutcome::Valid { count }
        } else {
            FileOutcome::Invalid { count, items }
        })
    }
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> CliResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| DataError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    let value = serde_json::from_str(&content)
        .map_err(|e| DataError::invalid_json(path.to_path_buf(), e.to_string()))?;
    Ok(value)
}

/// Group messages per field, in first-seen order. Errors on the whole
/// document are reported under [`GENERAL_FIELD`].
pub fn group_by_field(errors: &[FieldError]) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for error in errors {
        let field = if error.field.is_empty() {
            GENERAL_FIELD
        } else {
            error.field.as_str()
        };
        match grouped.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(error.message.clone()),
            None => grouped.push((field.to_string(), vec![error.message.clone()])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;
    use typeshape::compile;

    fn artifacts() -> CompiledArtifacts {
        compile(
            r#"
            export type Product = { title: string; category: string; price: number };
            export type Review = { title: string; category: string; stars: 1 | 2 | 3 };
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_check_document() {
        let artifacts = artifacts();
        let checker = DataChecker::new(&artifacts, "unused");

        let valid = json!([{"id": 1, "title": "A", "category": "c", "price": 1}]);
        assert!(matches!(
            checker.check_document("product", &valid).unwrap(),
            FileOutcome::Valid { count: 1 }
        ));

        let invalid = json!([
            {"id": 1, "title": "A", "category": "c", "price": 1},
            {"id": 2, "category": "c", "price": "x"}
        ]);
        let FileOutcome::Invalid { count, items } =
            checker.check_document("product", &invalid).unwrap()
        else {
            panic!("expected invalid");
        };
        assert_eq!(count, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index, 1);
        assert_eq!(items[0].id, Some(json!(2)));
        assert_eq!(items[0].errors.len(), 2);

        assert!(matches!(
            checker.check_document("product", &json!({"a": 1})).unwrap(),
            FileOutcome::NotAnArray
        ));
    }

    #[test]
    fn test_invalid_item_label_counts_from_one() {
        let first = InvalidItem {
            index: 0,
            id: Some(json!(7)),
            errors: Vec::new(),
        };
        assert_eq!(first.label(), "Item #1 (id: 7)");

        let anonymous = InvalidItem {
            index: 2,
            id: None,
            errors: Vec::new(),
        };
        assert_eq!(anonymous.label(), "Item #3 (id: unknown)");
    }

    #[test]
    fn test_check_all_reads_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("product.json"),
            r#"[{"title": "A", "category": "c", "price": 2}]"#,
        )
        .unwrap();

        let artifacts = artifacts();
        let reports = DataChecker::new(&artifacts, dir.path()).check_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0].outcome, FileOutcome::Valid { count: 1 }));
        assert!(matches!(reports[1].outcome, FileOutcome::Missing));
        assert!(!reports.iter().any(FileReport::is_failure));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("product.json"), "[{").unwrap();
        let artifacts = artifacts();
        assert!(DataChecker::new(&artifacts, dir.path())
            .check_type("product")
            .is_err());
    }

    #[test]
    fn test_group_by_field_uses_general_label() {
        let errors = vec![
            FieldError::custom("", "Unrecognized key(s) in object: 'x'"),
            FieldError::custom("price", "Expected number, received string"),
            FieldError::custom("price", "second"),
        ];
        assert_eq!(
            group_by_field(&errors),
            vec![
                (
                    "General".to_string(),
                    vec!["Unrecognized key(s) in object: 'x'".to_string()]
                ),
                (
                    "price".to_string(),
                    vec![
                        "Expected number, received string".to_string(),
                        "second".to_string()
                    ]
                ),
            ]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Grouping never loses or duplicates a message.
        #[test]
        fn prop_grouping_keeps_every_message(
            pairs in proptest::collection::vec(("[a-c]{0,1}", "[a-z]{1,5}"), 0..20)
        ) {
            let errors: Vec<FieldError> = pairs
                .iter()
                .map(|(field, message)| FieldError::custom(field.clone(), message.clone()))
                .collect();
            let grouped = group_by_field(&errors);
            let total: usize = grouped.iter().map(|(_, messages)| messages.len()).sum();
            prop_assert_eq!(total, errors.len());

            let mut names: Vec<&String> = grouped.iter().map(|(name, _)| name).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), grouped.len());
        }
    }
}
