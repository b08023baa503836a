use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::kernel::*;
use crate::errors::Result;
use gestima_infor::RawRow;

/// Minimal importer over an in-memory key→name store.
struct WidgetImporter {
    config: ImporterConfig,
    store: Mutex<HashMap<String, String>>,
    staged: Mutex<Vec<(Option<i64>, MappedRow)>>,
    fail_code: Option<String>,
}

impl WidgetImporter {
    fn new(existing: &[(&str, &str)]) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "Widget",
                ido_name: "SLWidgets",
                field_mappings: vec![
                    FieldMapping::new("Code", "code").required(),
                    FieldMapping::new("Name", "name").with_fallbacks(&["AltName"]),
                    FieldMapping::new("Weight", "weight").with_transform(to_f64),
                ],
                duplicate_check_field: "code",
            },
            store: Mutex::new(
                existing
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            staged: Mutex::new(Vec::new()),
            fail_code: None,
        }
    }

    fn with_failing_code(mut self, code: &str) -> Self {
        self.fail_code = Some(code.to_string());
        self
    }
}

#[async_trait]
impl EntityImporter for WidgetImporter {
    fn config(&self) -> &ImporterConfig {
        &self.config
    }

    async fn map_row_custom(&self, raw: &RawRow, _basic: &MappedRow) -> Result<MappedRow> {
        let mut custom = MappedRow::new();
        // Rows flagged obsolete upstream are dropped entirely.
        if raw.get("Obsolete").and_then(Value::as_bool).unwrap_or(false) {
            custom.insert(SKIP_KEY.to_string(), Value::Bool(true));
        }
        Ok(custom)
    }

    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>> {
        let Some(code) = row_str(mapped, "code") else {
            return Ok(None);
        };
        Ok(self.store.lock().unwrap().contains_key(&code).then_some(1))
    }

    async fn stage_create(&self, mapped: &MappedRow) -> Result<()> {
        if let (Some(fail), Some(code)) = (&self.fail_code, row_str(mapped, "code")) {
            if *fail == code {
                return Err(crate::errors::Error::Unexpected(format!(
                    "boom on {code}"
                )));
            }
        }
        self.staged.lock().unwrap().push((None, mapped.clone()));
        Ok(())
    }

    async fn stage_update(&self, existing_id: i64, mapped: &MappedRow) -> Result<()> {
        self.staged
            .lock()
            .unwrap()
            .push((Some(existing_id), mapped.clone()));
        Ok(())
    }

    async fn commit_staged(&self) -> Result<ImportCounters> {
        let staged: Vec<(Option<i64>, MappedRow)> =
            std::mem::take(&mut *self.staged.lock().unwrap());
        let mut counters = ImportCounters::default();
        let mut store = self.store.lock().unwrap();
        for (existing, mapped) in staged {
            let code = row_str(&mapped, "code").unwrap_or_default();
            let name = row_str(&mapped, "name").unwrap_or_default();
            let previous = store.insert(code, name);
            if existing.is_some() {
                counters.updated += 1;
            } else if previous.is_none() {
                counters.created += 1;
            }
        }
        Ok(counters)
    }
}

fn raw(code: &str, name: Option<&str>) -> RawRow {
    let mut row = json!({ "Code": code }).as_object().unwrap().clone();
    if let Some(name) = name {
        row.insert("Name".to_string(), Value::from(name));
    }
    row
}

#[test]
fn test_basic_mapping_with_fallback_and_transform() {
    let importer = WidgetImporter::new(&[]);

    let row = json!({
        "Code": "W1",
        "AltName": "fallback name",
        "Weight": "12.5",
    })
    .as_object()
    .unwrap()
    .clone();

    let mapped = apply_basic_mapping(importer.config(), &row);
    assert_eq!(row_str(&mapped, "code").as_deref(), Some("W1"));
    // Primary source empty → fallback source used.
    assert_eq!(row_str(&mapped, "name").as_deref(), Some("fallback name"));
    assert_eq!(row_f64(&mapped, "weight"), Some(12.5));
}

#[test]
fn test_transform_failure_yields_null() {
    let importer = WidgetImporter::new(&[]);
    let row = json!({ "Code": "W1", "Weight": "not-a-number" })
        .as_object()
        .unwrap()
        .clone();

    let mapped = apply_basic_mapping(importer.config(), &row);
    // The row survives, the bad value becomes null.
    assert_eq!(mapped.get("weight"), Some(&Value::Null));
    assert_eq!(row_str(&mapped, "code").as_deref(), Some("W1"));
}

#[tokio::test]
async fn test_preview_counts() {
    let importer = WidgetImporter::new(&[("W2", "existing")]);
    let rows = vec![
        raw("W1", Some("new widget")),
        raw("W2", Some("duplicate widget")),
        raw("", None), // missing required code
    ];

    let preview = preview_import(&importer, &rows).await.unwrap();
    assert_eq!(preview.valid_count, 2);
    assert_eq!(preview.error_count, 1);
    assert_eq!(preview.duplicate_count, 1);

    let invalid = &preview.rows[2];
    assert!(!invalid.validation.is_valid);
    assert!(invalid.validation.needs_manual_input["code"]);
}

#[tokio::test]
async fn test_execute_skip_and_update_actions() {
    let importer = WidgetImporter::new(&[("W2", "old name")]);

    // Duplicate with default (skip) action.
    let mapped_skip = {
        let preview = preview_import(&importer, &[raw("W2", Some("renamed"))])
            .await
            .unwrap();
        preview.rows.into_iter().next().unwrap().mapped
    };
    let summary = execute_import(&importer, vec![mapped_skip.clone()])
        .await
        .unwrap();
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.created_count, 0);
    assert_eq!(summary.updated_count, 0);

    // Same row with update action.
    let mut mapped_update = mapped_skip;
    mapped_update.insert(DUPLICATE_ACTION_KEY.to_string(), Value::from("update"));
    let summary = execute_import(&importer, vec![mapped_update]).await.unwrap();
    assert_eq!(summary.updated_count, 1);
    assert_eq!(
        importer.store.lock().unwrap().get("W2").map(String::as_str),
        Some("renamed")
    );
}

#[tokio::test]
async fn test_execute_skips_sentinel_rows() {
    let importer = WidgetImporter::new(&[]);

    let mut mapped = apply_basic_mapping(importer.config(), &raw("W9", Some("x")));
    mapped.insert(SKIP_KEY.to_string(), Value::Bool(true));

    let summary = execute_import(&importer, vec![mapped]).await.unwrap();
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.created_count, 0);
}

#[tokio::test]
async fn test_row_error_does_not_abort_batch() {
    let importer = WidgetImporter::new(&[]).with_failing_code("BAD");

    let rows = vec![
        apply_basic_mapping(importer.config(), &raw("GOOD1", Some("a"))),
        apply_basic_mapping(importer.config(), &raw("BAD", Some("b"))),
        apply_basic_mapping(importer.config(), &raw("GOOD2", Some("c"))),
    ];

    let summary = execute_import(&importer, rows).await.unwrap();
    assert_eq!(summary.created_count, 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(!summary.success);
    assert!(summary.errors[0].contains("BAD"));
}

#[tokio::test]
async fn test_rerun_with_update_action_is_idempotent() {
    let importer = WidgetImporter::new(&[]);
    let rows = vec![raw("W1", Some("one")), raw("W2", Some("two"))];

    let prepare = |preview: ImportPreview| -> Vec<MappedRow> {
        preview
            .rows
            .into_iter()
            .map(|row| {
                let mut mapped = row.mapped;
                mapped.insert(DUPLICATE_ACTION_KEY.to_string(), Value::from("update"));
                mapped
            })
            .collect()
    };

    let first = prepare(preview_import(&importer, &rows).await.unwrap());
    let summary = execute_import(&importer, first).await.unwrap();
    assert_eq!(summary.created_count, 2);
    assert_eq!(summary.updated_count, 0);

    // Second run on unchanged source data: nothing created, only rewrites.
    let second = prepare(preview_import(&importer, &rows).await.unwrap());
    let summary = execute_import(&importer, second).await.unwrap();
    assert_eq!(summary.created_count, 0);
    assert_eq!(summary.updated_count, 2);
    assert_eq!(importer.store.lock().unwrap().len(), 2);
}
