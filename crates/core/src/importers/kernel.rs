//! Generic import pipeline: map → validate → detect duplicate → create/update.
//!
//! Each concrete importer supplies a declarative [`ImporterConfig`] plus a
//! small set of hooks; the kernel owns the algorithm. Rows travel as JSON
//! maps end to end - the same shape the IDO client produces - so importers
//! can stash working fields and strip them again during custom mapping.
//!
//! Persistence happens in two phases: per-row `stage_*` hooks buffer the
//! creates/updates inside the importer, and a single `commit_staged` call
//! hands them to the repository as one batch (one transaction per run).
//! Per-row failures are collected into the run's error list without aborting
//! the batch.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::Result;
use gestima_infor::RawRow;

/// Mapped row: target field → value. Working fields use `_`-prefixed keys.
pub type MappedRow = serde_json::Map<String, Value>;

/// Sentinel key: a mapper sets it to `true` to drop the row entirely
/// (domain-specific exclusions such as obsolete routings).
pub const SKIP_KEY: &str = "_skip";

/// Per-row key carrying the duplicate action ("skip" or "update").
pub const DUPLICATE_ACTION_KEY: &str = "duplicate_action";

/// What to do when a row matches an existing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    #[default]
    Skip,
    Update,
}

impl DuplicateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateAction::Skip => "skip",
            DuplicateAction::Update => "update",
        }
    }

    pub fn from_row(row: &MappedRow) -> Self {
        match row.get(DUPLICATE_ACTION_KEY).and_then(Value::as_str) {
            Some("update") => DuplicateAction::Update,
            _ => DuplicateAction::Skip,
        }
    }
}

/// Fallible value transform applied during basic mapping.
pub type Transform = fn(&Value) -> std::result::Result<Value, String>;

/// One source-field → target-field mapping.
pub struct FieldMapping {
    pub source_field: &'static str,
    pub target_field: &'static str,
    pub required: bool,
    pub transform: Option<Transform>,
    /// Alternate source fields tried when the primary value is empty.
    pub fallback_fields: &'static [&'static str],
}

impl FieldMapping {
    pub fn new(source_field: &'static str, target_field: &'static str) -> Self {
        Self {
            source_field,
            target_field,
            required: false,
            transform: None,
            fallback_fields: &[],
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_fallbacks(mut self, fallback_fields: &'static [&'static str]) -> Self {
        self.fallback_fields = fallback_fields;
        self
    }
}

/// Declarative configuration of a concrete importer.
pub struct ImporterConfig {
    pub entity_name: &'static str,
    pub ido_name: &'static str,
    pub field_mappings: Vec<FieldMapping>,
    /// Column used for duplicate detection (reported in messages).
    pub duplicate_check_field: &'static str,
}

/// Validation outcome for a single row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub is_duplicate: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Field name → true when the operator must fill the value by hand.
    pub needs_manual_input: HashMap<String, bool>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub row_index: usize,
    pub raw: RawRow,
    pub mapped: MappedRow,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub entity_name: String,
    pub valid_count: usize,
    pub error_count: usize,
    pub duplicate_count: usize,
    pub rows: Vec<PreviewRow>,
}

/// Counters returned by `commit_staged`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportCounters {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success: bool,
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<String>,
}

/// Hooks a concrete importer provides to the kernel.
#[async_trait]
pub trait EntityImporter: Send + Sync {
    fn config(&self) -> &ImporterConfig;

    /// Entity-specific enrichment executed after basic mapping. The returned
    /// map is merged over the basic one.
    async fn map_row_custom(&self, raw: &RawRow, basic: &MappedRow) -> Result<MappedRow>;

    /// Returns the id of an existing entity matching the duplicate key.
    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>>;

    /// Buffers a create for the next `commit_staged`.
    async fn stage_create(&self, mapped: &MappedRow) -> Result<()>;

    /// Buffers an update for the next `commit_staged`. Default is a no-op.
    async fn stage_update(&self, _existing_id: i64, _mapped: &MappedRow) -> Result<()> {
        warn!("Update not implemented for {}", self.config().entity_name);
        Ok(())
    }

    /// Flushes everything staged since the last call in one repository
    /// batch. The storage layer runs it as a single transaction; on failure
    /// the whole batch rolls back.
    async fn commit_staged(&self) -> Result<ImportCounters>;
}

/// Walks the field-mapping list: primary source first, then fallbacks;
/// transform applied last. A failed transform logs and yields `null` - it
/// must not abort the row.
pub fn apply_basic_mapping(config: &ImporterConfig, row: &RawRow) -> MappedRow {
    let mut mapped = MappedRow::new();

    for field_map in &config.field_mappings {
        let mut value = row.get(field_map.source_field).cloned();

        if is_empty(&value) && !field_map.fallback_fields.is_empty() {
            for fallback in field_map.fallback_fields {
                let candidate = row.get(*fallback).cloned();
                if !is_empty(&candidate) {
                    debug!(
                        "Used fallback field {fallback} for {}",
                        field_map.target_field
                    );
                    value = candidate;
                    break;
                }
            }
        }

        if let (Some(v), Some(transform)) = (&value, field_map.transform) {
            if !matches!(v, Value::Null) {
                value = match transform(v) {
                    Ok(transformed) => Some(transformed),
                    Err(e) => {
                        error!("Transform failed for {}: {e}", field_map.target_field);
                        None
                    }
                };
            }
        }

        mapped.insert(
            field_map.target_field.to_string(),
            value.unwrap_or(Value::Null),
        );
    }

    mapped
}

fn is_empty(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Basic mapping merged with the importer's custom enrichment.
pub async fn map_row(importer: &dyn EntityImporter, raw: &RawRow) -> Result<MappedRow> {
    let mut mapped = apply_basic_mapping(importer.config(), raw);
    let custom = importer.map_row_custom(raw, &mapped).await?;
    for (key, value) in custom {
        mapped.insert(key, value);
    }
    Ok(mapped)
}

/// Required-field and duplicate checks for one mapped row.
pub async fn validate_mapped_row(
    importer: &dyn EntityImporter,
    mapped: &MappedRow,
) -> Result<ValidationReport> {
    let config = importer.config();
    let mut report = ValidationReport::new();

    for field_map in &config.field_mappings {
        if field_map.required && is_empty(&mapped.get(field_map.target_field).cloned()) {
            report
                .errors
                .push(format!("Missing required field: {}", field_map.target_field));
            report.is_valid = false;
            report
                .needs_manual_input
                .insert(field_map.target_field.to_string(), true);
        }
    }

    if importer.check_duplicate(mapped).await?.is_some() {
        report.is_duplicate = true;
        report.warnings.push(format!(
            "{} with {}='{}' already exists",
            config.entity_name,
            config.duplicate_check_field,
            mapped
                .get(config.duplicate_check_field)
                .map(value_display)
                .unwrap_or_default(),
        ));
    }

    Ok(report)
}

fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Maps and validates every row without touching persistent state.
pub async fn preview_import(
    importer: &dyn EntityImporter,
    rows: &[RawRow],
) -> Result<ImportPreview> {
    let mut preview_rows = Vec::with_capacity(rows.len());
    let mut valid_count = 0;
    let mut error_count = 0;
    let mut duplicate_count = 0;

    for (row_index, raw) in rows.iter().enumerate() {
        let mapped = map_row(importer, raw).await?;
        let validation = validate_mapped_row(importer, &mapped).await?;

        if validation.is_valid {
            valid_count += 1;
        } else {
            error_count += 1;
        }
        if validation.is_duplicate {
            duplicate_count += 1;
        }

        preview_rows.push(PreviewRow {
            row_index,
            raw: raw.clone(),
            mapped,
            validation,
        });
    }

    let config = importer.config();
    info!(
        "Preview complete for {}: {} rows, {valid_count} valid, {error_count} errors, \
         {duplicate_count} duplicates",
        config.entity_name,
        rows.len()
    );

    Ok(ImportPreview {
        entity_name: config.entity_name.to_string(),
        valid_count,
        error_count,
        duplicate_count,
        rows: preview_rows,
    })
}

/// Executes a prepared batch: stages creates/updates per row according to
/// each row's duplicate action, then commits everything in one batch.
///
/// Re-running on unchanged source data with `duplicate_action = update` is
/// idempotent by contract - every concrete `stage_update` rewrites the same
/// values.
pub async fn execute_import(
    importer: &dyn EntityImporter,
    rows: Vec<MappedRow>,
) -> Result<ImportSummary> {
    let config = importer.config();
    let mut skipped: usize = 0;
    let mut errors: Vec<String> = Vec::new();

    for row in &rows {
        if row.get(SKIP_KEY).and_then(Value::as_bool).unwrap_or(false) {
            skipped += 1;
            continue;
        }

        let staged: Result<bool> = async {
            let action = DuplicateAction::from_row(row);
            match importer.check_duplicate(row).await? {
                Some(existing_id) => match action {
                    DuplicateAction::Skip => Ok(false),
                    DuplicateAction::Update => {
                        importer.stage_update(existing_id, row).await?;
                        Ok(true)
                    }
                },
                None => {
                    importer.stage_create(row).await?;
                    Ok(true)
                }
            }
        }
        .await;

        match staged {
            Ok(true) => {}
            Ok(false) => skipped += 1,
            Err(e) => {
                let message = format!("Failed to process row: {e}");
                error!("{message}");
                errors.push(message);
            }
        }
    }

    let counters = importer.commit_staged().await?;

    info!(
        "Import complete for {}: {} created, {} updated, {skipped} skipped, {} errors",
        config.entity_name,
        counters.created,
        counters.updated,
        errors.len()
    );

    Ok(ImportSummary {
        success: errors.is_empty(),
        created_count: counters.created,
        updated_count: counters.updated,
        skipped_count: skipped,
        errors,
    })
}

// === Row value accessors ===

/// Non-empty string value of a mapped/raw field.
pub fn row_str(row: &MappedRow, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub fn row_f64(row: &MappedRow, key: &str) -> Option<f64> {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn row_i64(row: &MappedRow, key: &str) -> Option<i64> {
    row_f64(row, key).map(|f| f as i64)
}

pub fn row_bool(row: &MappedRow, key: &str) -> bool {
    row.get(key).and_then(Value::as_bool).unwrap_or(false)
}

// === Shared transforms for field mappings ===

/// Lenient float parse: accepts JSON numbers and numeric strings.
pub fn to_f64(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(n) => Ok(Value::from(n.as_f64().unwrap_or(0.0))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .map_err(|e| format!("'{s}' is not a number: {e}")),
        other => Err(format!("cannot convert {other} to a number")),
    }
}

/// Integer parse through f64 first - the gateway returns "49.00" for counts.
pub fn to_i64(value: &Value) -> std::result::Result<Value, String> {
    let float = to_f64(value)?;
    Ok(Value::from(float.as_f64().unwrap_or(0.0) as i64))
}
