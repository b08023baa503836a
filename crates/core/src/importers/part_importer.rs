//! Part importer from the `SLItems` IDO.

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::kernel::{
    self, EntityImporter, FieldMapping, ImportCounters, ImporterConfig, MappedRow,
};
use crate::errors::Result;
use crate::numbering::{NumberClass, NumberingService};
use crate::parts::{NewPart, PartImportUpdate, PartRepositoryTrait, PartStatus};
use gestima_infor::RawRow;

/// External status label → internal part status.
fn status_from_label(label: &str) -> Option<PartStatus> {
    match label {
        "Nabídka" => Some(PartStatus::Quote),
        "Aktivní" => Some(PartStatus::Active),
        _ => None,
    }
}

#[derive(Default)]
struct StagedParts {
    creates: Vec<NewPart>,
    updates: Vec<PartImportUpdate>,
}

/// Importer for parts: auto-allocates the internal part number, translates
/// the external status label, and on update only overwrites fields the ERP
/// actually filled - user-entered data is preserved.
pub struct PartImporter {
    config: ImporterConfig,
    parts: Arc<dyn PartRepositoryTrait>,
    numbering: Arc<NumberingService>,
    created_by: Option<String>,
    staged: Mutex<StagedParts>,
}

impl PartImporter {
    pub fn new(
        parts: Arc<dyn PartRepositoryTrait>,
        numbering: Arc<NumberingService>,
        created_by: Option<&str>,
    ) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "Part",
                ido_name: "SLItems",
                field_mappings: vec![
                    FieldMapping::new("Item", "article_number").required(),
                    FieldMapping::new("Description", "name"),
                    FieldMapping::new("DrawingNbr", "drawing_number"),
                    FieldMapping::new("Revision", "customer_revision"),
                    FieldMapping::new("RybTridaNazev1", "infor_status"),
                ],
                duplicate_check_field: "article_number",
            },
            parts,
            numbering,
            created_by: created_by.map(str::to_string),
            staged: Mutex::new(StagedParts::default()),
        }
    }
}

#[async_trait]
impl EntityImporter for PartImporter {
    fn config(&self) -> &ImporterConfig {
        &self.config
    }

    async fn map_row_custom(&self, _raw: &RawRow, basic: &MappedRow) -> Result<MappedRow> {
        let mut custom = MappedRow::new();

        // External status label → internal status; unknown labels default to
        // "quote".
        let status = kernel::row_str(basic, "infor_status")
            .as_deref()
            .and_then(status_from_label)
            .unwrap_or(PartStatus::Quote);
        custom.insert("status".to_string(), Value::from(status.as_str()));

        // Working field only, not part of the entity.
        custom.insert("infor_status".to_string(), Value::Null);

        Ok(custom)
    }

    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>> {
        let Some(article_number) = kernel::row_str(mapped, "article_number") else {
            return Ok(None);
        };
        Ok(self
            .parts
            .get_by_article_number(&article_number)?
            .map(|part| part.id))
    }

    async fn stage_create(&self, mapped: &MappedRow) -> Result<()> {
        let part_number = self.numbering.generate(NumberClass::Part)?;

        let part = NewPart {
            part_number: part_number.clone(),
            article_number: kernel::row_str(mapped, "article_number"),
            name: kernel::row_str(mapped, "name"),
            drawing_number: kernel::row_str(mapped, "drawing_number"),
            revision: Some("A".to_string()),
            customer_revision: kernel::row_str(mapped, "customer_revision"),
            status: kernel::row_str(mapped, "status")
                .as_deref()
                .map(PartStatus::parse)
                .unwrap_or_default(),
            source: Some("infor_import".to_string()),
            length: 0.0,
            created_by: self.created_by.clone(),
            ..NewPart::default()
        };

        info!(
            "Staged Part {part_number} (article_number={:?})",
            part.article_number
        );
        self.staged.lock().unwrap().creates.push(part);
        Ok(())
    }

    async fn stage_update(&self, existing_id: i64, mapped: &MappedRow) -> Result<()> {
        // Only non-empty external values are applied; `part_number` is
        // immutable.
        self.staged.lock().unwrap().updates.push(PartImportUpdate {
            id: existing_id,
            name: kernel::row_str(mapped, "name"),
            drawing_number: kernel::row_str(mapped, "drawing_number"),
            customer_revision: kernel::row_str(mapped, "customer_revision"),
            status: kernel::row_str(mapped, "status")
                .as_deref()
                .map(PartStatus::parse),
            updated_by: self.created_by.clone(),
        });
        Ok(())
    }

    async fn commit_staged(&self) -> Result<ImportCounters> {
        let staged = {
            let mut guard = self.staged.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        let (created, updated) = self
            .parts
            .apply_import(staged.creates, staged.updates)
            .await?;
        Ok(ImportCounters { created, updated })
    }
}
