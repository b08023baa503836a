//! Material-item importer from the `SLItems` IDO (material family).

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::kernel::{
    self, EntityImporter, FieldMapping, ImportCounters, ImporterConfig, MappedRow,
};
use crate::errors::Result;
use crate::materials::{MaterialItemImportUpdate, MaterialRepositoryTrait, NewMaterialItem};
use crate::numbering::{NumberClass, NumberingService};
use gestima_infor::RawRow;

#[derive(Default)]
struct StagedItems {
    creates: Vec<NewMaterialItem>,
    updates: Vec<MaterialItemImportUpdate>,
}

/// Importer for material master data. The ERP is the source of truth for the
/// item code and description; shape and dimensions stay operator-maintained.
pub struct MaterialItemImporter {
    config: ImporterConfig,
    materials: Arc<dyn MaterialRepositoryTrait>,
    numbering: Arc<NumberingService>,
    created_by: Option<String>,
    staged: Mutex<StagedItems>,
}

impl MaterialItemImporter {
    pub fn new(
        materials: Arc<dyn MaterialRepositoryTrait>,
        numbering: Arc<NumberingService>,
        created_by: Option<&str>,
    ) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "MaterialItem",
                ido_name: "SLItems",
                field_mappings: vec![
                    FieldMapping::new("Item", "code").required(),
                    FieldMapping::new("Description", "name"),
                ],
                duplicate_check_field: "code",
            },
            materials,
            numbering,
            created_by: created_by.map(str::to_string),
            staged: Mutex::new(StagedItems::default()),
        }
    }
}

#[async_trait]
impl EntityImporter for MaterialItemImporter {
    fn config(&self) -> &ImporterConfig {
        &self.config
    }

    async fn map_row_custom(&self, _raw: &RawRow, _basic: &MappedRow) -> Result<MappedRow> {
        Ok(MappedRow::new())
    }

    async fn check_duplicate(&self, mapped: &MappedRow) -> Result<Option<i64>> {
        let Some(code) = kernel::row_str(mapped, "code") else {
            return Ok(None);
        };
        Ok(self.materials.get_item_by_code(&code)?.map(|item| item.id))
    }

    async fn stage_create(&self, mapped: &MappedRow) -> Result<()> {
        let material_number = self.numbering.generate(NumberClass::Material)?;
        self.staged.lock().unwrap().creates.push(NewMaterialItem {
            material_number,
            code: kernel::row_str(mapped, "code").unwrap_or_default(),
            name: kernel::row_str(mapped, "name"),
            created_by: self.created_by.clone(),
            ..NewMaterialItem::default()
        });
        Ok(())
    }

    async fn stage_update(&self, existing_id: i64, mapped: &MappedRow) -> Result<()> {
        self.staged
            .lock()
            .unwrap()
            .updates
            .push(MaterialItemImportUpdate {
                id: existing_id,
                name: kernel::row_str(mapped, "name"),
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
            .materials
            .apply_item_import(staged.creates, staged.updates)
            .await?;
        Ok(ImportCounters { created, updated })
    }
}
