//! Material repository trait.

use async_trait::async_trait;

use super::materials_model::{
    MaterialInput, MaterialInputUpsert, MaterialItem, MaterialItemImportUpdate, NewMaterialItem,
};
use crate::errors::Result;

#[async_trait]
pub trait MaterialRepositoryTrait: Send + Sync {
    fn get_item_by_code(&self, code: &str) -> Result<Option<MaterialItem>>;

    /// Batch lookup keyed by external item code.
    fn list_items_by_codes(&self, codes: &[String]) -> Result<Vec<MaterialItem>>;

    /// Applies one material-item importer run in a single transaction.
    /// Returns `(created, updated)` counts.
    async fn apply_item_import(
        &self,
        creates: Vec<NewMaterialItem>,
        updates: Vec<MaterialItemImportUpdate>,
    ) -> Result<(usize, usize)>;

    fn list_inputs_for_part(&self, part_id: i64) -> Result<Vec<MaterialInput>>;

    /// Upserts the material inputs of one part (keyed by material item) and
    /// maintains the material-operation link rows, in a single transaction
    /// per part group. Returns `(created, updated)` counts.
    async fn upsert_inputs_for_part(
        &self,
        part_id: i64,
        rows: Vec<MaterialInputUpsert>,
    ) -> Result<(usize, usize)>;
}
