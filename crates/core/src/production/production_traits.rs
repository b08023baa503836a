//! Production record repository trait.

use async_trait::async_trait;

use super::production_model::{NewProductionRecord, ProductionRecord, ProductionRecordUpdate};
use crate::errors::Result;

#[async_trait]
pub trait ProductionRepositoryTrait: Send + Sync {
    /// Duplicate-detection key of the production importer.
    fn find_duplicate(
        &self,
        part_id: i64,
        infor_order_number: &str,
        operation_seq: i32,
    ) -> Result<Option<ProductionRecord>>;

    fn list_for_part(&self, part_id: i64) -> Result<Vec<ProductionRecord>>;

    /// Applies one importer run in a single transaction.
    /// Returns `(created, updated)` counts.
    async fn apply_import(
        &self,
        creates: Vec<NewProductionRecord>,
        updates: Vec<ProductionRecordUpdate>,
    ) -> Result<(usize, usize)>;
}
