//! Operation repository trait.

use async_trait::async_trait;

use super::operations_model::{NewOperation, Operation, OperationImportUpdate};
use crate::errors::Result;

#[async_trait]
pub trait OperationRepositoryTrait: Send + Sync {
    fn get_by_id(&self, id: i64) -> Result<Operation>;

    /// Duplicate-detection key of the routing importer.
    fn find_by_part_and_seq(&self, part_id: i64, seq: i32) -> Result<Option<Operation>>;

    fn list_for_part(&self, part_id: i64) -> Result<Vec<Operation>>;

    /// `(part_id, seq) -> operation id` pairs for a set of parts; used to
    /// pre-load the material-input linking cache in one query.
    fn seq_index_for_parts(&self, part_ids: &[i64]) -> Result<Vec<(i64, i32, i64)>>;

    /// Applies one importer run in a single transaction.
    /// Returns `(created, updated)` counts.
    async fn apply_import(
        &self,
        creates: Vec<NewOperation>,
        updates: Vec<OperationImportUpdate>,
    ) -> Result<(usize, usize)>;
}
