//! Batch repository trait.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::batches_model::{Batch, BatchFreeze, BatchSet, NewBatch, NewBatchSet};
use crate::errors::Result;

#[async_trait]
pub trait BatchRepositoryTrait: Send + Sync {
    async fn create_set(&self, new_set: NewBatchSet) -> Result<BatchSet>;

    async fn create(&self, new_batch: NewBatch) -> Result<Batch>;

    fn get_set_by_id(&self, set_id: i64) -> Result<BatchSet>;

    fn get_by_id(&self, batch_id: i64) -> Result<Batch>;

    fn list_for_set(&self, set_id: i64) -> Result<Vec<Batch>>;

    /// Most recent frozen set for the part (`updated_at` descending).
    fn latest_frozen_set_for_part(&self, part_id: i64) -> Result<Option<BatchSet>>;

    /// First active batch within a set.
    fn first_batch_in_set(&self, set_id: i64) -> Result<Option<Batch>>;

    /// Active batches of the part that belong to frozen sets, ordered by
    /// quantity ascending. Used by best-batch matching.
    fn list_frozen_for_part(&self, part_id: i64) -> Result<Vec<Batch>>;

    /// Persists a set freeze atomically: marks the set frozen and writes the
    /// per-batch snapshot plus frozen price columns.
    async fn apply_freeze(
        &self,
        set_id: i64,
        frozen_at: NaiveDateTime,
        frozen_by: Option<String>,
        batches: Vec<BatchFreeze>,
    ) -> Result<()>;

    /// Soft-deletes the set and cascades to its batches.
    async fn soft_delete_set(&self, set_id: i64, deleted_by: Option<String>) -> Result<()>;
}
