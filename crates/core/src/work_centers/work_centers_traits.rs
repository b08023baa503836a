//! Work center repository trait.

use async_trait::async_trait;

use super::work_centers_model::{NewWorkCenter, WorkCenter};
use crate::errors::Result;

#[async_trait]
pub trait WorkCenterRepositoryTrait: Send + Sync {
    async fn create(&self, new_work_center: NewWorkCenter) -> Result<WorkCenter>;

    fn get_by_id(&self, id: i64) -> Result<WorkCenter>;

    /// Resolves a single work-center number to its id among active rows.
    fn id_by_number(&self, work_center_number: &str) -> Result<Option<i64>>;

    /// Batched variant of [`id_by_number`](Self::id_by_number) used for cache
    /// warmup: returns `(work_center_number, id)` pairs for active rows.
    fn ids_by_numbers(&self, work_center_numbers: &[String]) -> Result<Vec<(String, i64)>>;

    fn list_active(&self) -> Result<Vec<WorkCenter>>;
}
