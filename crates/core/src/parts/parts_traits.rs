//! Part repository trait.

use async_trait::async_trait;

use super::parts_model::{NewPart, Part, PartImportUpdate, PartUpdate};
use crate::errors::Result;

/// Persistence contract for parts. All lookups exclude tombstoned rows
/// unless noted otherwise.
#[async_trait]
pub trait PartRepositoryTrait: Send + Sync {
    async fn create(&self, new_part: NewPart) -> Result<Part>;

    /// Fails with `VersionConflict` when the expected version is stale.
    async fn update(&self, update: PartUpdate) -> Result<Part>;

    async fn soft_delete(&self, id: i64, deleted_by: Option<String>) -> Result<()>;

    fn get_by_id(&self, id: i64) -> Result<Part>;

    fn get_by_article_number(&self, article_number: &str) -> Result<Option<Part>>;

    fn list_active(&self) -> Result<Vec<Part>>;

    /// Batch lookup for the sync dispatchers: active parts whose
    /// `article_number` is in the given set.
    fn list_by_article_numbers(&self, article_numbers: &[String]) -> Result<Vec<Part>>;

    /// Sets the primary drawing denormalization (`Part.file_id`).
    async fn set_primary_file(
        &self,
        part_id: i64,
        file_id: i64,
        updated_by: Option<String>,
    ) -> Result<()>;

    /// Applies one importer run in a single transaction: inserts `creates`,
    /// applies `updates` (non-empty-field semantics are resolved by the
    /// caller). Returns `(created, updated)` counts.
    async fn apply_import(
        &self,
        creates: Vec<NewPart>,
        updates: Vec<PartImportUpdate>,
    ) -> Result<(usize, usize)>;
}
