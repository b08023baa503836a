//! File repository trait.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::files_model::{FileLink, FileLinkRequest, FileRecord, NewFileRecord};
use crate::errors::Result;

#[async_trait]
pub trait FileRepositoryTrait: Send + Sync {
    /// Active record by id; `FileError::NotFound` when missing or tombstoned.
    fn get_by_id(&self, file_id: i64) -> Result<FileRecord>;

    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord>;

    /// Whether any record (active or not) occupies this relative path.
    fn path_exists(&self, file_path: &str) -> Result<bool>;

    /// UPSERT keyed by `(file_id, entity_type, entity_id)` among non-deleted
    /// rows. When `is_primary` is set, atomically clears the flag on every
    /// other active link of the same `(entity_type, entity_id, link_type)`.
    async fn upsert_link(&self, request: FileLinkRequest) -> Result<FileLink>;

    fn find_link(
        &self,
        file_id: i64,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Option<FileLink>>;

    /// Promotes an existing link to primary, clearing the others of the same
    /// `(entity_type, entity_id, link_type)`.
    async fn promote_link(&self, link_id: i64, updated_by: Option<String>) -> Result<()>;

    async fn soft_delete_link(&self, link_id: i64, deleted_by: Option<String>) -> Result<()>;

    async fn soft_delete_record(&self, file_id: i64, deleted_by: Option<String>) -> Result<()>;

    /// Active records linked to the entity, optionally filtered by link type.
    fn files_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: Option<&str>,
    ) -> Result<Vec<FileRecord>>;

    /// First active primary record for the entity and link type.
    fn primary_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: &str,
    ) -> Result<Option<FileRecord>>;

    /// Of the given entity ids, those that already have an active link of
    /// the given type. Used for batched duplicate checks.
    fn entities_with_links(
        &self,
        entity_type: &str,
        link_type: &str,
        entity_ids: &[i64],
    ) -> Result<Vec<i64>>;

    /// Entity ids (of `entity_type`) other than `exclude_entity_id` holding
    /// an active link to a different record with the same content hash.
    fn duplicate_hash_entities(
        &self,
        file_hash: &str,
        exclude_file_id: i64,
        entity_type: &str,
        exclude_entity_id: i64,
    ) -> Result<Vec<i64>>;

    /// Active temp records created before the cutoff.
    fn list_expired_temp(&self, cutoff: NaiveDateTime) -> Result<Vec<FileRecord>>;

    /// Active non-temp records with no active link.
    fn find_orphans(&self) -> Result<Vec<FileRecord>>;
}
