//! Centralized file storage service.
//!
//! "Dumb" blob manager: physical file operations, validation, hashing and
//! link bookkeeping. Business workflows (which drawing is primary for which
//! part, revision policies) belong to the callers.
//!
//! The service is the sole custodian of the `uploads/` tree. Blobs are never
//! removed when a record or link is soft-deleted; only the temp-expiry
//! cleanup removes files from disk.

use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::files_model::{
    FileError, FileLink, FileLinkRequest, FileRecord, FileStatus, NewFileRecord, ServedFile,
};
use super::files_traits::FileRepositoryTrait;
use super::validation;
use crate::errors::Result;

/// Default expiry for temp files.
pub const TEMP_EXPIRY_HOURS: i64 = 24;

/// Parameters for storing a blob from memory.
pub struct StoreBytes<'a> {
    pub content: &'a [u8],
    pub filename: &'a str,
    /// Subdirectory under the uploads root, e.g. `parts/10900635` or `loose`.
    pub directory: &'a str,
    /// Optional allow-list of type tags, e.g. `["pdf"]`.
    pub allowed_types: Option<&'a [&'a str]>,
    pub status: FileStatus,
    pub created_by: Option<&'a str>,
}

pub struct FileService {
    uploads_root: PathBuf,
    repository: Arc<dyn FileRepositoryTrait>,
}

impl FileService {
    pub fn new(uploads_root: impl Into<PathBuf>, repository: Arc<dyn FileRepositoryTrait>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            repository,
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    // === Core operations ===

    /// Stores bytes to disk and registers the record.
    ///
    /// Validation happens before anything touches the disk. If the database
    /// insert fails after the file was written, the on-disk file is deleted
    /// again (compensating action) and the error propagates.
    pub async fn store_from_bytes(&self, request: StoreBytes<'_>) -> Result<FileRecord> {
        let file_type = validation::detect_file_type(request.filename)?;

        if let Some(allowed) = request.allowed_types {
            if !allowed.contains(&file_type) {
                return Err(FileError::UnsupportedType(file_type.to_string()).into());
            }
        }

        validation::validate_magic_bytes(request.content, file_type)?;
        validation::validate_size(request.content.len() as u64, file_type)?;

        let safe_filename = validation::sanitize_filename(request.filename)?;

        let target_dir = self.uploads_root.join(request.directory);
        tokio::fs::create_dir_all(&target_dir).await?;

        // Collision on disk or in the registry gets a random suffix before
        // the extension.
        let mut final_name = safe_filename.clone();
        let mut relative_path = format!("{}/{final_name}", request.directory);
        if target_dir.join(&final_name).exists() || self.repository.path_exists(&relative_path)? {
            let (stem, extension) = match safe_filename.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
                None => (safe_filename.clone(), String::new()),
            };
            let uuid = Uuid::new_v4().simple().to_string();
            let token = &uuid[..8];
            final_name = format!("{stem}_{token}{extension}");
            relative_path = format!("{}/{final_name}", request.directory);
        }

        let disk_path = target_dir.join(&final_name);
        tokio::fs::write(&disk_path, request.content).await?;
        info!(
            "Saved file to disk: {} ({} bytes)",
            disk_path.display(),
            request.content.len()
        );

        let file_hash = sha256_hex(request.content);

        let inserted = self
            .repository
            .insert(NewFileRecord {
                file_hash,
                file_path: relative_path.clone(),
                original_filename: request.filename.to_string(),
                file_size: request.content.len() as i64,
                file_type: file_type.to_string(),
                mime_type: validation::mime_type_for(file_type).to_string(),
                status: request.status,
                created_by: request.created_by.map(str::to_string),
            })
            .await;

        match inserted {
            Ok(record) => {
                info!(
                    "Created FileRecord: id={}, path='{relative_path}', type={file_type}, \
                     hash={}...",
                    record.id,
                    &record.file_hash[..16]
                );
                Ok(record)
            }
            Err(e) => {
                // Compensating action: the blob must not outlive a failed
                // registration.
                error!("DB insert failed, deleting file from disk: {}", disk_path.display());
                if let Err(cleanup) = tokio::fs::remove_file(&disk_path).await {
                    error!("Failed to clean up file after DB error: {cleanup}");
                }
                Err(e)
            }
        }
    }

    pub fn get(&self, file_id: i64) -> Result<FileRecord> {
        self.repository.get_by_id(file_id)
    }

    /// Links a file to an entity. UPSERT: updates the link when it already
    /// exists. With `is_primary`, every other active link of the same
    /// `(entity_type, entity_id, link_type)` loses the flag atomically.
    pub async fn link(&self, request: FileLinkRequest) -> Result<FileLink> {
        self.repository.get_by_id(request.file_id)?;

        let link = self.repository.upsert_link(request).await?;
        info!(
            "Linked file {} -> {}:{} (primary={})",
            link.file_id, link.entity_type, link.entity_id, link.is_primary
        );
        Ok(link)
    }

    /// Soft-deletes the link. No auto-promotion: when the primary link is
    /// removed the entity simply has no primary until one is set again.
    pub async fn unlink(
        &self,
        file_id: i64,
        entity_type: &str,
        entity_id: i64,
        deleted_by: Option<&str>,
    ) -> Result<()> {
        let link = self
            .repository
            .find_link(file_id, entity_type, entity_id)?
            .ok_or_else(|| FileError::LinkNotFound {
                file_id,
                entity_type: entity_type.to_string(),
                entity_id,
            })?;

        self.repository
            .soft_delete_link(link.id, deleted_by.map(str::to_string))
            .await?;
        info!("Unlinked file {file_id} from {entity_type}:{entity_id}");
        Ok(())
    }

    /// Soft-deletes the record. Links remain (filtered out by queries); the
    /// blob stays on disk.
    pub async fn delete(&self, file_id: i64, deleted_by: Option<&str>) -> Result<()> {
        let record = self.repository.get_by_id(file_id)?;
        self.repository
            .soft_delete_record(file_id, deleted_by.map(str::to_string))
            .await?;
        info!("Soft deleted FileRecord id={file_id}, path='{}'", record.file_path);
        Ok(())
    }

    // === Lookups ===

    pub fn get_files_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let files = self
            .repository
            .files_for_entity(entity_type, entity_id, link_type)?;
        debug!(
            "Found {} files for {entity_type}:{entity_id} (link_type={})",
            files.len(),
            link_type.unwrap_or("all")
        );
        Ok(files)
    }

    pub fn get_primary(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: &str,
    ) -> Result<Option<FileRecord>> {
        self.repository
            .primary_for_entity(entity_type, entity_id, link_type)
    }

    /// Promotes an existing link to primary (no-op when it already is).
    pub async fn set_primary(
        &self,
        file_id: i64,
        entity_type: &str,
        entity_id: i64,
        updated_by: Option<&str>,
    ) -> Result<()> {
        let link = self
            .repository
            .find_link(file_id, entity_type, entity_id)?
            .ok_or_else(|| FileError::LinkNotFound {
                file_id,
                entity_type: entity_type.to_string(),
                entity_id,
            })?;

        if link.is_primary {
            debug!("FileLink {} is already primary", link.id);
            return Ok(());
        }

        self.repository
            .promote_link(link.id, updated_by.map(str::to_string))
            .await
    }

    /// Entity ids that already carry an active link of the type - the
    /// document importer's duplicate probe.
    pub fn entities_with_links(
        &self,
        entity_type: &str,
        link_type: &str,
        entity_ids: &[i64],
    ) -> Result<Vec<i64>> {
        self.repository
            .entities_with_links(entity_type, link_type, entity_ids)
    }

    /// Entities of the same type already holding identical content under a
    /// different record. Soft signal only.
    pub fn duplicate_hash_entities(
        &self,
        file_hash: &str,
        exclude_file_id: i64,
        entity_type: &str,
        exclude_entity_id: i64,
    ) -> Result<Vec<i64>> {
        self.repository.duplicate_hash_entities(
            file_hash,
            exclude_file_id,
            entity_type,
            exclude_entity_id,
        )
    }

    // === Maintenance ===

    /// Collects temp records older than `max_age_hours`: blob removed from
    /// disk, record tombstoned. The only path that ever deletes blobs.
    pub async fn cleanup_temp(&self, max_age_hours: i64) -> Result<usize> {
        let cutoff = Utc::now().naive_utc() - Duration::hours(max_age_hours);
        let expired = self.repository.list_expired_temp(cutoff)?;
        let mut deleted = 0;

        for record in expired {
            let disk_path = self.uploads_root.join(&record.file_path);
            if disk_path.exists() {
                if let Err(e) = tokio::fs::remove_file(&disk_path).await {
                    warn!("Failed to delete temp file {}: {e}", disk_path.display());
                }
            }
            self.repository
                .soft_delete_record(record.id, Some("cleanup".to_string()))
                .await?;
            deleted += 1;
        }

        if deleted > 0 {
            info!("Cleanup: deleted {deleted} temp files (older than {max_age_hours}h)");
        }
        Ok(deleted)
    }

    /// Records with no active link (temp excluded).
    pub fn find_orphans(&self) -> Result<Vec<FileRecord>> {
        let orphans = self.repository.find_orphans()?;
        info!("Found {} orphaned files", orphans.len());
        Ok(orphans)
    }

    /// Prepares a record for download/preview. Fails when the record is
    /// tombstoned or the blob is gone from disk.
    pub fn serve(&self, file_id: i64) -> Result<ServedFile> {
        let record = self.repository.get_by_id(file_id)?;

        let path = self.uploads_root.join(&record.file_path);
        if !path.exists() {
            error!("File missing on disk: {}", path.display());
            return Err(FileError::MissingOnDisk(record.file_path).into());
        }

        Ok(ServedFile {
            path,
            mime_type: record.mime_type,
            filename: record.original_filename,
            disposition: "inline",
        })
    }
}

/// SHA-256 of a byte stream, fed in 4 KiB chunks.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    for chunk in content.chunks(4096) {
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}
