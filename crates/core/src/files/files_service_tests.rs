use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::*;
use crate::audit::Audit;
use crate::errors::{Error, Result};

/// In-memory file repository faithful to the arbitration and tombstone
/// contracts of the trait.
#[derive(Default)]
struct MockFileRepository {
    records: Mutex<Vec<FileRecord>>,
    links: Mutex<Vec<FileLink>>,
}

impl MockFileRepository {
    fn active_links(&self) -> Vec<FileLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| !l.audit.is_deleted())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FileRepositoryTrait for MockFileRepository {
    fn get_by_id(&self, file_id: i64) -> Result<FileRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == file_id && !r.audit.is_deleted())
            .cloned()
            .ok_or_else(|| Error::File(FileError::NotFound(file_id)))
    }

    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord> {
        let mut records = self.records.lock().unwrap();
        let stored = FileRecord {
            id: records.len() as i64 + 1,
            file_hash: record.file_hash,
            file_path: record.file_path,
            original_filename: record.original_filename,
            file_size: record.file_size,
            file_type: record.file_type,
            mime_type: record.mime_type,
            status: record.status,
            audit: Audit::new(record.created_by.as_deref()),
        };
        records.push(stored.clone());
        Ok(stored)
    }

    fn path_exists(&self, file_path: &str) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.file_path == file_path))
    }

    async fn upsert_link(&self, request: FileLinkRequest) -> Result<FileLink> {
        let mut links = self.links.lock().unwrap();

        let link_id = match links.iter_mut().find(|l| {
            l.file_id == request.file_id
                && l.entity_type == request.entity_type
                && l.entity_id == request.entity_id
                && !l.audit.is_deleted()
        }) {
            Some(existing) => {
                existing.is_primary = request.is_primary;
                existing.revision = request.revision.clone();
                existing.link_type = request.link_type.clone();
                existing.audit.touch(request.created_by.as_deref());
                existing.id
            }
            None => {
                let link = FileLink {
                    id: links.len() as i64 + 1,
                    file_id: request.file_id,
                    entity_type: request.entity_type.clone(),
                    entity_id: request.entity_id,
                    is_primary: request.is_primary,
                    revision: request.revision.clone(),
                    link_type: request.link_type.clone(),
                    audit: Audit::new(request.created_by.as_deref()),
                };
                links.push(link.clone());
                link.id
            }
        };

        if request.is_primary {
            for other in links.iter_mut().filter(|l| {
                l.id != link_id
                    && l.entity_type == request.entity_type
                    && l.entity_id == request.entity_id
                    && l.link_type == request.link_type
                    && !l.audit.is_deleted()
            }) {
                other.is_primary = false;
            }
        }

        Ok(links.iter().find(|l| l.id == link_id).unwrap().clone())
    }

    fn find_link(
        &self,
        file_id: i64,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Option<FileLink>> {
        Ok(self
            .active_links()
            .into_iter()
            .find(|l| {
                l.file_id == file_id && l.entity_type == entity_type && l.entity_id == entity_id
            }))
    }

    async fn promote_link(&self, link_id: i64, updated_by: Option<String>) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        let (entity_type, entity_id, link_type) = {
            let link = links.iter().find(|l| l.id == link_id).unwrap();
            (
                link.entity_type.clone(),
                link.entity_id,
                link.link_type.clone(),
            )
        };
        for link in links.iter_mut() {
            if link.audit.is_deleted()
                || link.entity_type != entity_type
                || link.entity_id != entity_id
                || link.link_type != link_type
            {
                continue;
            }
            let promote = link.id == link_id;
            if link.is_primary != promote {
                link.is_primary = promote;
                link.audit.touch(updated_by.as_deref());
            }
        }
        Ok(())
    }

    async fn soft_delete_link(&self, link_id: i64, deleted_by: Option<String>) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == link_id) {
            link.audit.tombstone(deleted_by.as_deref());
        }
        Ok(())
    }

    async fn soft_delete_record(&self, file_id: i64, deleted_by: Option<String>) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == file_id) {
            record.audit.tombstone(deleted_by.as_deref());
        }
        Ok(())
    }

    fn files_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let file_ids: Vec<i64> = self
            .active_links()
            .into_iter()
            .filter(|l| {
                l.entity_type == entity_type
                    && l.entity_id == entity_id
                    && link_type.map(|t| l.link_type == t).unwrap_or(true)
            })
            .map(|l| l.file_id)
            .collect();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| file_ids.contains(&r.id) && !r.audit.is_deleted())
            .cloned()
            .collect())
    }

    fn primary_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        link_type: &str,
    ) -> Result<Option<FileRecord>> {
        let link = self.active_links().into_iter().find(|l| {
            l.entity_type == entity_type
                && l.entity_id == entity_id
                && l.link_type == link_type
                && l.is_primary
        });
        Ok(match link {
            Some(link) => self.get_by_id(link.file_id).ok(),
            None => None,
        })
    }

    fn entities_with_links(
        &self,
        entity_type: &str,
        link_type: &str,
        entity_ids: &[i64],
    ) -> Result<Vec<i64>> {
        Ok(self
            .active_links()
            .into_iter()
            .filter(|l| {
                l.entity_type == entity_type
                    && l.link_type == link_type
                    && entity_ids.contains(&l.entity_id)
            })
            .map(|l| l.entity_id)
            .collect())
    }

    fn duplicate_hash_entities(
        &self,
        file_hash: &str,
        exclude_file_id: i64,
        entity_type: &str,
        exclude_entity_id: i64,
    ) -> Result<Vec<i64>> {
        let records = self.records.lock().unwrap();
        let matching_files: Vec<i64> = records
            .iter()
            .filter(|r| {
                r.file_hash == file_hash && r.id != exclude_file_id && !r.audit.is_deleted()
            })
            .map(|r| r.id)
            .collect();
        Ok(self
            .active_links()
            .into_iter()
            .filter(|l| {
                matching_files.contains(&l.file_id)
                    && l.entity_type == entity_type
                    && l.entity_id != exclude_entity_id
            })
            .map(|l| l.entity_id)
            .collect())
    }

    fn list_expired_temp(&self, cutoff: NaiveDateTime) -> Result<Vec<FileRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.status == FileStatus::Temp
                    && r.audit.created_at < cutoff
                    && !r.audit.is_deleted()
            })
            .cloned()
            .collect())
    }

    fn find_orphans(&self) -> Result<Vec<FileRecord>> {
        let linked: Vec<i64> = self.active_links().into_iter().map(|l| l.file_id).collect();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.status != FileStatus::Temp
                    && !r.audit.is_deleted()
                    && !linked.contains(&r.id)
            })
            .cloned()
            .collect())
    }
}

fn service() -> (FileService, Arc<MockFileRepository>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(MockFileRepository::default());
    (
        FileService::new(dir.path().to_path_buf(), repo.clone()),
        repo,
        dir,
    )
}

fn store_pdf<'a>(filename: &'a str, content: &'a [u8]) -> StoreBytes<'a> {
    StoreBytes {
        content,
        filename,
        directory: "parts/10900635",
        allowed_types: None,
        status: FileStatus::Active,
        created_by: Some("tester"),
    }
}

fn drawing_link(file_id: i64, entity_id: i64, is_primary: bool) -> FileLinkRequest {
    FileLinkRequest {
        file_id,
        entity_type: "part".to_string(),
        entity_id,
        is_primary,
        revision: None,
        link_type: "drawing".to_string(),
        created_by: Some("tester".to_string()),
    }
}

#[tokio::test]
async fn test_store_writes_disk_and_record() {
    let (svc, _repo, dir) = service();

    let record = svc
        .store_from_bytes(store_pdf("rev_A.pdf", b"%PDF-1.7 content"))
        .await
        .unwrap();

    assert_eq!(record.file_type, "pdf");
    assert_eq!(record.mime_type, "application/pdf");
    assert_eq!(record.file_path, "parts/10900635/rev_A.pdf");
    assert_eq!(record.file_hash, sha256_hex(b"%PDF-1.7 content"));
    assert!(dir.path().join("parts/10900635/rev_A.pdf").exists());
}

#[tokio::test]
async fn test_store_rejects_bad_magic_bytes() {
    let (svc, _repo, _dir) = service();

    // Correct extension, wrong leading bytes.
    let result = svc
        .store_from_bytes(store_pdf("fake.pdf", b"<html>not a pdf</html>"))
        .await;
    assert!(matches!(
        result,
        Err(Error::File(FileError::MagicBytesMismatch(_)))
    ));
}

#[tokio::test]
async fn test_store_rejects_disallowed_type() {
    let (svc, _repo, _dir) = service();

    let result = svc
        .store_from_bytes(StoreBytes {
            allowed_types: Some(&["pdf"]),
            ..store_pdf("model.step", b"ISO-10303-21;")
        })
        .await;
    assert!(matches!(
        result,
        Err(Error::File(FileError::UnsupportedType(_)))
    ));
}

#[tokio::test]
async fn test_store_collision_gets_suffix() {
    let (svc, _repo, _dir) = service();

    let first = svc
        .store_from_bytes(store_pdf("rev_A.pdf", b"%PDF-1.7 one"))
        .await
        .unwrap();
    let second = svc
        .store_from_bytes(store_pdf("rev_A.pdf", b"%PDF-1.7 two"))
        .await
        .unwrap();

    assert_eq!(first.file_path, "parts/10900635/rev_A.pdf");
    assert_ne!(second.file_path, first.file_path);
    assert!(second.file_path.starts_with("parts/10900635/rev_A_"));
    assert!(second.file_path.ends_with(".pdf"));
}

#[tokio::test]
async fn test_primary_arbitration() {
    let (svc, _repo, _dir) = service();

    let first = svc
        .store_from_bytes(store_pdf("one.pdf", b"%PDF-1.7 one"))
        .await
        .unwrap();
    let second = svc
        .store_from_bytes(store_pdf("two.pdf", b"%PDF-1.7 two"))
        .await
        .unwrap();

    svc.link(drawing_link(first.id, 7, true)).await.unwrap();
    let second_link = svc.link(drawing_link(second.id, 7, true)).await.unwrap();
    assert!(second_link.is_primary);

    // The second link took over; the first lost the flag.
    let primary = svc.get_primary("part", 7, "drawing").unwrap().unwrap();
    assert_eq!(primary.id, second.id);

    // Unlink the primary: nobody is auto-promoted.
    svc.unlink(second.id, "part", 7, Some("tester")).await.unwrap();
    assert!(svc.get_primary("part", 7, "drawing").unwrap().is_none());
}

#[tokio::test]
async fn test_set_primary_promotes_existing_link() {
    let (svc, _repo, _dir) = service();

    let first = svc
        .store_from_bytes(store_pdf("one.pdf", b"%PDF-1.7 one"))
        .await
        .unwrap();
    let second = svc
        .store_from_bytes(store_pdf("two.pdf", b"%PDF-1.7 two"))
        .await
        .unwrap();

    svc.link(drawing_link(first.id, 7, true)).await.unwrap();
    svc.link(drawing_link(second.id, 7, false)).await.unwrap();

    svc.set_primary(second.id, "part", 7, Some("tester"))
        .await
        .unwrap();
    let primary = svc.get_primary("part", 7, "drawing").unwrap().unwrap();
    assert_eq!(primary.id, second.id);
}

#[tokio::test]
async fn test_unlink_missing_link_fails() {
    let (svc, _repo, _dir) = service();
    let result = svc.unlink(99, "part", 7, None).await;
    assert!(matches!(
        result,
        Err(Error::File(FileError::LinkNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_delete_keeps_blob_on_disk() {
    let (svc, _repo, dir) = service();

    let record = svc
        .store_from_bytes(store_pdf("keep.pdf", b"%PDF-1.7 keep"))
        .await
        .unwrap();
    svc.delete(record.id, Some("tester")).await.unwrap();

    assert!(matches!(
        svc.get(record.id),
        Err(Error::File(FileError::NotFound(_)))
    ));
    // Soft delete never removes the physical file.
    assert!(dir.path().join("parts/10900635/keep.pdf").exists());
}

#[tokio::test]
async fn test_cleanup_temp_removes_expired_blobs() {
    let (svc, repo, dir) = service();

    let record = svc
        .store_from_bytes(StoreBytes {
            status: FileStatus::Temp,
            ..store_pdf("upload.pdf", b"%PDF-1.7 temp")
        })
        .await
        .unwrap();

    // Fresh temp file survives.
    assert_eq!(svc.cleanup_temp(24).await.unwrap(), 0);

    // Age the record past the expiry.
    repo.records.lock().unwrap()[0].audit.created_at -= chrono::Duration::hours(25);

    assert_eq!(svc.cleanup_temp(24).await.unwrap(), 1);
    assert!(!dir.path().join("parts/10900635/upload.pdf").exists());
    assert!(svc.get(record.id).is_err());
}

#[tokio::test]
async fn test_find_orphans_skips_temp_and_linked() {
    let (svc, _repo, _dir) = service();

    let linked = svc
        .store_from_bytes(store_pdf("linked.pdf", b"%PDF-1.7 a"))
        .await
        .unwrap();
    svc.link(drawing_link(linked.id, 7, true)).await.unwrap();

    let orphan = svc
        .store_from_bytes(store_pdf("orphan.pdf", b"%PDF-1.7 b"))
        .await
        .unwrap();

    svc.store_from_bytes(StoreBytes {
        status: FileStatus::Temp,
        ..store_pdf("temp.pdf", b"%PDF-1.7 c")
    })
    .await
    .unwrap();

    let orphans = svc.find_orphans().unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, orphan.id);
}

#[tokio::test]
async fn test_serve_checks_disk_presence() {
    let (svc, _repo, dir) = service();

    let record = svc
        .store_from_bytes(store_pdf("served.pdf", b"%PDF-1.7 body"))
        .await
        .unwrap();

    let served = svc.serve(record.id).unwrap();
    assert_eq!(served.mime_type, "application/pdf");
    assert_eq!(served.filename, "served.pdf");
    assert_eq!(served.disposition, "inline");

    // Remove the blob behind the record's back.
    std::fs::remove_file(dir.path().join("parts/10900635/served.pdf")).unwrap();
    assert!(matches!(
        svc.serve(record.id),
        Err(Error::File(FileError::MissingOnDisk(_)))
    ));
}
