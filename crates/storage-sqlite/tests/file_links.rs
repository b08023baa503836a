//! Primary-link arbitration against a real SQLite database.

mod common;

use gestima_core::files::{FileLinkRequest, FileRepositoryTrait, FileStatus, NewFileRecord};
use gestima_storage_sqlite::FileRepository;

fn record(path: &str) -> NewFileRecord {
    NewFileRecord {
        file_hash: format!("hash-{path}"),
        file_path: path.to_string(),
        original_filename: path.rsplit('/').next().unwrap().to_string(),
        file_size: 1024,
        file_type: "pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        status: FileStatus::Active,
        created_by: Some("tester".to_string()),
    }
}

fn link(file_id: i64, entity_id: i64, is_primary: bool) -> FileLinkRequest {
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
async fn test_at_most_one_primary_per_entity_and_link_type() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let first = repo.insert(record("parts/P/one.pdf")).await.unwrap();
    let second = repo.insert(record("parts/P/two.pdf")).await.unwrap();

    repo.upsert_link(link(first.id, 7, true)).await.unwrap();
    let second_link = repo.upsert_link(link(second.id, 7, true)).await.unwrap();
    assert!(second_link.is_primary);

    // The arbitration left exactly one primary, the new one.
    let primary = repo.primary_for_entity("part", 7, "drawing").unwrap().unwrap();
    assert_eq!(primary.id, second.id);

    let first_link = repo.find_link(first.id, "part", 7).unwrap().unwrap();
    assert!(!first_link.is_primary);
}

#[tokio::test]
async fn test_unlink_does_not_auto_promote() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let first = repo.insert(record("parts/P/one.pdf")).await.unwrap();
    let second = repo.insert(record("parts/P/two.pdf")).await.unwrap();

    repo.upsert_link(link(first.id, 7, false)).await.unwrap();
    let second_link = repo.upsert_link(link(second.id, 7, true)).await.unwrap();

    repo.soft_delete_link(second_link.id, None).await.unwrap();

    // The survivor stays non-primary.
    assert!(repo.primary_for_entity("part", 7, "drawing").unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_updates_existing_link_row() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let file = repo.insert(record("parts/P/one.pdf")).await.unwrap();

    let created = repo.upsert_link(link(file.id, 7, false)).await.unwrap();
    let updated = repo.upsert_link(link(file.id, 7, true)).await.unwrap();

    // Same row, refreshed flags, bumped version.
    assert_eq!(created.id, updated.id);
    assert!(updated.is_primary);
    assert!(updated.audit.version > created.audit.version);
}

#[tokio::test]
async fn test_promote_link_moves_the_flag() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let first = repo.insert(record("parts/P/one.pdf")).await.unwrap();
    let second = repo.insert(record("parts/P/two.pdf")).await.unwrap();

    repo.upsert_link(link(first.id, 7, true)).await.unwrap();
    let second_link = repo.upsert_link(link(second.id, 7, false)).await.unwrap();

    repo.promote_link(second_link.id, None).await.unwrap();

    let primary = repo.primary_for_entity("part", 7, "drawing").unwrap().unwrap();
    assert_eq!(primary.id, second.id);
    let first_link = repo.find_link(first.id, "part", 7).unwrap().unwrap();
    assert!(!first_link.is_primary);
}

#[tokio::test]
async fn test_orphan_scan_skips_linked_and_temp() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let linked = repo.insert(record("parts/P/linked.pdf")).await.unwrap();
    repo.upsert_link(link(linked.id, 7, true)).await.unwrap();

    let orphan = repo.insert(record("loose/orphan.pdf")).await.unwrap();

    let mut temp = record("temp/pending.pdf");
    temp.status = FileStatus::Temp;
    repo.insert(temp).await.unwrap();

    let orphans = repo.find_orphans().unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, orphan.id);
}

#[tokio::test]
async fn test_duplicate_hash_probe() {
    let (pool, writer, _dir) = common::test_db();
    let repo = FileRepository::new(pool, writer);

    let mut a = record("parts/A/drawing.pdf");
    a.file_hash = "same-content".to_string();
    let mut b = record("parts/B/drawing.pdf");
    b.file_hash = "same-content".to_string();

    let file_a = repo.insert(a).await.unwrap();
    let file_b = repo.insert(b).await.unwrap();

    repo.upsert_link(link(file_a.id, 1, true)).await.unwrap();
    repo.upsert_link(link(file_b.id, 2, true)).await.unwrap();

    // From part 2's perspective, part 1 already holds the same content.
    let others = repo
        .duplicate_hash_entities("same-content", file_b.id, "part", 2)
        .unwrap();
    assert_eq!(others, vec![1]);
}
