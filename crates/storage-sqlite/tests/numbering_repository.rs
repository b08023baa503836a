//! Numbering lookups against a real SQLite database.

mod common;

use gestima_core::numbering::{NumberClass, NumberingRepositoryTrait};
use gestima_core::parts::{NewPart, PartRepositoryTrait, PartStatus};
use gestima_core::work_centers::{NewWorkCenter, WorkCenterRepositoryTrait, WorkCenterType};
use gestima_storage_sqlite::{NumberingRepository, PartRepository, WorkCenterRepository};

fn new_part(number: &str) -> NewPart {
    NewPart {
        part_number: number.to_string(),
        article_number: Some(format!("ART-{number}")),
        name: Some("test part".to_string()),
        status: PartStatus::Quote,
        ..NewPart::default()
    }
}

#[tokio::test]
async fn test_existing_in_filters_candidates() {
    let (pool, writer, _dir) = common::test_db();
    let parts = PartRepository::new(pool.clone(), writer.clone());
    let numbering = NumberingRepository::new(pool);

    parts.create(new_part("10000001")).await.unwrap();
    parts.create(new_part("10000002")).await.unwrap();

    let candidates = vec![
        "10000001".to_string(),
        "10000002".to_string(),
        "10000003".to_string(),
    ];
    let mut existing = numbering
        .existing_in(NumberClass::Part, &candidates)
        .unwrap();
    existing.sort();
    assert_eq!(existing, vec!["10000001", "10000002"]);

    assert_eq!(numbering.count(NumberClass::Part).unwrap(), 2);
    assert_eq!(numbering.count(NumberClass::Quote).unwrap(), 0);
}

#[tokio::test]
async fn test_soft_deleted_numbers_stay_reserved() {
    let (pool, writer, _dir) = common::test_db();
    let parts = PartRepository::new(pool.clone(), writer.clone());
    let numbering = NumberingRepository::new(pool);

    let part = parts.create(new_part("10000009")).await.unwrap();
    parts.soft_delete(part.id, None).await.unwrap();

    // The tombstoned row still blocks its number.
    let existing = numbering
        .existing_in(NumberClass::Part, &["10000009".to_string()])
        .unwrap();
    assert_eq!(existing, vec!["10000009"]);
    assert_eq!(numbering.count(NumberClass::Part).unwrap(), 1);
}

#[tokio::test]
async fn test_max_work_center_number() {
    let (pool, writer, _dir) = common::test_db();
    let work_centers = WorkCenterRepository::new(pool.clone(), writer);
    let numbering = NumberingRepository::new(pool);

    assert_eq!(numbering.max_work_center_number().unwrap(), None);

    for number in ["80000001", "80000003", "80000002"] {
        work_centers
            .create(NewWorkCenter {
                work_center_number: number.to_string(),
                name: format!("WC {number}"),
                work_center_type: WorkCenterType::Turning,
                hourly_rate_amortization: None,
                hourly_rate_labor: None,
                hourly_rate_tools: None,
                hourly_rate_overhead: None,
                has_bar_feeder: false,
                has_sub_spindle: false,
                has_milling: false,
                notes: None,
                created_by: None,
            })
            .await
            .unwrap();
    }

    assert_eq!(
        numbering.max_work_center_number().unwrap(),
        Some("80000003".to_string())
    );
}
