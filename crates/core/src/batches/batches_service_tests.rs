use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal_macros::dec;

use super::*;
use crate::audit::Audit;
use crate::errors::{DatabaseError, Error, Result};
use crate::numbering::{NumberClass, NumberingRepositoryTrait, NumberingService, QuoteNumberRange};

struct MockBatchRepository {
    sets: Mutex<Vec<BatchSet>>,
    batches: Mutex<Vec<Batch>>,
}

impl MockBatchRepository {
    fn new() -> Self {
        Self {
            sets: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    fn add_set(&self, set: BatchSet) {
        self.sets.lock().unwrap().push(set);
    }

    fn add_batch(&self, batch: Batch) {
        self.batches.lock().unwrap().push(batch);
    }
}

#[async_trait]
impl BatchRepositoryTrait for MockBatchRepository {
    async fn create_set(&self, new_set: NewBatchSet) -> Result<BatchSet> {
        let set = BatchSet {
            id: self.sets.lock().unwrap().len() as i64 + 1,
            set_number: new_set.set_number,
            part_id: new_set.part_id,
            name: new_set.name.unwrap_or_default(),
            status: BatchSetStatus::Draft,
            frozen_at: None,
            frozen_by: None,
            audit: Audit::new(new_set.created_by.as_deref()),
        };
        self.add_set(set.clone());
        Ok(set)
    }

    async fn create(&self, _new_batch: NewBatch) -> Result<Batch> {
        unimplemented!()
    }

    fn get_set_by_id(&self, set_id: i64) -> Result<BatchSet> {
        self.sets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == set_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("batch set {set_id}"))))
    }

    fn get_by_id(&self, batch_id: i64) -> Result<Batch> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == batch_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("batch {batch_id}"))))
    }

    fn list_for_set(&self, set_id: i64) -> Result<Vec<Batch>> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.batch_set_id == Some(set_id))
            .cloned()
            .collect())
    }

    fn latest_frozen_set_for_part(&self, part_id: i64) -> Result<Option<BatchSet>> {
        let sets = self.sets.lock().unwrap();
        let mut frozen: Vec<&BatchSet> = sets
            .iter()
            .filter(|s| s.part_id == Some(part_id) && s.status == BatchSetStatus::Frozen)
            .collect();
        frozen.sort_by_key(|s| std::cmp::Reverse(s.audit.updated_at));
        Ok(frozen.first().map(|s| (*s).clone()))
    }

    fn first_batch_in_set(&self, set_id: i64) -> Result<Option<Batch>> {
        Ok(self.list_for_set(set_id)?.into_iter().next())
    }

    fn list_frozen_for_part(&self, part_id: i64) -> Result<Vec<Batch>> {
        let frozen_sets: Vec<i64> = self
            .sets
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == BatchSetStatus::Frozen)
            .map(|s| s.id)
            .collect();
        let mut batches: Vec<Batch> = self
            .batches
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.part_id == part_id
                    && b.batch_set_id.map(|id| frozen_sets.contains(&id)).unwrap_or(false)
            })
            .cloned()
            .collect();
        batches.sort_by_key(|b| b.quantity);
        Ok(batches)
    }

    async fn apply_freeze(
        &self,
        set_id: i64,
        frozen_at: NaiveDateTime,
        frozen_by: Option<String>,
        batches: Vec<BatchFreeze>,
    ) -> Result<()> {
        {
            let mut sets = self.sets.lock().unwrap();
            let set = sets.iter_mut().find(|s| s.id == set_id).unwrap();
            set.status = BatchSetStatus::Frozen;
            set.frozen_at = Some(frozen_at);
            set.frozen_by = frozen_by.clone();
            set.audit.touch(frozen_by.as_deref());
        }
        let mut stored = self.batches.lock().unwrap();
        for freeze in batches {
            let batch = stored.iter_mut().find(|b| b.id == freeze.batch_id).unwrap();
            batch.is_frozen = true;
            batch.frozen_at = Some(frozen_at);
            batch.frozen_by = frozen_by.clone();
            batch.snapshot_data = Some(freeze.snapshot_data);
            batch.unit_price_frozen = Some(freeze.unit_price_frozen);
            batch.total_price_frozen = Some(freeze.total_price_frozen);
        }
        Ok(())
    }

    async fn soft_delete_set(&self, set_id: i64, deleted_by: Option<String>) -> Result<()> {
        let mut sets = self.sets.lock().unwrap();
        if let Some(set) = sets.iter_mut().find(|s| s.id == set_id) {
            set.audit.tombstone(deleted_by.as_deref());
        }
        // Cascade to batches.
        let mut batches = self.batches.lock().unwrap();
        for batch in batches.iter_mut().filter(|b| b.batch_set_id == Some(set_id)) {
            batch.audit.tombstone(deleted_by.as_deref());
        }
        Ok(())
    }
}

struct NoopNumberingRepository;

impl NumberingRepositoryTrait for NoopNumberingRepository {
    fn count(&self, _class: NumberClass) -> Result<i64> {
        Ok(0)
    }
    fn existing_in(&self, _class: NumberClass, _candidates: &[String]) -> Result<Vec<String>> {
        Ok(vec![])
    }
    fn max_work_center_number(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

fn make_batch(id: i64, set_id: i64, part_id: i64, quantity: i32, unit_cost: rust_decimal::Decimal) -> Batch {
    Batch {
        id,
        batch_number: format!("3000{id:04}"),
        part_id,
        batch_set_id: Some(set_id),
        quantity,
        is_default: false,
        unit_time_min: 0.0,
        material_cost: dec!(10),
        machining_cost: dec!(20),
        setup_cost: dec!(5),
        overhead_cost: dec!(3),
        margin_cost: dec!(2),
        coop_cost: dec!(0),
        unit_cost,
        total_cost: unit_cost * rust_decimal::Decimal::from(quantity),
        material_weight_kg: None,
        material_price_per_kg: None,
        is_frozen: false,
        frozen_at: None,
        frozen_by: None,
        snapshot_data: None,
        unit_price_frozen: None,
        total_price_frozen: None,
        audit: Audit::default(),
    }
}

fn make_set(id: i64, part_id: i64, status: BatchSetStatus) -> BatchSet {
    BatchSet {
        id,
        set_number: format!("3500{id:04}"),
        part_id: Some(part_id),
        name: "test set".to_string(),
        status,
        frozen_at: None,
        frozen_by: None,
        audit: Audit::default(),
    }
}

fn service(repo: Arc<MockBatchRepository>) -> BatchService {
    let numbering = Arc::new(NumberingService::new(
        Arc::new(NoopNumberingRepository),
        QuoteNumberRange::default(),
    ));
    BatchService::new(repo, numbering)
}

#[tokio::test]
async fn test_freeze_writes_snapshot_and_frozen_prices() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Draft));
    repo.add_batch(make_batch(1, 1, 7, 10, dec!(40)));
    repo.add_batch(make_batch(2, 1, 7, 50, dec!(32)));

    let svc = service(repo.clone());
    let set = svc.freeze_set(1, Some("karel")).await.unwrap();
    assert_eq!(set.status, BatchSetStatus::Frozen);
    assert_eq!(set.frozen_by.as_deref(), Some("karel"));

    let batch = repo.get_by_id(1).unwrap();
    assert!(batch.is_frozen);
    assert_eq!(batch.unit_price_frozen, Some(dec!(40)));
    assert_eq!(batch.total_price_frozen, Some(dec!(400)));

    // Snapshot costs agree with the frozen price columns.
    let snapshot: BatchSnapshot =
        serde_json::from_value(batch.snapshot_data.clone().unwrap()).unwrap();
    assert_eq!(snapshot.costs.unit_cost, dec!(40));
    assert_eq!(snapshot.quantity, 10);
}

#[tokio::test]
async fn test_freeze_survives_later_cost_changes() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Draft));
    repo.add_batch(make_batch(1, 1, 7, 10, dec!(40)));

    let svc = service(repo.clone());
    svc.freeze_set(1, None).await.unwrap();

    // Mutate the live cost after the freeze - the snapshot must not move.
    repo.batches.lock().unwrap()[0].unit_cost = dec!(99);

    let batch = repo.get_by_id(1).unwrap();
    let snapshot: BatchSnapshot =
        serde_json::from_value(batch.snapshot_data.unwrap()).unwrap();
    assert_eq!(snapshot.costs.unit_cost, dec!(40));
    assert_eq!(batch.unit_price_frozen, Some(dec!(40)));
}

#[tokio::test]
async fn test_freeze_twice_is_rejected() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Draft));

    let svc = service(repo.clone());
    svc.freeze_set(1, None).await.unwrap();
    assert!(svc.freeze_set(1, None).await.is_err());
}

#[tokio::test]
async fn test_best_batch_exact_match() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Frozen));
    repo.add_batch(make_batch(1, 1, 7, 10, dec!(40)));
    repo.add_batch(make_batch(2, 1, 7, 50, dec!(32)));

    let svc = service(repo);
    let (batch, status, warnings) = svc.find_best_batch(7, 50).unwrap();
    assert_eq!(batch.unwrap().quantity, 50);
    assert_eq!(status, BatchMatch::Exact);
    assert!(warnings.is_empty());
}

#[tokio::test]
async fn test_best_batch_nearest_lower() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Frozen));
    repo.add_batch(make_batch(1, 1, 7, 10, dec!(40)));
    repo.add_batch(make_batch(2, 1, 7, 50, dec!(32)));

    let svc = service(repo);
    let (batch, status, warnings) = svc.find_best_batch(7, 30).unwrap();
    assert_eq!(batch.unwrap().quantity, 10);
    assert_eq!(status, BatchMatch::Lower);
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn test_best_batch_none_below_requested() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Frozen));
    repo.add_batch(make_batch(1, 1, 7, 100, dec!(20)));

    let svc = service(repo);
    let (batch, status, warnings) = svc.find_best_batch(7, 5).unwrap();
    assert!(batch.is_none());
    assert_eq!(status, BatchMatch::Missing);
    assert!(warnings[0].contains("100 pcs"));
}

#[tokio::test]
async fn test_best_batch_ignores_draft_sets() {
    let repo = Arc::new(MockBatchRepository::new());
    repo.add_set(make_set(1, 7, BatchSetStatus::Draft));
    repo.add_batch(make_batch(1, 1, 7, 10, dec!(40)));

    let svc = service(repo);
    let (batch, status, _) = svc.find_best_batch(7, 10).unwrap();
    assert!(batch.is_none());
    assert_eq!(status, BatchMatch::Missing);
}
