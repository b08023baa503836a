use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::*;
use crate::errors::{Error, Result};

/// In-memory numbering repository: one set of taken numbers per class.
struct MockNumberingRepository {
    taken: Mutex<HashSet<String>>,
    work_center_max: Mutex<Option<String>>,
    query_count: Mutex<usize>,
}

impl MockNumberingRepository {
    fn new() -> Self {
        Self {
            taken: Mutex::new(HashSet::new()),
            work_center_max: Mutex::new(None),
            query_count: Mutex::new(0),
        }
    }

    fn with_taken(taken: HashSet<String>) -> Self {
        Self {
            taken: Mutex::new(taken),
            work_center_max: Mutex::new(None),
            query_count: Mutex::new(0),
        }
    }
}

impl NumberingRepositoryTrait for MockNumberingRepository {
    fn count(&self, _class: NumberClass) -> Result<i64> {
        Ok(self.taken.lock().unwrap().len() as i64)
    }

    fn existing_in(&self, _class: NumberClass, candidates: &[String]) -> Result<Vec<String>> {
        *self.query_count.lock().unwrap() += 1;
        let taken = self.taken.lock().unwrap();
        Ok(candidates
            .iter()
            .filter(|c| taken.contains(*c))
            .cloned()
            .collect())
    }

    fn max_work_center_number(&self) -> Result<Option<String>> {
        Ok(self.work_center_max.lock().unwrap().clone())
    }
}

fn service(repo: Arc<MockNumberingRepository>) -> NumberingService {
    NumberingService::new(repo, QuoteNumberRange::default())
}

#[test]
fn test_batch_returns_distinct_numbers_in_range() {
    let repo = Arc::new(MockNumberingRepository::new());
    let svc = service(repo.clone());

    let numbers = svc.generate_batch(NumberClass::Part, 30).unwrap();
    assert_eq!(numbers.len(), 30);

    let distinct: HashSet<&String> = numbers.iter().collect();
    assert_eq!(distinct.len(), 30);

    for n in &numbers {
        let value: u32 = n.parse().unwrap();
        assert!((10_000_000..=10_999_999).contains(&value), "out of range: {n}");
    }
}

#[test]
fn test_single_number_delegates_to_batch() {
    let repo = Arc::new(MockNumberingRepository::new());
    let svc = service(repo);

    let number = svc.generate(NumberClass::Partner).unwrap();
    let value: u32 = number.parse().unwrap();
    assert!((70_000_000..=70_999_999).contains(&value));
}

#[test]
fn test_invalid_batch_sizes_rejected() {
    let repo = Arc::new(MockNumberingRepository::new());
    let svc = service(repo);

    assert!(matches!(
        svc.generate_batch(NumberClass::Part, 0),
        Err(Error::Number(NumberError::InvalidBatchSize(0)))
    ));
    assert!(matches!(
        svc.generate_batch(NumberClass::Part, 1001),
        Err(Error::Number(NumberError::InvalidBatchSize(1001)))
    ));
}

#[test]
fn test_allocation_at_high_saturation() {
    // 900k of the 1M part numbers already taken; the allocator must still
    // return 30 fresh unique numbers within MAX_RETRIES or fail loudly.
    let mut taken = HashSet::with_capacity(900_000);
    let mut rng_state: u64 = 0x2545_F491_4F6C_DD1D;
    while taken.len() < 900_000 {
        // Cheap xorshift so the test does not depend on rand internals.
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        let n = 10_000_000 + (rng_state % 1_000_000) as u32;
        taken.insert(n.to_string());
    }

    let repo = Arc::new(MockNumberingRepository::with_taken(taken.clone()));
    let svc = service(repo);

    let numbers = svc.generate_batch(NumberClass::Part, 30).unwrap();
    assert_eq!(numbers.len(), 30);
    let distinct: HashSet<&String> = numbers.iter().collect();
    assert_eq!(distinct.len(), 30);
    for n in &numbers {
        assert!(!taken.contains(n), "allocated an already-taken number: {n}");
    }
}

#[test]
fn test_full_range_exhausts() {
    // Every number taken: allocation must fail with Exhausted, not hang.
    let taken: HashSet<String> = (10_000_000u32..=10_999_999)
        .step_by(1)
        .map(|n| n.to_string())
        .collect();
    let repo = Arc::new(MockNumberingRepository::with_taken(taken));
    let svc = service(repo);

    match svc.generate_batch(NumberClass::Part, 5) {
        Err(Error::Number(NumberError::Exhausted { entity, .. })) => {
            assert_eq!(entity, "Part");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[test]
fn test_work_center_sequence() {
    let repo = Arc::new(MockNumberingRepository::new());
    let svc = service(repo.clone());

    // Empty table starts at the range minimum.
    assert_eq!(svc.next_work_center_number().unwrap(), "80000001");

    *repo.work_center_max.lock().unwrap() = Some("80000014".to_string());
    assert_eq!(svc.next_work_center_number().unwrap(), "80000015");

    *repo.work_center_max.lock().unwrap() = Some("80999999".to_string());
    assert!(matches!(
        svc.next_work_center_number(),
        Err(Error::Number(NumberError::Exhausted { .. }))
    ));
}

#[test]
fn test_quote_range_configurable() {
    let repo = Arc::new(MockNumberingRepository::new());
    let svc = NumberingService::new(repo, QuoteNumberRange::Low);

    let number = svc.generate(NumberClass::Quote).unwrap();
    let value: u32 = number.parse().unwrap();
    assert!((50_000_000..=50_999_999).contains(&value));
}
