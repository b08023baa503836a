//! Repository trait for number allocation lookups.

use super::numbering_model::NumberClass;
use crate::errors::Result;

/// Storage-side queries the allocator needs.
///
/// Lookups are read-only; uniqueness is ultimately enforced by the unique
/// column constraint of each entity table, which serializes the rare
/// collision between concurrent allocators.
pub trait NumberingRepositoryTrait: Send + Sync {
    /// Number of existing rows for the class (tombstoned rows included -
    /// their numbers stay reserved).
    fn count(&self, class: NumberClass) -> Result<i64>;

    /// Which of the candidate numbers already exist for the class.
    fn existing_in(&self, class: NumberClass, candidates: &[String]) -> Result<Vec<String>>;

    /// Highest allocated work-center number, if any.
    fn max_work_center_number(&self) -> Result<Option<String>>;
}
