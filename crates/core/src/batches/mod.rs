//! Batches module - cost batches and pricing sets with freeze semantics.

mod batches_model;
mod batches_service;
mod batches_traits;

pub use batches_model::{
    generate_batch_set_name, Batch, BatchCostSnapshot, BatchFreeze, BatchMatch, BatchSet,
    BatchSetStatus, BatchSnapshot, NewBatch, NewBatchSet,
};
pub use batches_service::BatchService;
pub use batches_traits::BatchRepositoryTrait;

#[cfg(test)]
mod batches_service_tests;
