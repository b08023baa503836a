//! Sync module - background polling sync against the Infor ERP.

mod dispatchers;
mod scheduler;
mod sync_state_model;
mod sync_traits;

pub use scheduler::{SyncContext, SyncScheduler, SyncSettings};
pub use sync_state_model::{
    default_steps, NewSyncLog, NewSyncState, StepCounters, SyncLog, SyncRunStatus, SyncState,
};
pub use sync_traits::{SyncLogRepositoryTrait, SyncStateRepositoryTrait};
