//! Sync state and log repository traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::sync_state_model::{NewSyncLog, NewSyncState, StepCounters, SyncLog, SyncState};
use crate::errors::Result;

#[async_trait]
pub trait SyncStateRepositoryTrait: Send + Sync {
    fn list_all(&self) -> Result<Vec<SyncState>>;

    fn list_enabled(&self) -> Result<Vec<SyncState>>;

    fn get_by_step(&self, step_name: &str) -> Result<Option<SyncState>>;

    /// Seeds the default step rows. Called only when the table is empty.
    async fn seed(&self, steps: Vec<NewSyncState>) -> Result<()>;

    /// Successful run: advance the watermark, store the counters, clear the
    /// last error.
    async fn record_success(
        &self,
        step_name: &str,
        watermark: NaiveDateTime,
        counters: StepCounters,
    ) -> Result<()>;

    /// Failed run: keep the watermark, store the (truncated) error message.
    async fn record_failure(&self, step_name: &str, error: &str) -> Result<()>;

    async fn set_enabled(&self, step_name: &str, enabled: bool) -> Result<()>;
}

#[async_trait]
pub trait SyncLogRepositoryTrait: Send + Sync {
    async fn append(&self, log: NewSyncLog) -> Result<()>;

    fn list_recent(&self, step_name: Option<&str>, limit: i64) -> Result<Vec<SyncLog>>;
}
