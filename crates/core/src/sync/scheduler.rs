//! Background sync scheduler.
//!
//! One long-running task per process. The loop wakes every 5 seconds and
//! runs each enabled step whose interval has elapsed: it builds a
//! time-windowed filter from the step's watermark, fetches rows from the
//! ERP, dispatches them into the matching importer, and atomically advances
//! the watermark plus writes one audit-trail row.
//!
//! A process-wide mutex serializes step executions so the loop and the
//! manual trigger endpoint cannot overlap.

use chrono::{Duration as ChronoDuration, Utc};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::dispatchers::{dispatch_step, DispatchOutcome};
use super::sync_state_model::{default_steps, NewSyncLog, StepCounters, SyncRunStatus, SyncState};
use super::sync_traits::{SyncLogRepositoryTrait, SyncStateRepositoryTrait};
use crate::errors::Result;
use crate::files::FileService;
use crate::materials::MaterialRepositoryTrait;
use crate::numbering::NumberingService;
use crate::operations::OperationRepositoryTrait;
use crate::parts::PartRepositoryTrait;
use crate::production::ProductionRepositoryTrait;
use crate::work_centers::WorkCenterResolver;
use gestima_infor::{format_filter_datetime, CollectionRequest, InforClientTrait};

/// Loop wake-up period. Per-step cadence is governed by each step's
/// `interval_seconds`.
const TICK: Duration = Duration::from_secs(5);

/// `last_error` is truncated to this many characters before storing.
const MAX_ERROR_LEN: usize = 500;

/// Scheduler tunables read from configuration at startup.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Watermark for a step that has never run: `now - lookback`.
    pub initial_lookback_days: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            initial_lookback_days: 1,
        }
    }
}

/// Everything a step execution needs. Shared by the loop and the manual
/// trigger.
pub struct SyncContext {
    pub states: Arc<dyn SyncStateRepositoryTrait>,
    pub logs: Arc<dyn SyncLogRepositoryTrait>,
    pub client: Arc<dyn InforClientTrait>,
    pub parts: Arc<dyn PartRepositoryTrait>,
    pub materials: Arc<dyn MaterialRepositoryTrait>,
    pub operations: Arc<dyn OperationRepositoryTrait>,
    pub production: Arc<dyn ProductionRepositoryTrait>,
    pub files: Arc<FileService>,
    pub numbering: Arc<NumberingService>,
    pub wc_resolver: Arc<WorkCenterResolver>,
    pub settings: SyncSettings,
}

pub struct SyncScheduler {
    ctx: Arc<SyncContext>,
    running: Arc<AtomicBool>,
    task: StdMutex<Option<JoinHandle<()>>>,
    /// Serializes all step executions, including manual triggers.
    step_lock: Arc<Mutex<()>>,
}

impl SyncScheduler {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            ctx,
            running: Arc::new(AtomicBool::new(false)),
            task: StdMutex::new(None),
            step_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Seeds default step configurations when the state table is empty and
    /// launches the loop.
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync scheduler already running");
            return Ok(());
        }

        self.ensure_default_steps().await?;

        let ctx = self.ctx.clone();
        let running = self.running.clone();
        let step_lock = self.step_lock.clone();

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                if let Err(e) = Self::run_due_steps(&ctx, &step_lock).await {
                    error!("Sync loop error: {e}");
                }
                tokio::time::sleep(TICK).await;
            }
        });

        *self.task.lock().unwrap() = Some(handle);
        info!("Sync scheduler started");
        Ok(())
    }

    /// Cooperative stop: the loop exits at its next wake-up; an in-flight
    /// tick is aborted at its next suspension point.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        info!("Sync scheduler stopped");
    }

    /// Executes a single step on demand, bypassing the enabled flag. Still
    /// takes the step mutex; runs to completion (no cancellation).
    pub async fn trigger_step(&self, step_name: &str) -> Result<()> {
        let Some(step) = self.ctx.states.get_by_step(step_name)? else {
            return Err(crate::errors::Error::Repository(format!(
                "unknown sync step: {step_name}"
            )));
        };

        let _guard = self.step_lock.lock().await;
        Self::execute_step(&self.ctx, &step).await;
        Ok(())
    }

    async fn run_due_steps(ctx: &Arc<SyncContext>, step_lock: &Mutex<()>) -> Result<()> {
        let steps = ctx.states.list_enabled()?;
        let now = Utc::now().naive_utc();

        for step in steps {
            if let Some(last_sync) = step.last_sync_at {
                let elapsed = (now - last_sync).num_seconds();
                if elapsed < step.interval_seconds {
                    continue;
                }
            }

            let _guard = step_lock.lock().await;
            Self::execute_step(ctx, &step).await;
        }

        Ok(())
    }

    /// Runs one step: fetch → dispatch → record.
    ///
    /// On success the watermark advances to the tick's start time - not to
    /// "now after processing" - so rows the ERP wrote during the run are
    /// re-presented next tick. The importers' update-on-duplicate semantics
    /// make that replay idempotent. (The alternative watermark, max of the
    /// returned RecordDate values, would trust the ERP clock instead; with
    /// skewed clocks both schemes can miss rows, this one at least never
    /// depends on remote time.)
    ///
    /// On failure the watermark stays, `last_error` is recorded truncated,
    /// and the next tick retries the same window.
    async fn execute_step(ctx: &Arc<SyncContext>, step: &SyncState) {
        let start_time = Utc::now();

        let outcome = Self::fetch_and_dispatch(ctx, step).await;
        let duration_ms = (Utc::now() - start_time).num_milliseconds();

        match outcome {
            Ok(outcome) => {
                let counters = StepCounters {
                    fetched: outcome.fetched as i64,
                    created: outcome.created_count as i64,
                    updated: outcome.updated_count as i64,
                    errors: outcome.errors.len() as i64,
                };

                if let Err(e) = ctx
                    .states
                    .record_success(&step.step_name, start_time.naive_utc(), counters)
                    .await
                {
                    error!("Failed to record sync state for {}: {e}", step.step_name);
                    return;
                }

                let log = NewSyncLog {
                    step_name: step.step_name.clone(),
                    status: SyncRunStatus::Success,
                    fetched_count: counters.fetched,
                    created_count: counters.created,
                    updated_count: counters.updated,
                    error_count: counters.errors,
                    duration_ms: Some(duration_ms),
                    error_message: None,
                };
                if let Err(e) = ctx.logs.append(log).await {
                    error!("Failed to append sync log for {}: {e}", step.step_name);
                }

                info!(
                    "Sync {}: success ({duration_ms}ms, +{}, ~{})",
                    step.step_name, counters.created, counters.updated
                );
            }
            Err(e) => {
                error!("Sync {} failed: {e}", step.step_name);

                let message: String = e.to_string().chars().take(MAX_ERROR_LEN).collect();

                if let Err(record_err) = ctx.states.record_failure(&step.step_name, &message).await
                {
                    error!(
                        "Failed to record sync failure for {}: {record_err}",
                        step.step_name
                    );
                }

                let log = NewSyncLog {
                    step_name: step.step_name.clone(),
                    status: SyncRunStatus::Error,
                    fetched_count: 0,
                    created_count: 0,
                    updated_count: 0,
                    error_count: 0,
                    duration_ms: Some(duration_ms),
                    error_message: Some(message),
                };
                if let Err(e) = ctx.logs.append(log).await {
                    error!("Failed to append sync log for {}: {e}", step.step_name);
                }
            }
        }
    }

    async fn fetch_and_dispatch(
        ctx: &Arc<SyncContext>,
        step: &SyncState,
    ) -> Result<DispatchOutcome> {
        // Incremental filter from the watermark; first run looks back a
        // configured number of days.
        let since = match step.last_sync_at {
            Some(watermark) => format_filter_datetime(watermark.and_utc()),
            None => format_filter_datetime(
                Utc::now() - ChronoDuration::days(ctx.settings.initial_lookback_days),
            ),
        };

        let date_filter = format!("{} >= '{since}'", step.date_field);
        let full_filter = match &step.filter_template {
            Some(template) if !template.is_empty() => format!("{template} AND {date_filter}"),
            _ => date_filter,
        };

        let properties = step.property_list();
        let property_refs: Vec<&str> = properties.iter().map(String::as_str).collect();

        let page = ctx
            .client
            .load_collection(
                CollectionRequest::new(step.ido_name.clone(), &property_refs)
                    .with_filter(full_filter),
            )
            .await?;

        info!("Sync {}: fetched {} rows", step.step_name, page.data.len());

        let mut outcome = dispatch_step(ctx, &step.step_name, page.data.clone()).await?;
        outcome.fetched = page.data.len();
        Ok(outcome)
    }

    async fn ensure_default_steps(&self) -> Result<()> {
        if self.ctx.states.list_all()?.is_empty() {
            self.ctx.states.seed(default_steps()).await?;
            info!("Seeded default sync steps");
        }
        Ok(())
    }
}
