//! Sync state and log repositories backed by SQLite.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::errors::{DatabaseError, Error, Result};
use gestima_core::sync::{
    NewSyncLog, NewSyncState, StepCounters, SyncLog, SyncLogRepositoryTrait, SyncState,
    SyncStateRepositoryTrait,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{sync_logs, sync_states};

use super::model::{NewSyncLogDB, NewSyncStateDB, SyncLogDB, SyncStateDB};

pub struct SyncStateRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SyncStateRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncStateRepositoryTrait for SyncStateRepository {
    fn list_all(&self) -> Result<Vec<SyncState>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<SyncStateDB> = sync_states::table
            .order(sync_states::step_name.asc())
            .select(SyncStateDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_enabled(&self) -> Result<Vec<SyncState>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<SyncStateDB> = sync_states::table
            .filter(sync_states::enabled.eq(true))
            .order(sync_states::step_name.asc())
            .select(SyncStateDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn get_by_step(&self, step: &str) -> Result<Option<SyncState>> {
        let mut conn = get_connection(&self.pool)?;
        let state: Option<SyncStateDB> = sync_states::table
            .filter(sync_states::step_name.eq(step))
            .select(SyncStateDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(state.map(Into::into))
    }

    async fn seed(&self, steps: Vec<NewSyncState>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                for step in steps {
                    let db_step: NewSyncStateDB = step.into();
                    diesel::insert_into(sync_states::table)
                        .values(&db_step)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(())
            })
            .await
    }

    async fn record_success(
        &self,
        step: &str,
        watermark: NaiveDateTime,
        counters: StepCounters,
    ) -> Result<()> {
        let step = step.to_string();
        self.writer
            .exec(move |conn| {
                let affected =
                    diesel::update(sync_states::table.filter(sync_states::step_name.eq(&step)))
                        .set((
                            sync_states::last_sync_at.eq(watermark),
                            sync_states::created_count.eq(counters.created),
                            sync_states::updated_count.eq(counters.updated),
                            sync_states::error_count.eq(counters.errors),
                            sync_states::last_error.eq(None::<String>),
                            sync_states::updated_at.eq(Utc::now().naive_utc()),
                        ))
                        .execute(conn)
                        .into_core()?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "sync step {step}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    async fn record_failure(&self, step: &str, error: &str) -> Result<()> {
        let step = step.to_string();
        let error = error.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(sync_states::table.filter(sync_states::step_name.eq(&step)))
                    .set((
                        sync_states::last_error.eq(error),
                        sync_states::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn set_enabled(&self, step: &str, value: bool) -> Result<()> {
        let step = step.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(sync_states::table.filter(sync_states::step_name.eq(&step)))
                    .set((
                        sync_states::enabled.eq(value),
                        sync_states::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }
}

pub struct SyncLogRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SyncLogRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncLogRepositoryTrait for SyncLogRepository {
    async fn append(&self, log: NewSyncLog) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let db_log: NewSyncLogDB = log.into();
                diesel::insert_into(sync_logs::table)
                    .values(&db_log)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    fn list_recent(&self, step: Option<&str>, limit: i64) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = sync_logs::table.into_boxed();
        if let Some(step) = step {
            query = query.filter(sync_logs::step_name.eq(step.to_string()));
        }

        let rows: Vec<SyncLogDB> = query
            .order(sync_logs::created_at.desc())
            .limit(limit)
            .select(SyncLogDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
