//! Batch and batch-set repository backed by SQLite.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::batches::{
    Batch, BatchFreeze, BatchRepositoryTrait, BatchSet, BatchSetStatus, NewBatch, NewBatchSet,
};
use gestima_core::errors::{DatabaseError, Error, Result};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{batch_sets, batches};
use crate::utils::dec_to_db;

use super::model::{BatchDB, BatchSetDB, NewBatchDB, NewBatchSetDB};

pub struct BatchRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl BatchRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BatchRepositoryTrait for BatchRepository {
    async fn create_set(&self, new_set: NewBatchSet) -> Result<BatchSet> {
        self.writer
            .exec(move |conn| {
                let db_set: NewBatchSetDB = new_set.into();
                let inserted: BatchSetDB = diesel::insert_into(batch_sets::table)
                    .values(&db_set)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    async fn create(&self, new_batch: NewBatch) -> Result<Batch> {
        self.writer
            .exec(move |conn| {
                let db_batch: NewBatchDB = new_batch.into();
                let inserted: BatchDB = diesel::insert_into(batches::table)
                    .values(&db_batch)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    fn get_set_by_id(&self, set_id: i64) -> Result<BatchSet> {
        let mut conn = get_connection(&self.pool)?;
        let set: BatchSetDB = batch_sets::table
            .filter(batch_sets::id.eq(set_id))
            .filter(batch_sets::deleted_at.is_null())
            .select(BatchSetDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("batch set {set_id}")))
            })?;
        Ok(set.into())
    }

    fn get_by_id(&self, batch_id: i64) -> Result<Batch> {
        let mut conn = get_connection(&self.pool)?;
        let batch: BatchDB = batches::table
            .filter(batches::id.eq(batch_id))
            .filter(batches::deleted_at.is_null())
            .select(BatchDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("batch {batch_id}")))
            })?;
        Ok(batch.into())
    }

    fn list_for_set(&self, set_id: i64) -> Result<Vec<Batch>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<BatchDB> = batches::table
            .filter(batches::batch_set_id.eq(set_id))
            .filter(batches::deleted_at.is_null())
            .order(batches::quantity.asc())
            .select(BatchDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn latest_frozen_set_for_part(&self, part_id: i64) -> Result<Option<BatchSet>> {
        let mut conn = get_connection(&self.pool)?;
        let set: Option<BatchSetDB> = batch_sets::table
            .filter(batch_sets::part_id.eq(part_id))
            .filter(batch_sets::status.eq(BatchSetStatus::Frozen.as_str()))
            .filter(batch_sets::deleted_at.is_null())
            .order(batch_sets::updated_at.desc())
            .select(BatchSetDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(set.map(Into::into))
    }

    fn first_batch_in_set(&self, set_id: i64) -> Result<Option<Batch>> {
        let mut conn = get_connection(&self.pool)?;
        let batch: Option<BatchDB> = batches::table
            .filter(batches::batch_set_id.eq(set_id))
            .filter(batches::deleted_at.is_null())
            .order(batches::id.asc())
            .select(BatchDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(batch.map(Into::into))
    }

    fn list_frozen_for_part(&self, part_id: i64) -> Result<Vec<Batch>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<BatchDB> = batches::table
            .inner_join(batch_sets::table.on(batches::batch_set_id.eq(batch_sets::id.nullable())))
            .filter(batches::part_id.eq(part_id))
            .filter(batch_sets::status.eq(BatchSetStatus::Frozen.as_str()))
            .filter(batches::deleted_at.is_null())
            .filter(batch_sets::deleted_at.is_null())
            .order(batches::quantity.asc())
            .select(BatchDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply_freeze(
        &self,
        set_id: i64,
        frozen_at: NaiveDateTime,
        frozen_by: Option<String>,
        batch_freezes: Vec<BatchFreeze>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(
                    batch_sets::table
                        .filter(batch_sets::id.eq(set_id))
                        .filter(batch_sets::deleted_at.is_null()),
                )
                .set((
                    batch_sets::status.eq(BatchSetStatus::Frozen.as_str()),
                    batch_sets::frozen_at.eq(frozen_at),
                    batch_sets::frozen_by.eq(frozen_by.clone()),
                    batch_sets::updated_at.eq(frozen_at),
                    batch_sets::updated_by.eq(frozen_by.clone()),
                    batch_sets::version.eq(batch_sets::version + 1),
                ))
                .execute(conn)
                .into_core()?;

                for freeze in batch_freezes {
                    let snapshot_raw = serde_json::to_string(&freeze.snapshot_data)
                        .map_err(|e| Error::Unexpected(e.to_string()))?;
                    diesel::update(
                        batches::table
                            .filter(batches::id.eq(freeze.batch_id))
                            .filter(batches::deleted_at.is_null()),
                    )
                    .set((
                        batches::is_frozen.eq(true),
                        batches::frozen_at.eq(frozen_at),
                        batches::frozen_by.eq(frozen_by.clone()),
                        batches::snapshot_data.eq(snapshot_raw),
                        batches::unit_price_frozen.eq(dec_to_db(freeze.unit_price_frozen)),
                        batches::total_price_frozen.eq(dec_to_db(freeze.total_price_frozen)),
                        batches::updated_at.eq(frozen_at),
                        batches::updated_by.eq(frozen_by.clone()),
                        batches::version.eq(batches::version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;
                }

                Ok(())
            })
            .await
    }

    async fn soft_delete_set(&self, set_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();

                // Cascade: the set's batches go with it.
                diesel::update(
                    batches::table
                        .filter(batches::batch_set_id.eq(set_id))
                        .filter(batches::deleted_at.is_null()),
                )
                .set((
                    batches::deleted_at.eq(now),
                    batches::deleted_by.eq(deleted_by.clone()),
                    batches::updated_at.eq(now),
                    batches::version.eq(batches::version + 1),
                ))
                .execute(conn)
                .into_core()?;

                let affected = diesel::update(
                    batch_sets::table
                        .filter(batch_sets::id.eq(set_id))
                        .filter(batch_sets::deleted_at.is_null()),
                )
                .set((
                    batch_sets::deleted_at.eq(now),
                    batch_sets::deleted_by.eq(deleted_by.clone()),
                    batch_sets::updated_at.eq(now),
                    batch_sets::version.eq(batch_sets::version + 1),
                ))
                .execute(conn)
                .into_core()?;

                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "batch set {set_id}"
                    ))));
                }
                Ok(())
            })
            .await
    }
}
