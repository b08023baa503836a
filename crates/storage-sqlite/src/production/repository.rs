//! Production record repository backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::production::{
    NewProductionRecord, ProductionRecord, ProductionRecordUpdate, ProductionRepositoryTrait,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::production_records;
use crate::schema::production_records::dsl::*;

use super::model::{NewProductionRecordDB, ProductionRecordDB};

pub struct ProductionRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl ProductionRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ProductionRepositoryTrait for ProductionRepository {
    fn find_duplicate(
        &self,
        part: i64,
        order_number: &str,
        seq: i32,
    ) -> Result<Option<ProductionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let record: Option<ProductionRecordDB> = production_records
            .filter(part_id.eq(part))
            .filter(infor_order_number.eq(order_number))
            .filter(operation_seq.eq(seq))
            .filter(deleted_at.is_null())
            .select(ProductionRecordDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(record.map(Into::into))
    }

    fn list_for_part(&self, part: i64) -> Result<Vec<ProductionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<ProductionRecordDB> = production_records
            .filter(part_id.eq(part))
            .filter(deleted_at.is_null())
            .order((infor_order_number.asc(), operation_seq.asc()))
            .select(ProductionRecordDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply_import(
        &self,
        creates: Vec<NewProductionRecord>,
        updates: Vec<ProductionRecordUpdate>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn| {
                let created = creates.len();
                for record in creates {
                    let db_record: NewProductionRecordDB = record.into();
                    diesel::insert_into(production_records::table)
                        .values(&db_record)
                        .execute(conn)
                        .into_core()?;
                }

                let mut updated = 0;
                let now = Utc::now().naive_utc();
                for update in updates {
                    updated += diesel::update(
                        production_records
                            .filter(id.eq(update.id))
                            .filter(deleted_at.is_null()),
                    )
                    .set((
                        work_center_id.eq(update.work_center_id),
                        batch_quantity.eq(update.batch_quantity),
                        planned_time_min.eq(update.planned_time_min),
                        planned_labor_time_min.eq(update.planned_labor_time_min),
                        planned_setup_min.eq(update.planned_setup_min),
                        actual_setup_min.eq(update.actual_setup_min),
                        actual_run_machine_min.eq(update.actual_run_machine_min),
                        actual_run_labor_min.eq(update.actual_run_labor_min),
                        actual_time_min.eq(update.actual_time_min),
                        actual_labor_time_min.eq(update.actual_labor_time_min),
                        manning_coefficient.eq(update.manning_coefficient),
                        actual_manning_coefficient.eq(update.actual_manning_coefficient),
                        updated_at.eq(now),
                        updated_by.eq(update.updated_by),
                        version.eq(version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;
                }

                Ok((created, updated))
            })
            .await
    }
}
