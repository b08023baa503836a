//! Work center repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::work_centers::{NewWorkCenter, WorkCenter, WorkCenterRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::work_centers;
use crate::schema::work_centers::dsl::*;

use super::model::{NewWorkCenterDB, WorkCenterDB};

pub struct WorkCenterRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl WorkCenterRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl WorkCenterRepositoryTrait for WorkCenterRepository {
    async fn create(&self, new_work_center: NewWorkCenter) -> Result<WorkCenter> {
        self.writer
            .exec(move |conn| {
                let db_wc: NewWorkCenterDB = new_work_center.into();
                let inserted: WorkCenterDB = diesel::insert_into(work_centers::table)
                    .values(&db_wc)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    fn get_by_id(&self, wc_id: i64) -> Result<WorkCenter> {
        let mut conn = get_connection(&self.pool)?;
        let wc: WorkCenterDB = work_centers
            .filter(id.eq(wc_id))
            .filter(deleted_at.is_null())
            .select(WorkCenterDB::as_select())
            .first(&mut conn)
            .into_core()?;
        Ok(wc.into())
    }

    fn id_by_number(&self, number: &str) -> Result<Option<i64>> {
        let mut conn = get_connection(&self.pool)?;
        work_centers
            .filter(work_center_number.eq(number))
            .filter(deleted_at.is_null())
            .select(id)
            .first::<i64>(&mut conn)
            .optional()
            .into_core()
    }

    fn ids_by_numbers(&self, numbers: &[String]) -> Result<Vec<(String, i64)>> {
        let mut conn = get_connection(&self.pool)?;
        work_centers
            .filter(work_center_number.eq_any(numbers))
            .filter(deleted_at.is_null())
            .select((work_center_number, id))
            .load::<(String, i64)>(&mut conn)
            .into_core()
    }

    fn list_active(&self) -> Result<Vec<WorkCenter>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<WorkCenterDB> = work_centers
            .filter(deleted_at.is_null())
            .filter(is_active.eq(true))
            .order(work_center_number.asc())
            .select(WorkCenterDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
