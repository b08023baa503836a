//! Operation repository backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::operations::{
    NewOperation, Operation, OperationImportUpdate, OperationRepositoryTrait,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::operations;
use crate::schema::operations::dsl::*;

use super::model::{NewOperationDB, OperationDB};

pub struct OperationRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl OperationRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl OperationRepositoryTrait for OperationRepository {
    fn get_by_id(&self, op_id: i64) -> Result<Operation> {
        let mut conn = get_connection(&self.pool)?;
        let op: OperationDB = operations
            .filter(id.eq(op_id))
            .filter(deleted_at.is_null())
            .select(OperationDB::as_select())
            .first(&mut conn)
            .into_core()?;
        Ok(op.into())
    }

    fn find_by_part_and_seq(&self, part: i64, sequence: i32) -> Result<Option<Operation>> {
        let mut conn = get_connection(&self.pool)?;
        let op: Option<OperationDB> = operations
            .filter(part_id.eq(part))
            .filter(seq.eq(sequence))
            .filter(deleted_at.is_null())
            .select(OperationDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(op.map(Into::into))
    }

    fn list_for_part(&self, part: i64) -> Result<Vec<Operation>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<OperationDB> = operations
            .filter(part_id.eq(part))
            .filter(deleted_at.is_null())
            .order(seq.asc())
            .select(OperationDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn seq_index_for_parts(&self, part_ids: &[i64]) -> Result<Vec<(i64, i32, i64)>> {
        let mut conn = get_connection(&self.pool)?;
        operations
            .filter(part_id.eq_any(part_ids))
            .filter(deleted_at.is_null())
            .select((part_id, seq, id))
            .load::<(i64, i32, i64)>(&mut conn)
            .into_core()
    }

    async fn apply_import(
        &self,
        creates: Vec<NewOperation>,
        updates: Vec<OperationImportUpdate>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn| {
                let created = creates.len();
                for new_op in creates {
                    let db_op: NewOperationDB = new_op.into();
                    diesel::insert_into(operations::table)
                        .values(&db_op)
                        .execute(conn)
                        .into_core()?;
                }

                let mut updated = 0;
                let now = Utc::now().naive_utc();
                for update in updates {
                    let affected = diesel::update(
                        operations
                            .filter(id.eq(update.id))
                            .filter(deleted_at.is_null()),
                    )
                    .set((
                        work_center_id.eq(update.work_center_id),
                        setup_time_min.eq(update.setup_time_min),
                        operation_time_min.eq(update.operation_time_min),
                        manning_coefficient.eq(update.manning_coefficient),
                        updated_at.eq(now),
                        updated_by.eq(update.updated_by),
                        version.eq(version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;
                    updated += affected;
                }

                Ok((created, updated))
            })
            .await
    }
}
