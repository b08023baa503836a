//! Database models for operations.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::operations::{NewOperation, Operation};

use crate::utils::{audit_from_columns, dec_from_db, dec_to_db};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::operations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OperationDB {
    pub id: i64,
    pub part_id: i64,
    pub seq: i32,
    pub name: String,
    pub work_center_id: Option<i64>,
    pub setup_time_min: f64,
    pub operation_time_min: f64,
    pub manning_coefficient: f64,
    pub machine_utilization_coefficient: f64,
    pub is_coop: bool,
    pub coop_price: String,
    pub coop_min_price: String,
    pub coop_days: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<OperationDB> for Operation {
    fn from(db: OperationDB) -> Self {
        Operation {
            id: db.id,
            part_id: db.part_id,
            seq: db.seq,
            name: db.name,
            work_center_id: db.work_center_id,
            setup_time_min: db.setup_time_min,
            operation_time_min: db.operation_time_min,
            manning_coefficient: db.manning_coefficient,
            machine_utilization_coefficient: db.machine_utilization_coefficient,
            is_coop: db.is_coop,
            coop_price: dec_from_db(&db.coop_price, "coop_price"),
            coop_min_price: dec_from_db(&db.coop_min_price, "coop_min_price"),
            coop_days: db.coop_days,
            audit: audit_from_columns((
                db.created_at,
                db.updated_at,
                db.created_by,
                db.updated_by,
                db.deleted_at,
                db.deleted_by,
                db.version,
            )),
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::operations)]
pub struct NewOperationDB {
    pub part_id: i64,
    pub seq: i32,
    pub name: String,
    pub work_center_id: Option<i64>,
    pub setup_time_min: f64,
    pub operation_time_min: f64,
    pub manning_coefficient: f64,
    pub machine_utilization_coefficient: f64,
    pub is_coop: bool,
    pub coop_price: String,
    pub coop_min_price: String,
    pub coop_days: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewOperation> for NewOperationDB {
    fn from(new_op: NewOperation) -> Self {
        let now = Utc::now().naive_utc();
        NewOperationDB {
            part_id: new_op.part_id,
            seq: new_op.seq,
            name: new_op.name,
            work_center_id: new_op.work_center_id,
            setup_time_min: new_op.setup_time_min,
            operation_time_min: new_op.operation_time_min,
            manning_coefficient: new_op.manning_coefficient,
            machine_utilization_coefficient: new_op.machine_utilization_coefficient,
            is_coop: new_op.is_coop,
            coop_price: dec_to_db(new_op.coop_price),
            coop_min_price: dec_to_db(new_op.coop_min_price),
            coop_days: new_op.coop_days,
            created_at: now,
            updated_at: now,
            created_by: new_op.created_by.clone(),
            updated_by: new_op.created_by,
        }
    }
}
