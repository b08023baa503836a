//! Database models for production records.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::production::{NewProductionRecord, ProductionRecord};

use crate::utils::audit_from_columns;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::production_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductionRecordDB {
    pub id: i64,
    pub part_id: i64,
    pub infor_order_number: String,
    pub operation_seq: Option<i32>,
    pub work_center_id: Option<i64>,
    pub batch_quantity: Option<i32>,
    pub planned_time_min: f64,
    pub planned_labor_time_min: f64,
    pub planned_setup_min: f64,
    pub actual_setup_min: Option<f64>,
    pub actual_run_machine_min: Option<f64>,
    pub actual_run_labor_min: Option<f64>,
    pub actual_time_min: Option<f64>,
    pub actual_labor_time_min: Option<f64>,
    pub manning_coefficient: f64,
    pub actual_manning_coefficient: Option<f64>,
    pub source: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<ProductionRecordDB> for ProductionRecord {
    fn from(db: ProductionRecordDB) -> Self {
        ProductionRecord {
            id: db.id,
            part_id: db.part_id,
            infor_order_number: db.infor_order_number,
            operation_seq: db.operation_seq,
            work_center_id: db.work_center_id,
            batch_quantity: db.batch_quantity,
            planned_time_min: db.planned_time_min,
            planned_labor_time_min: db.planned_labor_time_min,
            planned_setup_min: db.planned_setup_min,
            actual_setup_min: db.actual_setup_min,
            actual_run_machine_min: db.actual_run_machine_min,
            actual_run_labor_min: db.actual_run_labor_min,
            actual_time_min: db.actual_time_min,
            actual_labor_time_min: db.actual_labor_time_min,
            manning_coefficient: db.manning_coefficient,
            actual_manning_coefficient: db.actual_manning_coefficient,
            source: db.source,
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
#[diesel(table_name = crate::schema::production_records)]
pub struct NewProductionRecordDB {
    pub part_id: i64,
    pub infor_order_number: String,
    pub operation_seq: Option<i32>,
    pub work_center_id: Option<i64>,
    pub batch_quantity: Option<i32>,
    pub planned_time_min: f64,
    pub planned_labor_time_min: f64,
    pub planned_setup_min: f64,
    pub actual_setup_min: Option<f64>,
    pub actual_run_machine_min: Option<f64>,
    pub actual_run_labor_min: Option<f64>,
    pub actual_time_min: Option<f64>,
    pub actual_labor_time_min: Option<f64>,
    pub manning_coefficient: f64,
    pub actual_manning_coefficient: Option<f64>,
    pub source: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewProductionRecord> for NewProductionRecordDB {
    fn from(record: NewProductionRecord) -> Self {
        let now = Utc::now().naive_utc();
        NewProductionRecordDB {
            part_id: record.part_id,
            infor_order_number: record.infor_order_number,
            operation_seq: record.operation_seq,
            work_center_id: record.work_center_id,
            batch_quantity: record.batch_quantity,
            planned_time_min: record.planned_time_min,
            planned_labor_time_min: record.planned_labor_time_min,
            planned_setup_min: record.planned_setup_min,
            actual_setup_min: record.actual_setup_min,
            actual_run_machine_min: record.actual_run_machine_min,
            actual_run_labor_min: record.actual_run_labor_min,
            actual_time_min: record.actual_time_min,
            actual_labor_time_min: record.actual_labor_time_min,
            manning_coefficient: record.manning_coefficient,
            actual_manning_coefficient: record.actual_manning_coefficient,
            source: record.source,
            created_at: now,
            updated_at: now,
            created_by: record.created_by.clone(),
            updated_by: record.created_by,
        }
    }
}
