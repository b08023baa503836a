//! Database models for batches and batch sets.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use log::error;

use gestima_core::batches::{
    generate_batch_set_name, Batch, BatchSet, BatchSetStatus, NewBatch, NewBatchSet,
};

use crate::utils::{audit_from_columns, dec_from_db, dec_to_db, opt_dec_from_db, opt_dec_to_db};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::batches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchDB {
    pub id: i64,
    pub batch_number: String,
    pub part_id: i64,
    pub batch_set_id: Option<i64>,
    pub quantity: i32,
    pub is_default: bool,
    pub unit_time_min: f64,
    pub material_cost: String,
    pub machining_cost: String,
    pub setup_cost: String,
    pub overhead_cost: String,
    pub margin_cost: String,
    pub coop_cost: String,
    pub unit_cost: String,
    pub total_cost: String,
    pub material_weight_kg: Option<f64>,
    pub material_price_per_kg: Option<String>,
    pub is_frozen: bool,
    pub frozen_at: Option<NaiveDateTime>,
    pub frozen_by: Option<String>,
    pub snapshot_data: Option<String>,
    pub unit_price_frozen: Option<String>,
    pub total_price_frozen: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<BatchDB> for Batch {
    fn from(db: BatchDB) -> Self {
        let snapshot_data = db.snapshot_data.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| error!("Corrupted batch snapshot for {}: {e}", db.batch_number))
                .ok()
        });
        Batch {
            id: db.id,
            batch_number: db.batch_number,
            part_id: db.part_id,
            batch_set_id: db.batch_set_id,
            quantity: db.quantity,
            is_default: db.is_default,
            unit_time_min: db.unit_time_min,
            material_cost: dec_from_db(&db.material_cost, "material_cost"),
            machining_cost: dec_from_db(&db.machining_cost, "machining_cost"),
            setup_cost: dec_from_db(&db.setup_cost, "setup_cost"),
            overhead_cost: dec_from_db(&db.overhead_cost, "overhead_cost"),
            margin_cost: dec_from_db(&db.margin_cost, "margin_cost"),
            coop_cost: dec_from_db(&db.coop_cost, "coop_cost"),
            unit_cost: dec_from_db(&db.unit_cost, "unit_cost"),
            total_cost: dec_from_db(&db.total_cost, "total_cost"),
            material_weight_kg: db.material_weight_kg,
            material_price_per_kg: opt_dec_from_db(
                db.material_price_per_kg.as_ref(),
                "material_price_per_kg",
            ),
            is_frozen: db.is_frozen,
            frozen_at: db.frozen_at,
            frozen_by: db.frozen_by,
            snapshot_data,
            unit_price_frozen: opt_dec_from_db(
                db.unit_price_frozen.as_ref(),
                "unit_price_frozen",
            ),
            total_price_frozen: opt_dec_from_db(
                db.total_price_frozen.as_ref(),
                "total_price_frozen",
            ),
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
#[diesel(table_name = crate::schema::batches)]
pub struct NewBatchDB {
    pub batch_number: String,
    pub part_id: i64,
    pub batch_set_id: Option<i64>,
    pub quantity: i32,
    pub is_default: bool,
    pub unit_time_min: f64,
    pub material_cost: String,
    pub machining_cost: String,
    pub setup_cost: String,
    pub overhead_cost: String,
    pub margin_cost: String,
    pub coop_cost: String,
    pub unit_cost: String,
    pub total_cost: String,
    pub material_weight_kg: Option<f64>,
    pub material_price_per_kg: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewBatch> for NewBatchDB {
    fn from(new_batch: NewBatch) -> Self {
        let now = Utc::now().naive_utc();
        NewBatchDB {
            batch_number: new_batch.batch_number,
            part_id: new_batch.part_id,
            batch_set_id: new_batch.batch_set_id,
            quantity: new_batch.quantity,
            is_default: new_batch.is_default,
            unit_time_min: new_batch.unit_time_min,
            material_cost: dec_to_db(new_batch.material_cost),
            machining_cost: dec_to_db(new_batch.machining_cost),
            setup_cost: dec_to_db(new_batch.setup_cost),
            overhead_cost: dec_to_db(new_batch.overhead_cost),
            margin_cost: dec_to_db(new_batch.margin_cost),
            coop_cost: dec_to_db(new_batch.coop_cost),
            unit_cost: dec_to_db(new_batch.unit_cost),
            total_cost: dec_to_db(new_batch.total_cost),
            material_weight_kg: new_batch.material_weight_kg,
            material_price_per_kg: opt_dec_to_db(new_batch.material_price_per_kg),
            created_at: now,
            updated_at: now,
            created_by: new_batch.created_by.clone(),
            updated_by: new_batch.created_by,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::batch_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchSetDB {
    pub id: i64,
    pub set_number: String,
    pub part_id: Option<i64>,
    pub name: String,
    pub status: String,
    pub frozen_at: Option<NaiveDateTime>,
    pub frozen_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<BatchSetDB> for BatchSet {
    fn from(db: BatchSetDB) -> Self {
        BatchSet {
            id: db.id,
            set_number: db.set_number,
            part_id: db.part_id,
            name: db.name,
            status: BatchSetStatus::parse(&db.status),
            frozen_at: db.frozen_at,
            frozen_by: db.frozen_by,
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
#[diesel(table_name = crate::schema::batch_sets)]
pub struct NewBatchSetDB {
    pub set_number: String,
    pub part_id: Option<i64>,
    pub name: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewBatchSet> for NewBatchSetDB {
    fn from(new_set: NewBatchSet) -> Self {
        let now = Utc::now().naive_utc();
        NewBatchSetDB {
            set_number: new_set.set_number,
            part_id: new_set.part_id,
            name: new_set.name.unwrap_or_else(generate_batch_set_name),
            status: BatchSetStatus::Draft.as_str().to_string(),
            created_at: now,
            updated_at: now,
            created_by: new_set.created_by.clone(),
            updated_by: new_set.created_by,
        }
    }
}
