//! Database models for material items and inputs.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::materials::{MaterialInput, MaterialItem, NewMaterialItem};
use gestima_core::parts::StockShape;

use crate::utils::audit_from_columns;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::material_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MaterialItemDB {
    pub id: i64,
    pub material_number: String,
    pub code: String,
    pub name: Option<String>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub price_category_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<MaterialItemDB> for MaterialItem {
    fn from(db: MaterialItemDB) -> Self {
        MaterialItem {
            id: db.id,
            material_number: db.material_number,
            code: db.code,
            name: db.name,
            stock_shape: db.stock_shape.as_deref().map(StockShape::parse),
            stock_diameter: db.stock_diameter,
            stock_length: db.stock_length,
            stock_width: db.stock_width,
            stock_height: db.stock_height,
            stock_wall_thickness: db.stock_wall_thickness,
            price_category_id: db.price_category_id,
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
#[diesel(table_name = crate::schema::material_items)]
pub struct NewMaterialItemDB {
    pub material_number: String,
    pub code: String,
    pub name: Option<String>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub price_category_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewMaterialItem> for NewMaterialItemDB {
    fn from(new_item: NewMaterialItem) -> Self {
        let now = Utc::now().naive_utc();
        NewMaterialItemDB {
            material_number: new_item.material_number,
            code: new_item.code,
            name: new_item.name,
            stock_shape: new_item.stock_shape.map(|s| s.as_str().to_string()),
            stock_diameter: new_item.stock_diameter,
            stock_length: new_item.stock_length,
            stock_width: new_item.stock_width,
            stock_height: new_item.stock_height,
            stock_wall_thickness: new_item.stock_wall_thickness,
            price_category_id: new_item.price_category_id,
            created_at: now,
            updated_at: now,
            created_by: new_item.created_by.clone(),
            updated_by: new_item.created_by,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::material_inputs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MaterialInputDB {
    pub id: i64,
    pub part_id: i64,
    pub seq: i32,
    pub price_category_id: Option<i64>,
    pub material_item_id: Option<i64>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub quantity: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<MaterialInputDB> for MaterialInput {
    fn from(db: MaterialInputDB) -> Self {
        MaterialInput {
            id: db.id,
            part_id: db.part_id,
            seq: db.seq,
            price_category_id: db.price_category_id,
            material_item_id: db.material_item_id,
            stock_shape: db.stock_shape.as_deref().map(StockShape::parse),
            stock_diameter: db.stock_diameter,
            stock_length: db.stock_length,
            stock_width: db.stock_width,
            stock_height: db.stock_height,
            stock_wall_thickness: db.stock_wall_thickness,
            quantity: db.quantity,
            notes: db.notes,
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
#[diesel(table_name = crate::schema::material_inputs)]
pub struct NewMaterialInputDB {
    pub part_id: i64,
    pub seq: i32,
    pub price_category_id: Option<i64>,
    pub material_item_id: Option<i64>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub quantity: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
