//! Database models for parts.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::parts::{NewPart, Part, PartStatus, StockShape};

use crate::utils::audit_from_columns;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::parts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PartDB {
    pub id: i64,
    pub part_number: String,
    pub article_number: Option<String>,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub revision: Option<String>,
    pub customer_revision: Option<String>,
    pub status: String,
    pub source: Option<String>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub length: f64,
    pub notes: Option<String>,
    pub file_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<PartDB> for Part {
    fn from(db: PartDB) -> Self {
        Part {
            id: db.id,
            part_number: db.part_number,
            article_number: db.article_number,
            name: db.name,
            drawing_number: db.drawing_number,
            revision: db.revision,
            customer_revision: db.customer_revision,
            status: PartStatus::parse(&db.status),
            source: db.source,
            stock_shape: db.stock_shape.as_deref().map(StockShape::parse),
            stock_diameter: db.stock_diameter,
            stock_length: db.stock_length,
            stock_width: db.stock_width,
            stock_height: db.stock_height,
            stock_wall_thickness: db.stock_wall_thickness,
            length: db.length,
            notes: db.notes,
            file_id: db.file_id,
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
#[diesel(table_name = crate::schema::parts)]
pub struct NewPartDB {
    pub part_number: String,
    pub article_number: Option<String>,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub revision: Option<String>,
    pub customer_revision: Option<String>,
    pub status: String,
    pub source: Option<String>,
    pub stock_shape: Option<String>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub length: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewPart> for NewPartDB {
    fn from(new_part: NewPart) -> Self {
        let now = Utc::now().naive_utc();
        NewPartDB {
            part_number: new_part.part_number,
            article_number: new_part.article_number,
            name: new_part.name,
            drawing_number: new_part.drawing_number,
            revision: new_part.revision,
            customer_revision: new_part.customer_revision,
            status: new_part.status.as_str().to_string(),
            source: new_part.source,
            stock_shape: new_part.stock_shape.map(|s| s.as_str().to_string()),
            stock_diameter: new_part.stock_diameter,
            stock_length: new_part.stock_length,
            stock_width: new_part.stock_width,
            stock_height: new_part.stock_height,
            stock_wall_thickness: new_part.stock_wall_thickness,
            length: new_part.length,
            notes: new_part.notes,
            created_at: now,
            updated_at: now,
            created_by: new_part.created_by.clone(),
            updated_by: new_part.created_by,
        }
    }
}
