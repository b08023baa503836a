//! Material repository backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::materials::{
    MaterialInput, MaterialInputUpsert, MaterialItem, MaterialItemImportUpdate,
    MaterialRepositoryTrait, NewMaterialItem,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{material_inputs, material_items, material_operation_links};

use super::model::{MaterialInputDB, MaterialItemDB, NewMaterialInputDB, NewMaterialItemDB};

pub struct MaterialRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl MaterialRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MaterialRepositoryTrait for MaterialRepository {
    fn get_item_by_code(&self, item_code: &str) -> Result<Option<MaterialItem>> {
        let mut conn = get_connection(&self.pool)?;
        let item: Option<MaterialItemDB> = material_items::table
            .filter(material_items::code.eq(item_code))
            .filter(material_items::deleted_at.is_null())
            .select(MaterialItemDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(item.map(Into::into))
    }

    fn list_items_by_codes(&self, codes: &[String]) -> Result<Vec<MaterialItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<MaterialItemDB> = material_items::table
            .filter(material_items::code.eq_any(codes))
            .filter(material_items::deleted_at.is_null())
            .select(MaterialItemDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply_item_import(
        &self,
        creates: Vec<NewMaterialItem>,
        updates: Vec<MaterialItemImportUpdate>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn| {
                let created = creates.len();
                for new_item in creates {
                    let db_item: NewMaterialItemDB = new_item.into();
                    diesel::insert_into(material_items::table)
                        .values(&db_item)
                        .execute(conn)
                        .into_core()?;
                }

                let mut updated = 0;
                let now = Utc::now().naive_utc();
                for update in updates {
                    if let Some(new_name) = update.name.filter(|n| !n.is_empty()) {
                        updated += diesel::update(
                            material_items::table
                                .filter(material_items::id.eq(update.id))
                                .filter(material_items::deleted_at.is_null()),
                        )
                        .set((
                            material_items::name.eq(new_name),
                            material_items::updated_at.eq(now),
                            material_items::updated_by.eq(update.updated_by),
                            material_items::version.eq(material_items::version + 1),
                        ))
                        .execute(conn)
                        .into_core()?;
                    }
                }

                Ok((created, updated))
            })
            .await
    }

    fn list_inputs_for_part(&self, part: i64) -> Result<Vec<MaterialInput>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<MaterialInputDB> = material_inputs::table
            .filter(material_inputs::part_id.eq(part))
            .filter(material_inputs::deleted_at.is_null())
            .order(material_inputs::seq.asc())
            .select(MaterialInputDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_inputs_for_part(
        &self,
        part: i64,
        rows: Vec<MaterialInputUpsert>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn| {
                let mut created = 0;
                let mut updated = 0;
                let now = Utc::now().naive_utc();

                for row in rows {
                    let existing_id: Option<i64> = material_inputs::table
                        .filter(material_inputs::part_id.eq(part))
                        .filter(material_inputs::material_item_id.eq(row.material_item_id))
                        .filter(material_inputs::deleted_at.is_null())
                        .select(material_inputs::id)
                        .first(conn)
                        .optional()
                        .into_core()?;

                    match existing_id {
                        Some(input_id) => {
                            diesel::update(
                                material_inputs::table.filter(material_inputs::id.eq(input_id)),
                            )
                            .set((
                                material_inputs::quantity.eq(row.quantity),
                                material_inputs::stock_diameter.eq(row.stock_diameter),
                                material_inputs::stock_length.eq(row.stock_length),
                                material_inputs::stock_width.eq(row.stock_width),
                                material_inputs::stock_height.eq(row.stock_height),
                                material_inputs::stock_wall_thickness
                                    .eq(row.stock_wall_thickness),
                                material_inputs::updated_at.eq(now),
                                material_inputs::version.eq(material_inputs::version + 1),
                            ))
                            .execute(conn)
                            .into_core()?;
                            updated += 1;
                        }
                        None => {
                            let db_input = NewMaterialInputDB {
                                part_id: part,
                                seq: row.seq,
                                price_category_id: row.price_category_id,
                                material_item_id: Some(row.material_item_id),
                                stock_shape: row
                                    .stock_shape
                                    .map(|s| s.as_str().to_string()),
                                stock_diameter: row.stock_diameter,
                                stock_length: row.stock_length,
                                stock_width: row.stock_width,
                                stock_height: row.stock_height,
                                stock_wall_thickness: row.stock_wall_thickness,
                                quantity: row.quantity,
                                notes: row.notes,
                                created_at: now,
                                updated_at: now,
                                created_by: Some("sync".to_string()),
                                updated_by: Some("sync".to_string()),
                            };
                            let inserted: MaterialInputDB =
                                diesel::insert_into(material_inputs::table)
                                    .values(&db_input)
                                    .get_result(conn)
                                    .into_core()?;

                            if let Some(operation_id) = row.operation_id {
                                diesel::insert_into(material_operation_links::table)
                                    .values((
                                        material_operation_links::material_input_id
                                            .eq(inserted.id),
                                        material_operation_links::operation_id.eq(operation_id),
                                        material_operation_links::consumed_quantity
                                            .eq(None::<f64>),
                                    ))
                                    .execute(conn)
                                    .into_core()?;
                            }
                            created += 1;
                        }
                    }
                }

                Ok((created, updated))
            })
            .await
    }
}
