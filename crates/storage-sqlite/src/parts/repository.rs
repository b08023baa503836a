//! Part repository backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use gestima_core::errors::{DatabaseError, Error, Result};
use gestima_core::parts::{NewPart, Part, PartImportUpdate, PartRepositoryTrait, PartUpdate};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::parts;
use crate::schema::parts::dsl::*;

use super::model::{NewPartDB, PartDB};

pub struct PartRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl PartRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn insert_part(conn: &mut SqliteConnection, new_part: NewPart) -> Result<Part> {
    new_part.validate()?;
    let db_part: NewPartDB = new_part.into();
    let inserted: PartDB = diesel::insert_into(parts::table)
        .values(&db_part)
        .get_result(conn)
        .into_core()?;
    Ok(inserted.into())
}

fn apply_import_update(conn: &mut SqliteConnection, update: PartImportUpdate) -> Result<bool> {
    // Only non-empty external values overwrite; chained single-column
    // updates keep the statement simple under SQLite.
    let now = Utc::now().naive_utc();
    let target = parts.filter(id.eq(update.id)).filter(deleted_at.is_null());

    let mut changed = false;
    if let Some(new_name) = update.name.filter(|v| !v.is_empty()) {
        diesel::update(target.clone())
            .set(name.eq(new_name))
            .execute(conn)
            .into_core()?;
        changed = true;
    }
    if let Some(new_drawing) = update.drawing_number.filter(|v| !v.is_empty()) {
        diesel::update(target.clone())
            .set(drawing_number.eq(new_drawing))
            .execute(conn)
            .into_core()?;
        changed = true;
    }
    if let Some(new_revision) = update.customer_revision.filter(|v| !v.is_empty()) {
        diesel::update(target.clone())
            .set(customer_revision.eq(new_revision))
            .execute(conn)
            .into_core()?;
        changed = true;
    }
    if let Some(new_status) = update.status {
        diesel::update(target.clone())
            .set(status.eq(new_status.as_str()))
            .execute(conn)
            .into_core()?;
        changed = true;
    }

    if changed {
        diesel::update(target)
            .set((
                updated_at.eq(now),
                updated_by.eq(update.updated_by),
                version.eq(version + 1),
            ))
            .execute(conn)
            .into_core()?;
    }

    Ok(changed)
}

#[async_trait]
impl PartRepositoryTrait for PartRepository {
    async fn create(&self, new_part: NewPart) -> Result<Part> {
        self.writer.exec(move |conn| insert_part(conn, new_part)).await
    }

    async fn update(&self, update: PartUpdate) -> Result<Part> {
        self.writer
            .exec(move |conn| {
                let existing: PartDB = parts
                    .filter(id.eq(update.id))
                    .filter(deleted_at.is_null())
                    .select(PartDB::as_select())
                    .first(conn)
                    .optional()
                    .into_core()?
                    .ok_or_else(|| {
                        Error::Database(DatabaseError::NotFound(format!("part {}", update.id)))
                    })?;

                if existing.version != update.version {
                    return Err(Error::VersionConflict {
                        entity: "Part".to_string(),
                        expected: update.version,
                        actual: existing.version,
                    });
                }

                let now = Utc::now().naive_utc();
                diesel::update(parts.filter(id.eq(update.id)))
                    .set((
                        article_number.eq(update.article_number.or(existing.article_number)),
                        name.eq(update.name.or(existing.name)),
                        drawing_number.eq(update.drawing_number.or(existing.drawing_number)),
                        revision.eq(update.revision.or(existing.revision)),
                        customer_revision
                            .eq(update.customer_revision.or(existing.customer_revision)),
                        status.eq(update
                            .status
                            .map(|s| s.as_str().to_string())
                            .unwrap_or(existing.status)),
                        stock_shape.eq(update
                            .stock_shape
                            .map(|s| s.as_str().to_string())
                            .or(existing.stock_shape)),
                        stock_diameter.eq(update.stock_diameter.or(existing.stock_diameter)),
                        stock_length.eq(update.stock_length.or(existing.stock_length)),
                        stock_width.eq(update.stock_width.or(existing.stock_width)),
                        stock_height.eq(update.stock_height.or(existing.stock_height)),
                        stock_wall_thickness
                            .eq(update.stock_wall_thickness.or(existing.stock_wall_thickness)),
                        length.eq(update.length.unwrap_or(existing.length)),
                        notes.eq(update.notes.or(existing.notes)),
                        updated_at.eq(now),
                        updated_by.eq(update.updated_by),
                        version.eq(existing.version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;

                let refreshed: PartDB = parts
                    .filter(id.eq(update.id))
                    .select(PartDB::as_select())
                    .first(conn)
                    .into_core()?;
                Ok(refreshed.into())
            })
            .await
    }

    async fn soft_delete(&self, part_id: i64, by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let affected = diesel::update(
                    parts.filter(id.eq(part_id)).filter(deleted_at.is_null()),
                )
                .set((
                    deleted_at.eq(now),
                    deleted_by.eq(by.clone()),
                    updated_at.eq(now),
                    updated_by.eq(by),
                    version.eq(version + 1),
                ))
                .execute(conn)
                .into_core()?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "part {part_id}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    fn get_by_id(&self, part_id: i64) -> Result<Part> {
        let mut conn = get_connection(&self.pool)?;
        let part: PartDB = parts
            .filter(id.eq(part_id))
            .filter(deleted_at.is_null())
            .select(PartDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("part {part_id}"))))?;
        Ok(part.into())
    }

    fn get_by_article_number(&self, article: &str) -> Result<Option<Part>> {
        let mut conn = get_connection(&self.pool)?;
        let part: Option<PartDB> = parts
            .filter(article_number.eq(article))
            .filter(deleted_at.is_null())
            .select(PartDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(part.map(Into::into))
    }

    fn list_active(&self) -> Result<Vec<Part>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<PartDB> = parts
            .filter(deleted_at.is_null())
            .order(part_number.asc())
            .select(PartDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_by_article_numbers(&self, article_numbers: &[String]) -> Result<Vec<Part>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<PartDB> = parts
            .filter(article_number.eq_any(article_numbers))
            .filter(deleted_at.is_null())
            .select(PartDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_primary_file(
        &self,
        part_id: i64,
        new_file_id: i64,
        by: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let affected = diesel::update(
                    parts.filter(id.eq(part_id)).filter(deleted_at.is_null()),
                )
                .set((
                    file_id.eq(new_file_id),
                    updated_at.eq(now),
                    updated_by.eq(by),
                    version.eq(version + 1),
                ))
                .execute(conn)
                .into_core()?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "part {part_id}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    async fn apply_import(
        &self,
        creates: Vec<NewPart>,
        updates: Vec<PartImportUpdate>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn| {
                let mut created = 0;
                for new_part in creates {
                    insert_part(conn, new_part)?;
                    created += 1;
                }
                let mut updated = 0;
                for update in updates {
                    if apply_import_update(conn, update)? {
                        updated += 1;
                    }
                }
                Ok((created, updated))
            })
            .await
    }
}
