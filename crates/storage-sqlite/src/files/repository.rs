//! File repository backed by SQLite.
//!
//! The primary-flag arbitration lives inside the link upsert writer job so
//! the invariant - at most one active primary per
//! `(entity_type, entity_id, link_type)` - holds transactionally.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use gestima_core::errors::{Error, Result};
use gestima_core::files::{
    FileError, FileLink, FileLinkRequest, FileRecord, FileRepositoryTrait, FileStatus,
    NewFileRecord,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{file_links, file_records};

use super::model::{FileLinkDB, FileRecordDB, NewFileLinkDB, NewFileRecordDB};

pub struct FileRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl FileRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn clear_other_primaries(
    conn: &mut SqliteConnection,
    entity_type_value: &str,
    entity_id_value: i64,
    link_type_value: &str,
    keep_link_id: i64,
) -> Result<()> {
    diesel::update(
        file_links::table
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::entity_id.eq(entity_id_value))
            .filter(file_links::link_type.eq(link_type_value))
            .filter(file_links::id.ne(keep_link_id))
            .filter(file_links::deleted_at.is_null())
            .filter(file_links::is_primary.eq(true)),
    )
    .set((
        file_links::is_primary.eq(false),
        file_links::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)
    .into_core()?;
    Ok(())
}

#[async_trait]
impl FileRepositoryTrait for FileRepository {
    fn get_by_id(&self, file_id: i64) -> Result<FileRecord> {
        let mut conn = get_connection(&self.pool)?;
        let record: Option<FileRecordDB> = file_records::table
            .filter(file_records::id.eq(file_id))
            .filter(file_records::deleted_at.is_null())
            .select(FileRecordDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        record
            .map(Into::into)
            .ok_or_else(|| Error::File(FileError::NotFound(file_id)))
    }

    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord> {
        self.writer
            .exec(move |conn| {
                let db_record: NewFileRecordDB = record.into();
                let inserted: FileRecordDB = diesel::insert_into(file_records::table)
                    .values(&db_record)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    fn path_exists(&self, path: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = file_records::table
            .filter(file_records::file_path.eq(path))
            .count()
            .get_result(&mut conn)
            .into_core()?;
        Ok(count > 0)
    }

    async fn upsert_link(&self, request: FileLinkRequest) -> Result<FileLink> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();

                let existing: Option<FileLinkDB> = file_links::table
                    .filter(file_links::file_id.eq(request.file_id))
                    .filter(file_links::entity_type.eq(&request.entity_type))
                    .filter(file_links::entity_id.eq(request.entity_id))
                    .filter(file_links::deleted_at.is_null())
                    .select(FileLinkDB::as_select())
                    .first(conn)
                    .optional()
                    .into_core()?;

                let link_id = match existing {
                    Some(link) => {
                        diesel::update(file_links::table.filter(file_links::id.eq(link.id)))
                            .set((
                                file_links::is_primary.eq(request.is_primary),
                                file_links::revision.eq(request.revision.clone()),
                                file_links::link_type.eq(request.link_type.clone()),
                                file_links::updated_at.eq(now),
                                file_links::updated_by.eq(request.created_by.clone()),
                                file_links::version.eq(link.version + 1),
                            ))
                            .execute(conn)
                            .into_core()?;
                        link.id
                    }
                    None => {
                        let db_link = NewFileLinkDB {
                            file_id: request.file_id,
                            entity_type: request.entity_type.clone(),
                            entity_id: request.entity_id,
                            is_primary: request.is_primary,
                            revision: request.revision.clone(),
                            link_type: request.link_type.clone(),
                            created_at: now,
                            updated_at: now,
                            created_by: request.created_by.clone(),
                            updated_by: request.created_by.clone(),
                        };
                        let inserted: FileLinkDB = diesel::insert_into(file_links::table)
                            .values(&db_link)
                            .get_result(conn)
                            .into_core()?;
                        inserted.id
                    }
                };

                if request.is_primary {
                    clear_other_primaries(
                        conn,
                        &request.entity_type,
                        request.entity_id,
                        &request.link_type,
                        link_id,
                    )?;
                }

                let refreshed: FileLinkDB = file_links::table
                    .filter(file_links::id.eq(link_id))
                    .select(FileLinkDB::as_select())
                    .first(conn)
                    .into_core()?;
                Ok(refreshed.into())
            })
            .await
    }

    fn find_link(
        &self,
        file: i64,
        entity_type_value: &str,
        entity_id_value: i64,
    ) -> Result<Option<FileLink>> {
        let mut conn = get_connection(&self.pool)?;
        let link: Option<FileLinkDB> = file_links::table
            .filter(file_links::file_id.eq(file))
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::entity_id.eq(entity_id_value))
            .filter(file_links::deleted_at.is_null())
            .select(FileLinkDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(link.map(Into::into))
    }

    async fn promote_link(&self, link_id: i64, updated_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let link: FileLinkDB = file_links::table
                    .filter(file_links::id.eq(link_id))
                    .filter(file_links::deleted_at.is_null())
                    .select(FileLinkDB::as_select())
                    .first(conn)
                    .into_core()?;

                clear_other_primaries(
                    conn,
                    &link.entity_type,
                    link.entity_id,
                    &link.link_type,
                    link.id,
                )?;

                diesel::update(file_links::table.filter(file_links::id.eq(link_id)))
                    .set((
                        file_links::is_primary.eq(true),
                        file_links::updated_at.eq(Utc::now().naive_utc()),
                        file_links::updated_by.eq(updated_by),
                        file_links::version.eq(link.version + 1),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn soft_delete_link(&self, link_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                diesel::update(
                    file_links::table
                        .filter(file_links::id.eq(link_id))
                        .filter(file_links::deleted_at.is_null()),
                )
                .set((
                    file_links::deleted_at.eq(now),
                    file_links::deleted_by.eq(deleted_by),
                    file_links::updated_at.eq(now),
                    file_links::version.eq(file_links::version + 1),
                ))
                .execute(conn)
                .into_core()?;
                Ok(())
            })
            .await
    }

    async fn soft_delete_record(&self, file_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                diesel::update(
                    file_records::table
                        .filter(file_records::id.eq(file_id))
                        .filter(file_records::deleted_at.is_null()),
                )
                .set((
                    file_records::deleted_at.eq(now),
                    file_records::deleted_by.eq(deleted_by),
                    file_records::updated_at.eq(now),
                    file_records::version.eq(file_records::version + 1),
                ))
                .execute(conn)
                .into_core()?;
                Ok(())
            })
            .await
    }

    fn files_for_entity(
        &self,
        entity_type_value: &str,
        entity_id_value: i64,
        link_type_filter: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = file_records::table
            .inner_join(file_links::table.on(file_links::file_id.eq(file_records::id)))
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::entity_id.eq(entity_id_value))
            .filter(file_links::deleted_at.is_null())
            .filter(file_records::deleted_at.is_null())
            .into_boxed();

        if let Some(link_type_value) = link_type_filter {
            query = query.filter(file_links::link_type.eq(link_type_value.to_string()));
        }

        let rows: Vec<FileRecordDB> = query
            .select(FileRecordDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn primary_for_entity(
        &self,
        entity_type_value: &str,
        entity_id_value: i64,
        link_type_value: &str,
    ) -> Result<Option<FileRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let record: Option<FileRecordDB> = file_records::table
            .inner_join(file_links::table.on(file_links::file_id.eq(file_records::id)))
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::entity_id.eq(entity_id_value))
            .filter(file_links::link_type.eq(link_type_value))
            .filter(file_links::is_primary.eq(true))
            .filter(file_links::deleted_at.is_null())
            .filter(file_records::deleted_at.is_null())
            .select(FileRecordDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(record.map(Into::into))
    }

    fn entities_with_links(
        &self,
        entity_type_value: &str,
        link_type_value: &str,
        entity_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let mut conn = get_connection(&self.pool)?;
        file_links::table
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::link_type.eq(link_type_value))
            .filter(file_links::entity_id.eq_any(entity_ids))
            .filter(file_links::deleted_at.is_null())
            .select(file_links::entity_id)
            .distinct()
            .load::<i64>(&mut conn)
            .into_core()
    }

    fn duplicate_hash_entities(
        &self,
        hash: &str,
        exclude_file_id: i64,
        entity_type_value: &str,
        exclude_entity_id: i64,
    ) -> Result<Vec<i64>> {
        let mut conn = get_connection(&self.pool)?;
        file_links::table
            .inner_join(file_records::table.on(file_records::id.eq(file_links::file_id)))
            .filter(file_records::file_hash.eq(hash))
            .filter(file_records::id.ne(exclude_file_id))
            .filter(file_records::deleted_at.is_null())
            .filter(file_links::entity_type.eq(entity_type_value))
            .filter(file_links::entity_id.ne(exclude_entity_id))
            .filter(file_links::deleted_at.is_null())
            .select(file_links::entity_id)
            .distinct()
            .load::<i64>(&mut conn)
            .into_core()
    }

    fn list_expired_temp(&self, cutoff: NaiveDateTime) -> Result<Vec<FileRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<FileRecordDB> = file_records::table
            .filter(file_records::status.eq(FileStatus::Temp.as_str()))
            .filter(file_records::created_at.lt(cutoff))
            .filter(file_records::deleted_at.is_null())
            .select(FileRecordDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn find_orphans(&self) -> Result<Vec<FileRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let linked_file_ids = file_links::table
            .filter(file_links::deleted_at.is_null())
            .select(file_links::file_id);

        let rows: Vec<FileRecordDB> = file_records::table
            .filter(file_records::id.ne_all(linked_file_ids))
            .filter(file_records::status.ne(FileStatus::Temp.as_str()))
            .filter(file_records::deleted_at.is_null())
            .select(FileRecordDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
