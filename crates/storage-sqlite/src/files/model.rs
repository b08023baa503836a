//! Database models for file records and links.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::files::{FileLink, FileRecord, FileStatus, NewFileRecord};

use crate::utils::audit_from_columns;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::file_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileRecordDB {
    pub id: i64,
    pub file_hash: String,
    pub file_path: String,
    pub original_filename: String,
    pub file_size: i64,
    pub file_type: String,
    pub mime_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<FileRecordDB> for FileRecord {
    fn from(db: FileRecordDB) -> Self {
        FileRecord {
            id: db.id,
            file_hash: db.file_hash,
            file_path: db.file_path,
            original_filename: db.original_filename,
            file_size: db.file_size,
            file_type: db.file_type,
            mime_type: db.mime_type,
            status: FileStatus::parse(&db.status),
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
#[diesel(table_name = crate::schema::file_records)]
pub struct NewFileRecordDB {
    pub file_hash: String,
    pub file_path: String,
    pub original_filename: String,
    pub file_size: i64,
    pub file_type: String,
    pub mime_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewFileRecord> for NewFileRecordDB {
    fn from(record: NewFileRecord) -> Self {
        let now = Utc::now().naive_utc();
        NewFileRecordDB {
            file_hash: record.file_hash,
            file_path: record.file_path,
            original_filename: record.original_filename,
            file_size: record.file_size,
            file_type: record.file_type,
            mime_type: record.mime_type,
            status: record.status.as_str().to_string(),
            created_at: now,
            updated_at: now,
            created_by: record.created_by.clone(),
            updated_by: record.created_by,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::file_links)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileLinkDB {
    pub id: i64,
    pub file_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub is_primary: bool,
    pub revision: Option<String>,
    pub link_type: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<FileLinkDB> for FileLink {
    fn from(db: FileLinkDB) -> Self {
        FileLink {
            id: db.id,
            file_id: db.file_id,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            is_primary: db.is_primary,
            revision: db.revision,
            link_type: db.link_type,
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
#[diesel(table_name = crate::schema::file_links)]
pub struct NewFileLinkDB {
    pub file_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub is_primary: bool,
    pub revision: Option<String>,
    pub link_type: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
