//! Database models for sync state and logs.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::sync::{NewSyncLog, NewSyncState, SyncLog, SyncRunStatus, SyncState};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncStateDB {
    pub id: i64,
    pub step_name: String,
    pub ido_name: String,
    pub properties: String,
    pub date_field: String,
    pub filter_template: Option<String>,
    pub interval_seconds: i64,
    pub enabled: bool,
    pub last_sync_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<SyncStateDB> for SyncState {
    fn from(db: SyncStateDB) -> Self {
        SyncState {
            id: db.id,
            step_name: db.step_name,
            ido_name: db.ido_name,
            properties: db.properties,
            date_field: db.date_field,
            filter_template: db.filter_template,
            interval_seconds: db.interval_seconds,
            enabled: db.enabled,
            last_sync_at: db.last_sync_at,
            last_error: db.last_error,
            created_count: db.created_count,
            updated_count: db.updated_count,
            error_count: db.error_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_states)]
pub struct NewSyncStateDB {
    pub step_name: String,
    pub ido_name: String,
    pub properties: String,
    pub date_field: String,
    pub filter_template: Option<String>,
    pub interval_seconds: i64,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<NewSyncState> for NewSyncStateDB {
    fn from(step: NewSyncState) -> Self {
        let now = Utc::now().naive_utc();
        NewSyncStateDB {
            step_name: step.step_name,
            ido_name: step.ido_name,
            properties: step.properties,
            date_field: step.date_field,
            filter_template: step.filter_template,
            interval_seconds: step.interval_seconds,
            enabled: step.enabled,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncLogDB {
    pub id: i64,
    pub step_name: String,
    pub status: String,
    pub fetched_count: i64,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SyncLogDB> for SyncLog {
    fn from(db: SyncLogDB) -> Self {
        SyncLog {
            id: db.id,
            step_name: db.step_name,
            status: SyncRunStatus::parse(&db.status),
            fetched_count: db.fetched_count,
            created_count: db.created_count,
            updated_count: db.updated_count,
            error_count: db.error_count,
            duration_ms: db.duration_ms,
            error_message: db.error_message,
            created_at: db.created_at,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_logs)]
pub struct NewSyncLogDB {
    pub step_name: String,
    pub status: String,
    pub fetched_count: i64,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<NewSyncLog> for NewSyncLogDB {
    fn from(log: NewSyncLog) -> Self {
        NewSyncLogDB {
            step_name: log.step_name,
            status: log.status.as_str().to_string(),
            fetched_count: log.fetched_count,
            created_count: log.created_count,
            updated_count: log.updated_count,
            error_count: log.error_count,
            duration_ms: log.duration_ms,
            error_message: log.error_message,
            created_at: Utc::now().naive_utc(),
        }
    }
}
