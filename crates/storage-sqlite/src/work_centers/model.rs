//! Database models for work centers.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::work_centers::{NewWorkCenter, WorkCenter, WorkCenterType};

use crate::utils::{audit_from_columns, opt_dec_from_db, opt_dec_to_db};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::work_centers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkCenterDB {
    pub id: i64,
    pub work_center_number: String,
    pub name: String,
    pub work_center_type: String,
    pub hourly_rate_amortization: Option<String>,
    pub hourly_rate_labor: Option<String>,
    pub hourly_rate_tools: Option<String>,
    pub hourly_rate_overhead: Option<String>,
    pub has_bar_feeder: bool,
    pub has_sub_spindle: bool,
    pub has_milling: bool,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<WorkCenterDB> for WorkCenter {
    fn from(db: WorkCenterDB) -> Self {
        WorkCenter {
            id: db.id,
            work_center_number: db.work_center_number,
            name: db.name,
            work_center_type: WorkCenterType::parse(&db.work_center_type),
            hourly_rate_amortization: opt_dec_from_db(
                db.hourly_rate_amortization.as_ref(),
                "hourly_rate_amortization",
            ),
            hourly_rate_labor: opt_dec_from_db(db.hourly_rate_labor.as_ref(), "hourly_rate_labor"),
            hourly_rate_tools: opt_dec_from_db(db.hourly_rate_tools.as_ref(), "hourly_rate_tools"),
            hourly_rate_overhead: opt_dec_from_db(
                db.hourly_rate_overhead.as_ref(),
                "hourly_rate_overhead",
            ),
            has_bar_feeder: db.has_bar_feeder,
            has_sub_spindle: db.has_sub_spindle,
            has_milling: db.has_milling,
            is_active: db.is_active,
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
#[diesel(table_name = crate::schema::work_centers)]
pub struct NewWorkCenterDB {
    pub work_center_number: String,
    pub name: String,
    pub work_center_type: String,
    pub hourly_rate_amortization: Option<String>,
    pub hourly_rate_labor: Option<String>,
    pub hourly_rate_tools: Option<String>,
    pub hourly_rate_overhead: Option<String>,
    pub has_bar_feeder: bool,
    pub has_sub_spindle: bool,
    pub has_milling: bool,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewWorkCenter> for NewWorkCenterDB {
    fn from(new_wc: NewWorkCenter) -> Self {
        let now = Utc::now().naive_utc();
        NewWorkCenterDB {
            work_center_number: new_wc.work_center_number,
            name: new_wc.name,
            work_center_type: new_wc.work_center_type.as_str().to_string(),
            hourly_rate_amortization: opt_dec_to_db(new_wc.hourly_rate_amortization),
            hourly_rate_labor: opt_dec_to_db(new_wc.hourly_rate_labor),
            hourly_rate_tools: opt_dec_to_db(new_wc.hourly_rate_tools),
            hourly_rate_overhead: opt_dec_to_db(new_wc.hourly_rate_overhead),
            has_bar_feeder: new_wc.has_bar_feeder,
            has_sub_spindle: new_wc.has_sub_spindle,
            has_milling: new_wc.has_milling,
            is_active: true,
            notes: new_wc.notes,
            created_at: now,
            updated_at: now,
            created_by: new_wc.created_by.clone(),
            updated_by: new_wc.created_by,
        }
    }
}
