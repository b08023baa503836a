//! Sync state and audit-log domain models.
//!
//! One `SyncState` row per step carries the IDO query configuration, the
//! watermark (last successful sync time, the lower bound of the next fetch
//! filter) and the last-run counters. `SyncLog` is the append-only audit
//! trail of every execution.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-step sync configuration and watermark state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub id: i64,
    /// Unique step identifier: "parts", "materials", "documents", ...
    pub step_name: String,
    pub ido_name: String,
    /// Comma-separated field list projected from the IDO.
    pub properties: String,
    pub date_field: String,
    /// Base filter without the date clause.
    pub filter_template: Option<String>,
    pub interval_seconds: i64,
    pub enabled: bool,
    /// Watermark: advanced to the tick's start time after a successful run.
    pub last_sync_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SyncState {
    pub fn property_list(&self) -> Vec<String> {
        self.properties
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Seed configuration for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncState {
    pub step_name: String,
    pub ido_name: String,
    pub properties: String,
    pub date_field: String,
    pub filter_template: Option<String>,
    pub interval_seconds: i64,
    pub enabled: bool,
}

/// Counters recorded after a step run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepCounters {
    pub fetched: i64,
    pub created: i64,
    pub updated: i64,
    pub errors: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Success,
    Error,
    Skipped,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Success => "success",
            SyncRunStatus::Error => "error",
            SyncRunStatus::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "success" => SyncRunStatus::Success,
            "skipped" => SyncRunStatus::Skipped,
            _ => SyncRunStatus::Error,
        }
    }
}

/// Append-only audit row for one step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: i64,
    pub step_name: String,
    pub status: SyncRunStatus,
    pub fetched_count: i64,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncLog {
    pub step_name: String,
    pub status: SyncRunStatus,
    pub fetched_count: i64,
    pub created_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
}

/// Default step configurations, seeded on first start.
pub fn default_steps() -> Vec<NewSyncState> {
    let step = |step_name: &str,
                ido_name: &str,
                filter_template: &str,
                properties: &str,
                interval_seconds: i64| NewSyncState {
        step_name: step_name.to_string(),
        ido_name: ido_name.to_string(),
        properties: properties.to_string(),
        date_field: "RecordDate".to_string(),
        filter_template: Some(filter_template.to_string()),
        interval_seconds,
        enabled: false,
    };

    vec![
        step(
            "parts",
            "SLItems",
            "FamilyCode LIKE 'Výrobek' AND (RybTridaNazev1 LIKE 'Nabídka' OR RybTridaNazev1 LIKE 'Aktivní')",
            "Item,FamilyCode,Description,DrawingNbr,Revision,RybTridaNazev1",
            30,
        ),
        step(
            "materials",
            "SLItems",
            "FamilyCode like 'materiál'",
            "Item,Description",
            30,
        ),
        step(
            "documents",
            "SLDocumentObjects_Exts",
            "DocumentType IN ('Výkres-platný','PDF','Výkres')",
            "DocumentName,DocumentExtension,DocumentType,RowPointer,Sequence,Description,StorageMethod",
            300,
        ),
        step(
            "operations",
            "SLJobRoutes",
            "Type = 'S'",
            "OperNum,DerJobItem,Wc,JshSchedHrs,JshSetupHrs,DerRunLbrHrs,DerRunMchHrs,ObsDate",
            30,
        ),
        step(
            "material_inputs",
            "SLJobmatls",
            "Type = 'S'",
            "ItmItem,Item,OperNum,MatlQtyConv,UM",
            60,
        ),
        step(
            "production",
            "SLJobRoutes",
            "Type = 'J'",
            "Job,JobItem,OperNum,Wc,JobQtyReleased,JshSetupHrs,DerRunMchHrs,DerRunLbrHrs,SetupHrsT,RunHrsTMch,RunHrsTLbr,ObsDate",
            30,
        ),
    ]
}
