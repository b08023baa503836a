//! Production record domain models.
//!
//! Append-only telemetry: planned per-piece times from norms next to actuals
//! computed from batch totals divided by released quantity. Rows are merged
//! by `(part, order, operation seq)`.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub id: i64,
    pub part_id: i64,
    pub infor_order_number: String,
    pub operation_seq: Option<i32>,
    pub work_center_id: Option<i64>,
    pub batch_quantity: Option<i32>,

    // Planned per piece (from norms)
    pub planned_time_min: f64,
    pub planned_labor_time_min: f64,
    pub planned_setup_min: f64,

    // Actuals: batch totals and derived per-piece values
    pub actual_setup_min: Option<f64>,
    pub actual_run_machine_min: Option<f64>,
    pub actual_run_labor_min: Option<f64>,
    pub actual_time_min: Option<f64>,
    pub actual_labor_time_min: Option<f64>,

    /// Planned percent of machine time the operator attends this machine.
    pub manning_coefficient: f64,
    /// Same ratio computed from actual batch totals.
    pub actual_manning_coefficient: Option<f64>,

    pub source: String,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductionRecord {
    pub part_id: i64,
    pub infor_order_number: String,
    pub operation_seq: Option<i32>,
    pub work_center_id: Option<i64>,
    pub batch_quantity: Option<i32>,
    #[serde(default)]
    pub planned_time_min: f64,
    #[serde(default)]
    pub planned_labor_time_min: f64,
    #[serde(default)]
    pub planned_setup_min: f64,
    pub actual_setup_min: Option<f64>,
    pub actual_run_machine_min: Option<f64>,
    pub actual_run_labor_min: Option<f64>,
    pub actual_time_min: Option<f64>,
    pub actual_labor_time_min: Option<f64>,
    pub manning_coefficient: f64,
    pub actual_manning_coefficient: Option<f64>,
    pub source: String,
    pub created_by: Option<String>,
}

/// Refresh applied when a duplicate `(part, order, seq)` row arrives.
#[derive(Debug, Clone)]
pub struct ProductionRecordUpdate {
    pub id: i64,
    pub work_center_id: Option<i64>,
    pub batch_quantity: Option<i32>,
    pub planned_time_min: f64,
    pub planned_labor_time_min: f64,
    pub planned_setup_min: f64,
    pub actual_setup_min: Option<f64>,
    pub actual_run_machine_min: Option<f64>,
    pub actual_run_labor_min: Option<f64>,
    pub actual_time_min: Option<f64>,
    pub actual_labor_time_min: Option<f64>,
    pub manning_coefficient: f64,
    pub actual_manning_coefficient: Option<f64>,
    pub updated_by: Option<String>,
}
