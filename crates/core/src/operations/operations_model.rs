//! Operation domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::Audit;

/// One routing step of a part. `seq` is unique per part.
///
/// Cooperation operations (`is_coop`) are performed by an external
/// subcontractor: times are zeroed and the coop price fields apply instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: i64,
    pub part_id: i64,
    pub seq: i32,
    pub name: String,
    pub work_center_id: Option<i64>,

    // Times in minutes
    pub setup_time_min: f64,
    pub operation_time_min: f64,

    /// Percent of machine running time an operator is present.
    /// Below 100 means one operator attends multiple machines.
    pub manning_coefficient: f64,
    pub machine_utilization_coefficient: f64,

    pub is_coop: bool,
    pub coop_price: Decimal,
    pub coop_min_price: Decimal,
    pub coop_days: i32,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOperation {
    pub part_id: i64,
    pub seq: i32,
    #[serde(default)]
    pub name: String,
    pub work_center_id: Option<i64>,
    #[serde(default)]
    pub setup_time_min: f64,
    #[serde(default)]
    pub operation_time_min: f64,
    pub manning_coefficient: f64,
    pub machine_utilization_coefficient: f64,
    #[serde(default)]
    pub is_coop: bool,
    #[serde(default)]
    pub coop_price: Decimal,
    #[serde(default)]
    pub coop_min_price: Decimal,
    #[serde(default)]
    pub coop_days: i32,
    pub created_by: Option<String>,
}

/// Fields the routing importer refreshes on an existing operation.
#[derive(Debug, Clone)]
pub struct OperationImportUpdate {
    pub id: i64,
    pub work_center_id: Option<i64>,
    pub setup_time_min: f64,
    pub operation_time_min: f64,
    pub manning_coefficient: f64,
    pub updated_by: Option<String>,
}
