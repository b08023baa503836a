//! Batch and BatchSet domain models.
//!
//! A batch carries the cost breakdown for one quantity of a part. Batches are
//! grouped into a BatchSet, the unit of the freeze operation: freezing writes
//! the prices into `unit_price_frozen`/`total_price_frozen` and a minimal
//! cost snapshot, decoupling the historical record from later price changes.
//! Freezing is irreversible.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::Audit;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: i64,
    /// 30XXXXXX
    pub batch_number: String,
    pub part_id: i64,
    pub batch_set_id: Option<i64>,
    pub quantity: i32,
    pub is_default: bool,

    pub unit_time_min: f64,

    // Cost components per piece
    pub material_cost: Decimal,
    pub machining_cost: Decimal,
    pub setup_cost: Decimal,
    pub overhead_cost: Decimal,
    pub margin_cost: Decimal,
    pub coop_cost: Decimal,

    pub unit_cost: Decimal,
    pub total_cost: Decimal,

    // Material snapshot at calculation time
    pub material_weight_kg: Option<f64>,
    pub material_price_per_kg: Option<Decimal>,

    // Freeze metadata
    pub is_frozen: bool,
    pub frozen_at: Option<NaiveDateTime>,
    pub frozen_by: Option<String>,
    pub snapshot_data: Option<serde_json::Value>,
    pub unit_price_frozen: Option<Decimal>,
    pub total_price_frozen: Option<Decimal>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub batch_number: String,
    pub part_id: i64,
    pub batch_set_id: Option<i64>,
    pub quantity: i32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub unit_time_min: f64,
    #[serde(default)]
    pub material_cost: Decimal,
    #[serde(default)]
    pub machining_cost: Decimal,
    #[serde(default)]
    pub setup_cost: Decimal,
    #[serde(default)]
    pub overhead_cost: Decimal,
    #[serde(default)]
    pub margin_cost: Decimal,
    #[serde(default)]
    pub coop_cost: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
    pub material_weight_kg: Option<f64>,
    pub material_price_per_kg: Option<Decimal>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSetStatus {
    #[default]
    Draft,
    Frozen,
}

impl BatchSetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchSetStatus::Draft => "draft",
            BatchSetStatus::Frozen => "frozen",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "frozen" => BatchSetStatus::Frozen,
            _ => BatchSetStatus::Draft,
        }
    }
}

/// Named pricing-snapshot group of batches. Deleting the set cascades to its
/// batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSet {
    pub id: i64,
    /// 35XXXXXX
    pub set_number: String,
    pub part_id: Option<i64>,
    pub name: String,
    pub status: BatchSetStatus,
    pub frozen_at: Option<NaiveDateTime>,
    pub frozen_by: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatchSet {
    pub set_number: String,
    pub part_id: Option<i64>,
    /// Auto-generated timestamp name when empty.
    pub name: Option<String>,
    pub created_by: Option<String>,
}

/// Auto-name for a new set: sortable and readable.
pub fn generate_batch_set_name() -> String {
    Utc::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Minimal cost snapshot written at freeze time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCostSnapshot {
    pub material_cost: Decimal,
    pub machining_cost: Decimal,
    pub setup_cost: Decimal,
    pub overhead_cost: Decimal,
    pub margin_cost: Decimal,
    pub coop_cost: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub batch_number: String,
    pub quantity: i32,
    pub costs: BatchCostSnapshot,
    pub frozen_at: NaiveDateTime,
    pub frozen_by: Option<String>,
}

/// Per-batch data the repository persists during a set freeze.
#[derive(Debug, Clone)]
pub struct BatchFreeze {
    pub batch_id: i64,
    pub snapshot_data: serde_json::Value,
    pub unit_price_frozen: Decimal,
    pub total_price_frozen: Decimal,
}

/// Outcome of best-batch matching for a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMatch {
    Exact,
    Lower,
    Missing,
}

impl BatchMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMatch::Exact => "exact",
            BatchMatch::Lower => "lower",
            BatchMatch::Missing => "missing",
        }
    }
}
