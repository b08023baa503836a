//! Material domain models.
//!
//! `MaterialItem` is master data mirrored from the ERP (keyed by the external
//! item code). `MaterialInput` is a per-part material assignment that copies
//! the item's shape and dimensions and may be linked to the operations that
//! consume it.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::parts::StockShape;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialItem {
    pub id: i64,
    /// Internal number, 20XXXXXX.
    pub material_number: String,
    /// External ERP item code; the importers' lookup key.
    pub code: String,
    pub name: Option<String>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub price_category_id: Option<i64>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterialItem {
    pub material_number: String,
    pub code: String,
    pub name: Option<String>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub price_category_id: Option<i64>,
    pub created_by: Option<String>,
}

/// Fields the material importer refreshes on an existing item.
#[derive(Debug, Clone)]
pub struct MaterialItemImportUpdate {
    pub id: i64,
    pub name: Option<String>,
    pub updated_by: Option<String>,
}

/// Material assigned to a part, with a stock-geometry snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInput {
    pub id: i64,
    pub part_id: i64,
    pub seq: i32,
    pub price_category_id: Option<i64>,
    pub material_item_id: Option<i64>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub quantity: f64,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

/// One row of the per-part material-input sync. The repository upserts by
/// `(part_id, material_item_id)` and maintains the operation link table.
#[derive(Debug, Clone)]
pub struct MaterialInputUpsert {
    pub material_item_id: i64,
    pub seq: i32,
    pub price_category_id: Option<i64>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub quantity: f64,
    pub notes: Option<String>,
    /// Operation that consumes this material, when the routing row named one.
    pub operation_id: Option<i64>,
}
