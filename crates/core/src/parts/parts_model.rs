//! Part domain models.
//!
//! A part is created manually, by ERP sync, or by quote orchestration. Its
//! `part_number` (10XXXXXX) is the internal identifier; `article_number` is
//! the external/customer key used for ERP matching.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::errors::{Error, Result, ValidationError};

/// Lifecycle status, translated from the external status label on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    #[default]
    Quote,
    Active,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Quote => "quote",
            PartStatus::Active => "active",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "active" => PartStatus::Active,
            _ => PartStatus::Quote,
        }
    }
}

/// Stock (raw material) geometry class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockShape {
    RoundBar,
    Tube,
    FlatBar,
    Sheet,
    Other,
}

impl StockShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockShape::RoundBar => "round_bar",
            StockShape::Tube => "tube",
            StockShape::FlatBar => "flat_bar",
            StockShape::Sheet => "sheet",
            StockShape::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "round_bar" => StockShape::RoundBar,
            "tube" => StockShape::Tube,
            "flat_bar" => StockShape::FlatBar,
            "sheet" => StockShape::Sheet,
            _ => StockShape::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: i64,
    pub part_number: String,
    pub article_number: Option<String>,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub revision: Option<String>,
    pub customer_revision: Option<String>,
    pub status: PartStatus,
    /// Where the row came from: "manual", "infor_import", "quote_request".
    pub source: Option<String>,

    // Stock geometry hints
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,

    /// Machined length in mm (part, not stock).
    pub length: f64,

    pub notes: Option<String>,
    /// Primary drawing, denormalized from the file store for fast access.
    pub file_id: Option<i64>,

    #[serde(flatten)]
    pub audit: Audit,
}

/// Input model for creating a new part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPart {
    pub part_number: String,
    pub article_number: Option<String>,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub revision: Option<String>,
    pub customer_revision: Option<String>,
    #[serde(default)]
    pub status: PartStatus,
    pub source: Option<String>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    #[serde(default)]
    pub length: f64,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

impl NewPart {
    pub fn validate(&self) -> Result<()> {
        if self.part_number.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "part_number".to_string(),
            )));
        }
        Ok(())
    }
}

/// Input model for updating an existing part (optimistic lock via `version`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUpdate {
    pub id: i64,
    pub article_number: Option<String>,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub revision: Option<String>,
    pub customer_revision: Option<String>,
    pub status: Option<PartStatus>,
    pub stock_shape: Option<StockShape>,
    pub stock_diameter: Option<f64>,
    pub stock_length: Option<f64>,
    pub stock_width: Option<f64>,
    pub stock_height: Option<f64>,
    pub stock_wall_thickness: Option<f64>,
    pub length: Option<f64>,
    pub notes: Option<String>,
    pub version: i32,
    pub updated_by: Option<String>,
}

/// Partial update applied by the ERP importer. Only non-empty external
/// values overwrite the existing row - user-entered data is preserved.
#[derive(Debug, Clone, Default)]
pub struct PartImportUpdate {
    pub id: i64,
    pub name: Option<String>,
    pub drawing_number: Option<String>,
    pub customer_revision: Option<String>,
    pub status: Option<PartStatus>,
    pub updated_by: Option<String>,
}
