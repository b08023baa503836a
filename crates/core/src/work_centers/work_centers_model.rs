//! Work center domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::Audit;

/// Broad machine classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCenterType {
    Turning,
    Milling,
    Sawing,
    Grinding,
    Cooperation,
    Other,
}

impl WorkCenterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCenterType::Turning => "turning",
            WorkCenterType::Milling => "milling",
            WorkCenterType::Sawing => "sawing",
            WorkCenterType::Grinding => "grinding",
            WorkCenterType::Cooperation => "cooperation",
            WorkCenterType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "turning" => WorkCenterType::Turning,
            "milling" => WorkCenterType::Milling,
            "sawing" => WorkCenterType::Sawing,
            "grinding" => WorkCenterType::Grinding,
            "cooperation" => WorkCenterType::Cooperation,
            _ => WorkCenterType::Other,
        }
    }
}

/// Machine or workstation that performs operations.
///
/// Numbers are sequential in the 80XXXXXX range. The four hourly-rate
/// components sum into the effective rates used by the cost calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenter {
    pub id: i64,
    pub work_center_number: String,
    pub name: String,
    pub work_center_type: WorkCenterType,

    // Hourly rate components (currency/h)
    pub hourly_rate_amortization: Option<Decimal>,
    pub hourly_rate_labor: Option<Decimal>,
    pub hourly_rate_tools: Option<Decimal>,
    pub hourly_rate_overhead: Option<Decimal>,

    // Capabilities
    pub has_bar_feeder: bool,
    pub has_sub_spindle: bool,
    pub has_milling: bool,

    pub is_active: bool,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

impl WorkCenter {
    /// Setup rate: all components except tooling.
    pub fn hourly_rate_setup(&self) -> Option<Decimal> {
        match (
            self.hourly_rate_amortization,
            self.hourly_rate_labor,
            self.hourly_rate_overhead,
        ) {
            (Some(a), Some(l), Some(o)) => Some(a + l + o),
            _ => None,
        }
    }

    /// Operation rate: all four components.
    pub fn hourly_rate_operation(&self) -> Option<Decimal> {
        match (self.hourly_rate_setup(), self.hourly_rate_tools) {
            (Some(setup), Some(tools)) => Some(setup + tools),
            _ => None,
        }
    }
}

/// Input model for creating a work center.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkCenter {
    pub work_center_number: String,
    pub name: String,
    pub work_center_type: WorkCenterType,
    pub hourly_rate_amortization: Option<Decimal>,
    pub hourly_rate_labor: Option<Decimal>,
    pub hourly_rate_tools: Option<Decimal>,
    pub hourly_rate_overhead: Option<Decimal>,
    #[serde(default)]
    pub has_bar_feeder: bool,
    #[serde(default)]
    pub has_sub_spindle: bool,
    #[serde(default)]
    pub has_milling: bool,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}
