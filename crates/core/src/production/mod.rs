//! Production module - actual production telemetry mirrored from the ERP.

mod production_model;
mod production_traits;

pub use production_model::{NewProductionRecord, ProductionRecord, ProductionRecordUpdate};
pub use production_traits::ProductionRepositoryTrait;
