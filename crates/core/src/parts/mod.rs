//! Parts module - manufactured part master data.

mod parts_model;
mod parts_traits;

pub use parts_model::{NewPart, Part, PartImportUpdate, PartStatus, PartUpdate, StockShape};
pub use parts_traits::PartRepositoryTrait;
