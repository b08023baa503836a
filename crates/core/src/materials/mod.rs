//! Materials module - material master data and per-part material inputs.

mod materials_model;
mod materials_traits;

pub use materials_model::{
    MaterialInput, MaterialInputUpsert, MaterialItem, MaterialItemImportUpdate, NewMaterialItem,
};
pub use materials_traits::MaterialRepositoryTrait;
