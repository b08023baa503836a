//! Partners module - customers and suppliers.

mod partners_model;
mod partners_traits;

pub use partners_model::{validate_dic, validate_ico, NewPartner, Partner};
pub use partners_traits::PartnerRepositoryTrait;
