//! Operations module - per-part routing steps.

mod operations_model;
mod operations_traits;

pub use operations_model::{NewOperation, Operation, OperationImportUpdate};
pub use operations_traits::OperationRepositoryTrait;
